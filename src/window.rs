//! Minimum range window of a Flux script
//!
//! Every `range` call of a script is resolved to an absolute `[start, stop]`
//! pair against a single reference instant. The minimum window is then taken
//! over the cross product of *all* starts and *all* stops: separate ranges may
//! later be combined (e.g. through `join`), so a start of one call can pair
//! with the stop of another.
//!
//! # Example
//!
//! ```
//! use fluxwindow::ast::Node;
//! use fluxwindow::window::min_duration_from_ast_at;
//!
//! let ast = Node::from_json(r#"{
//!     "type": "CallExpression",
//!     "callee": {"type": "Identifier", "name": "range"},
//!     "arguments": [{"type": "ObjectExpression", "properties": [{
//!         "type": "Property",
//!         "key": {"type": "Identifier", "name": "start"},
//!         "value": {"type": "UnaryExpression", "operator": "-",
//!             "argument": {"type": "DurationLiteral", "values": [{"magnitude": 5, "unit": "m"}]}}
//!     }]}]
//! }"#).unwrap();
//!
//! assert_eq!(min_duration_from_ast_at(&ast, 1_000_000_000.0).unwrap(), Some(300_000.0));
//! ```

use crate::ast::{CallExpression, MemberExpression, Node, ObjectExpression, Property};
use crate::duration::datetime_millis;
use crate::error::AnalysisError;
use serde::Serialize;
use tracing::debug;

/// Resolved bounds of one `range` call, in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeWindow {
    pub start: f64,
    pub stop: f64,
}

impl RangeWindow {
    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }
}

/// Every range window of a script together with the resulting minimum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowReport {
    /// Reference instant used for relative bounds
    pub now: f64,
    pub ranges: Vec<RangeWindow>,
    /// `None` when no start/stop pairing yields a positive window
    pub min_window_ms: Option<f64>,
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

/// Minimum window of `ast` relative to the current time.
///
/// `Ok(None)` means the window is undeterminable: the script has no range
/// calls, or none of the start/stop pairings is strictly positive.
pub fn min_duration_from_ast(ast: &Node) -> Result<Option<f64>, AnalysisError> {
    min_duration_from_ast_at(ast, now_millis())
}

/// Minimum window of `ast` relative to `now` (epoch milliseconds)
pub fn min_duration_from_ast_at(ast: &Node, now: f64) -> Result<Option<f64>, AnalysisError> {
    Ok(min_window(&all_range_times(ast, now)?))
}

/// Resolve all range calls and the minimum window in one pass
pub fn analyze(ast: &Node, now: f64) -> Result<WindowReport, AnalysisError> {
    let ranges = all_range_times(ast, now)?;
    let min_window_ms = min_window(&ranges);
    Ok(WindowReport {
        now,
        ranges,
        min_window_ms,
    })
}

/// Smallest strictly positive `stop - start` over every start/stop pairing
pub fn min_window(ranges: &[RangeWindow]) -> Option<f64> {
    ranges
        .iter()
        .flat_map(|a| ranges.iter().map(move |b| b.stop - a.start))
        .filter(|d| *d > 0.0)
        .min_by(f64::total_cmp)
}

/// Resolve the bounds of every `range` call in `ast`
pub fn all_range_times(ast: &Node, now: f64) -> Result<Vec<RangeWindow>, AnalysisError> {
    let resolver = BoundResolver { ast, now };
    ast.walk()
        .filter_map(Node::as_range_call)
        .map(|call| resolver.range_times(call))
        .collect()
}

/// Evaluates range bounds against one tree and one reference instant
struct BoundResolver<'a> {
    ast: &'a Node,
    now: f64,
}

impl<'a> BoundResolver<'a> {
    fn range_times(&self, call: &'a CallExpression) -> Result<RangeWindow, AnalysisError> {
        let args = range_arguments(call)?;

        let start_value = args
            .property("start")
            .map(Property::value)
            .ok_or(AnalysisError::MissingStart)?;
        let start = self.instant(start_value, &mut Vec::new())?;

        // `stop` is optional and defaults to now
        let stop = match args.property("stop") {
            Some(property) => self.instant(property.value(), &mut Vec::new())?,
            None => self.now,
        };

        if !start.is_finite() || !stop.is_finite() {
            return Err(AnalysisError::NonFinite);
        }

        debug!(start, stop, "resolved range call");
        Ok(RangeWindow { start, stop })
    }

    /// Resolve a bound expression to an absolute instant
    fn instant(&self, expr: &'a Node, visiting: &mut Vec<String>) -> Result<f64, AnalysisError> {
        if let Some((key, target)) = self.binding(expr)? {
            return follow(key, visiting, |visiting| self.instant(target, visiting));
        }

        match expr {
            Node::UnaryExpression(unary) => {
                let offset = self.duration(&unary.argument, visiting)?;
                match unary.operator.as_str() {
                    "-" => Ok(self.now - offset),
                    "+" => Ok(self.now + offset),
                    op => Err(AnalysisError::UnsupportedOperator(op.to_string())),
                }
            }
            Node::DurationLiteral(literal) => Ok(self.now + literal.millis()),
            Node::DateTimeLiteral(literal) => datetime_millis(&literal.value)
                .ok_or_else(|| AnalysisError::InvalidDateTime(literal.value.clone())),
            Node::BinaryExpression(binary) => {
                let left = self.instant(&binary.left, visiting)?;
                let right = self.duration(&binary.right, visiting)?;
                match binary.operator.as_str() {
                    "+" => Ok(left + right),
                    "-" => Ok(left - right),
                    op => Err(AnalysisError::UnsupportedOperator(op.to_string())),
                }
            }
            Node::CallExpression(call)
                if call.callee_name() == Some("now") && call.arguments.is_empty() =>
            {
                Ok(self.now)
            }
            other => Err(AnalysisError::UnsupportedExpression(other.kind())),
        }
    }

    /// Resolve an expression that must denote a duration
    fn duration(&self, expr: &'a Node, visiting: &mut Vec<String>) -> Result<f64, AnalysisError> {
        if let Some((key, target)) = self.binding(expr)? {
            return follow(key, visiting, |visiting| self.duration(target, visiting));
        }

        match expr {
            Node::DurationLiteral(literal) => Ok(literal.millis()),
            other => Err(AnalysisError::UnsupportedExpression(other.kind())),
        }
    }

    /// For identifiers and member paths, the node they are bound to
    fn binding(&self, expr: &'a Node) -> Result<Option<(String, &'a Node)>, AnalysisError> {
        match expr {
            Node::Identifier(id) => Ok(Some((id.name.clone(), self.lookup(&id.name)?))),
            Node::MemberExpression(member) => self.lookup_member(member).map(Some),
            _ => Ok(None),
        }
    }

    /// Initializer of the single assignment to `name` anywhere in the tree
    fn lookup(&self, name: &str) -> Result<&'a Node, AnalysisError> {
        let mut assignments = self.ast.walk().filter_map(|node| node.as_assignment_of(name));

        let first = assignments
            .next()
            .ok_or_else(|| AnalysisError::UnresolvedIdentifier(name.to_string()))?;
        if assignments.next().is_some() {
            return Err(AnalysisError::DuplicateDeclaration(name.to_string()));
        }

        Ok(&*first.init)
    }

    fn lookup_member(
        &self,
        member: &'a MemberExpression,
    ) -> Result<(String, &'a Node), AnalysisError> {
        let object = member
            .object
            .as_identifier()
            .ok_or(AnalysisError::UnsupportedExpression(member.object.kind()))?;
        let property = member
            .property_name()
            .ok_or(AnalysisError::UnsupportedExpression(member.property.kind()))?;

        let Node::ObjectExpression(init) = self.lookup(object)? else {
            return Err(AnalysisError::NotAnObject(object.to_string()));
        };

        let value = init
            .property(property)
            .map(Property::value)
            .ok_or_else(|| AnalysisError::UnresolvedMember {
                object: object.to_string(),
                property: property.to_string(),
            })?;

        Ok((format!("{}.{}", object, property), value))
    }
}

/// Descend into a binding, refusing to enter one that is already being resolved
fn follow<T>(
    key: String,
    visiting: &mut Vec<String>,
    resolve: impl FnOnce(&mut Vec<String>) -> Result<T, AnalysisError>,
) -> Result<T, AnalysisError> {
    if visiting.contains(&key) {
        return Err(AnalysisError::CyclicDefinition(key));
    }

    visiting.push(key);
    let result = resolve(visiting);
    visiting.pop();
    result
}

fn range_arguments(call: &CallExpression) -> Result<&ObjectExpression, AnalysisError> {
    match call.arguments.as_slice() {
        [Node::ObjectExpression(args)] => Ok(args),
        _ => Err(AnalysisError::MalformedRange),
    }
}
