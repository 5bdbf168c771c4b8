//! Typed Flux abstract syntax tree
//!
//! The tree is produced by an external parsing service and decoded here from
//! its JSON form. Every node carries a `type` tag; only the node kinds that can
//! contain, or feed values into, a `range` call are modeled. Any other tag
//! decodes to [`Node::Other`], an opaque leaf.
//!
//! # Example
//!
//! ```
//! use fluxwindow::ast::Node;
//!
//! let ast = Node::from_json(r#"{
//!     "type": "CallExpression",
//!     "callee": {"type": "Identifier", "name": "range"},
//!     "arguments": [{
//!         "type": "ObjectExpression",
//!         "properties": [{
//!             "type": "Property",
//!             "key": {"type": "Identifier", "name": "start"},
//!             "value": {
//!                 "type": "UnaryExpression",
//!                 "operator": "-",
//!                 "argument": {
//!                     "type": "DurationLiteral",
//!                     "values": [{"magnitude": 5, "unit": "m"}]
//!                 }
//!             }
//!         }]
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(ast.walk().filter_map(Node::as_range_call).count(), 1);
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// A node of the Flux AST, discriminated by its `type` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Package(Package),
    File(File),
    ExpressionStatement(ExpressionStatement),
    ReturnStatement(ReturnStatement),
    OptionStatement(OptionStatement),
    TestStatement(OptionStatement),
    TestCaseStatement(TestCaseStatement),
    VariableAssignment(VariableAssignment),
    MemberAssignment(MemberAssignment),
    Block(Block),
    CallExpression(CallExpression),
    PipeExpression(PipeExpression),
    ParenExpression(ParenExpression),
    FunctionExpression(FunctionExpression),
    ObjectExpression(ObjectExpression),
    Property(Property),
    ArrayExpression(ArrayExpression),
    DictExpression(DictExpression),
    DictItem(DictItem),
    ConditionalExpression(ConditionalExpression),
    LogicalExpression(OperatorExpression),
    BinaryExpression(OperatorExpression),
    UnaryExpression(UnaryExpression),
    MemberExpression(MemberExpression),
    IndexExpression(IndexExpression),
    Identifier(Identifier),
    DurationLiteral(DurationLiteral),
    DateTimeLiteral(DateTimeLiteral),
    StringLiteral(StringLiteral),
    StringExpression(StringExpression),
    InterpolatedPart(InterpolatedPart),
    /// Node kinds that never contain expressions: other literals, imports,
    /// text parts, builtin and type declarations
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub files: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expression: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatement {
    pub argument: Box<Node>,
}

/// `option name = init`; the wrapped node is normally a [`VariableAssignment`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionStatement {
    pub assignment: Box<Node>,
}

/// `testcase name { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseStatement {
    pub block: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableAssignment {
    pub id: Identifier,
    pub init: Box<Node>,
}

/// `obj.name = init`; rebinds a member, declares nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAssignment {
    pub member: Box<Node>,
    pub init: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
    pub callee: Box<Node>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub arguments: Vec<Node>,
}

impl CallExpression {
    /// Name of the called function when the callee is a plain identifier
    pub fn callee_name(&self) -> Option<&str> {
        self.callee.as_identifier()
    }
}

/// `argument |> call`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeExpression {
    pub argument: Box<Node>,
    pub call: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParenExpression {
    pub expression: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExpression {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub params: Vec<Node>,
    pub body: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectExpression {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub properties: Vec<Node>,
}

impl ObjectExpression {
    /// Iterate over the `Property` children
    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter_map(|node| match node {
            Node::Property(property) => Some(property),
            _ => None,
        })
    }

    /// First property whose key is `name`
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties().find(|p| p.key_name() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: Box<Node>,
    #[serde(default)]
    pub value: Option<Box<Node>>,
}

impl Property {
    /// Key as written, for identifier keys (`start:`) and string keys (`"start":`)
    pub fn key_name(&self) -> Option<&str> {
        self.key.as_name()
    }

    /// The property's value. Shorthand properties (`{start}`) have no value
    /// node and stand for the identifier named by their key.
    pub fn value(&self) -> &Node {
        self.value.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayExpression {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub elements: Vec<Node>,
}

/// `["key": val, ...]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictExpression {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub elements: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictItem {
    pub key: Box<Node>,
    pub val: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalExpression {
    pub test: Box<Node>,
    pub consequent: Box<Node>,
    pub alternate: Box<Node>,
}

/// Shared shape of binary and logical expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorExpression {
    pub operator: String,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub operator: String,
    pub argument: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberExpression {
    pub object: Box<Node>,
    pub property: Box<Node>,
}

impl MemberExpression {
    /// Property name for both `obj.name` and `obj["name"]`
    pub fn property_name(&self) -> Option<&str> {
        self.property.as_name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpression {
    pub array: Box<Node>,
    pub index: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationLiteral {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub values: Vec<DurationValue>,
}

/// One `magnitude unit` component of a duration literal, e.g. the `5m` of `1h5m`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationValue {
    pub magnitude: i64,
    pub unit: DurationUnit,
}

/// Units accepted in Flux duration literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationUnit {
    #[serde(rename = "y")]
    Year,
    #[serde(rename = "mo")]
    Month,
    #[serde(rename = "w")]
    Week,
    #[serde(rename = "d")]
    Day,
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "m")]
    Minute,
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "ms")]
    Millisecond,
    #[serde(rename = "us", alias = "µs", alias = "μs")]
    Microsecond,
    #[serde(rename = "ns")]
    Nanosecond,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeLiteral {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
}

/// `"text ${expr} text"`; text parts decode to [`Node::Other`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringExpression {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub parts: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedPart {
    pub expression: Box<Node>,
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Node {
    /// Decode a tree from the parsing service's JSON representation
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Decode a tree from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// The node's `type` tag, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Package(_) => "Package",
            Node::File(_) => "File",
            Node::ExpressionStatement(_) => "ExpressionStatement",
            Node::ReturnStatement(_) => "ReturnStatement",
            Node::OptionStatement(_) => "OptionStatement",
            Node::TestStatement(_) => "TestStatement",
            Node::TestCaseStatement(_) => "TestCaseStatement",
            Node::VariableAssignment(_) => "VariableAssignment",
            Node::MemberAssignment(_) => "MemberAssignment",
            Node::Block(_) => "Block",
            Node::CallExpression(_) => "CallExpression",
            Node::PipeExpression(_) => "PipeExpression",
            Node::ParenExpression(_) => "ParenExpression",
            Node::FunctionExpression(_) => "FunctionExpression",
            Node::ObjectExpression(_) => "ObjectExpression",
            Node::Property(_) => "Property",
            Node::ArrayExpression(_) => "ArrayExpression",
            Node::DictExpression(_) => "DictExpression",
            Node::DictItem(_) => "DictItem",
            Node::ConditionalExpression(_) => "ConditionalExpression",
            Node::LogicalExpression(_) => "LogicalExpression",
            Node::BinaryExpression(_) => "BinaryExpression",
            Node::UnaryExpression(_) => "UnaryExpression",
            Node::MemberExpression(_) => "MemberExpression",
            Node::IndexExpression(_) => "IndexExpression",
            Node::Identifier(_) => "Identifier",
            Node::DurationLiteral(_) => "DurationLiteral",
            Node::DateTimeLiteral(_) => "DateTimeLiteral",
            Node::StringLiteral(_) => "StringLiteral",
            Node::StringExpression(_) => "StringExpression",
            Node::InterpolatedPart(_) => "InterpolatedPart",
            Node::Other => "unsupported node",
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Node::Identifier(id) => Some(&id.name),
            _ => None,
        }
    }

    /// Identifier name or string literal value
    fn as_name(&self) -> Option<&str> {
        match self {
            Node::Identifier(id) => Some(&id.name),
            Node::StringLiteral(s) => Some(&s.value),
            _ => None,
        }
    }

    /// The call expression if this node is a call to `range`
    pub fn as_range_call(&self) -> Option<&CallExpression> {
        match self {
            Node::CallExpression(call) if call.callee_name() == Some("range") => Some(call),
            _ => None,
        }
    }

    /// The assignment if this node binds `name`
    pub fn as_assignment_of(&self, name: &str) -> Option<&VariableAssignment> {
        match self {
            Node::VariableAssignment(assignment) if assignment.id.name == name => Some(assignment),
            _ => None,
        }
    }

    /// Depth-first, pre-order walk over this node and all of its descendants.
    ///
    /// Each call starts a fresh traversal; the iterator owns its own stack.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Push direct children in source order
    fn push_children<'a>(&'a self, out: &mut Vec<&'a Node>) {
        match self {
            Node::Package(p) => out.extend(&p.files),
            Node::File(f) => out.extend(&f.body),
            Node::Block(b) => out.extend(&b.body),
            Node::ExpressionStatement(s) => out.push(&s.expression),
            Node::ReturnStatement(s) => out.push(&s.argument),
            Node::OptionStatement(s) | Node::TestStatement(s) => out.push(&s.assignment),
            Node::TestCaseStatement(t) => out.push(&t.block),
            Node::VariableAssignment(a) => out.push(&a.init),
            Node::MemberAssignment(a) => {
                out.push(&a.member);
                out.push(&a.init);
            }
            Node::CallExpression(c) => {
                out.push(&c.callee);
                out.extend(&c.arguments);
            }
            Node::PipeExpression(p) => {
                out.push(&p.argument);
                out.push(&p.call);
            }
            Node::ParenExpression(p) => out.push(&p.expression),
            Node::FunctionExpression(f) => {
                out.extend(&f.params);
                out.push(&f.body);
            }
            Node::ObjectExpression(o) => out.extend(&o.properties),
            Node::Property(p) => {
                out.push(&p.key);
                if let Some(value) = &p.value {
                    out.push(value);
                }
            }
            Node::ArrayExpression(a) => out.extend(&a.elements),
            Node::DictExpression(d) => out.extend(&d.elements),
            Node::DictItem(item) => {
                out.push(&item.key);
                out.push(&item.val);
            }
            Node::ConditionalExpression(c) => {
                out.push(&c.test);
                out.push(&c.consequent);
                out.push(&c.alternate);
            }
            Node::LogicalExpression(e) | Node::BinaryExpression(e) => {
                out.push(&e.left);
                out.push(&e.right);
            }
            Node::UnaryExpression(u) => out.push(&u.argument),
            Node::StringExpression(e) => out.extend(&e.parts),
            Node::InterpolatedPart(part) => out.push(&part.expression),
            Node::MemberExpression(m) => {
                out.push(&m.object);
                out.push(&m.property);
            }
            Node::IndexExpression(i) => {
                out.push(&i.array);
                out.push(&i.index);
            }
            Node::Identifier(_)
            | Node::DurationLiteral(_)
            | Node::DateTimeLiteral(_)
            | Node::StringLiteral(_)
            | Node::Other => {}
        }
    }
}

/// Iterator returned by [`Node::walk`]
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mark = self.stack.len();
        node.push_children(&mut self.stack);
        // Children were pushed in source order; reverse so the first pops first
        self.stack[mark..].reverse();
        Some(node)
    }
}
