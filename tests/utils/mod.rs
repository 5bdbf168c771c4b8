// Flux AST builders for integration tests
//
// Produce the JSON shapes emitted by the Flux parser, then decode them
// through the public API the way a real AST would be.

#![allow(dead_code)]

use fluxwindow::ast::Node;
use serde_json::{json, Value};
use std::path::PathBuf;

pub const NOW: f64 = 1_700_000_000_000.0;
pub const MINUTE: f64 = 60_000.0;

pub fn ident(name: &str) -> Value {
    json!({"type": "Identifier", "name": name})
}

pub fn duration(values: &[(i64, &str)]) -> Value {
    let values: Vec<Value> = values
        .iter()
        .map(|(magnitude, unit)| json!({"magnitude": magnitude, "unit": unit}))
        .collect();
    json!({"type": "DurationLiteral", "values": values})
}

/// `-<magnitude><unit>`
pub fn ago(magnitude: i64, unit: &str) -> Value {
    json!({"type": "UnaryExpression", "operator": "-", "argument": duration(&[(magnitude, unit)])})
}

pub fn datetime(value: &str) -> Value {
    json!({"type": "DateTimeLiteral", "value": value})
}

pub fn member(object: &str, property: &str) -> Value {
    json!({"type": "MemberExpression", "object": ident(object), "property": ident(property)})
}

pub fn prop(key: &str, value: Value) -> Value {
    json!({"type": "Property", "key": ident(key), "value": value})
}

pub fn object(props: Vec<Value>) -> Value {
    json!({"type": "ObjectExpression", "properties": props})
}

pub fn call(name: &str, props: Vec<Value>) -> Value {
    json!({"type": "CallExpression", "callee": ident(name), "arguments": [object(props)]})
}

/// `range(start: <start>[, stop: <stop>])`
pub fn range(start: Value, stop: Option<Value>) -> Value {
    let mut props = vec![prop("start", start)];
    if let Some(stop) = stop {
        props.push(prop("stop", stop));
    }
    call("range", props)
}

/// `from(bucket: "telegraf") |> <call>`
pub fn from_bucket(call_expr: Value) -> Value {
    json!({
        "type": "PipeExpression",
        "argument": call("from", vec![prop("bucket", json!({"type": "StringLiteral", "value": "telegraf"}))]),
        "call": call_expr
    })
}

/// `(<expression>)`
pub fn paren(expression: Value) -> Value {
    json!({"type": "ParenExpression", "expression": expression})
}

/// `() => { <statement> return 0 }`, a statement nested in a function body
pub fn function_scope(statement: Value) -> Value {
    json!({
        "type": "FunctionExpression",
        "params": [],
        "body": {
            "type": "Block",
            "body": [statement, {"type": "ReturnStatement", "argument": {"type": "IntegerLiteral", "value": "0"}}]
        }
    })
}

pub fn assign(name: &str, init: Value) -> Value {
    json!({"type": "VariableAssignment", "id": ident(name), "init": init})
}

pub fn stmt(expression: Value) -> Value {
    json!({"type": "ExpressionStatement", "expression": expression})
}

/// Single-file package around `body`
pub fn package(body: Vec<Value>) -> Node {
    Node::from_value(json!({
        "type": "Package",
        "package": "main",
        "files": [{"type": "File", "body": body}]
    }))
    .expect("builder produced an invalid AST")
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
