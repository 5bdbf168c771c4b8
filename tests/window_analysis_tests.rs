// Minimum range window over complete Flux programs

mod utils;

use fluxwindow::ast::Node;
use fluxwindow::error::AnalysisError;
use fluxwindow::window::{all_range_times, analyze, min_duration_from_ast, min_duration_from_ast_at};
use utils::*;

fn load_fixture(name: &str) -> Node {
    let json = std::fs::read_to_string(fixture(name)).unwrap();
    Node::from_json(&json).unwrap()
}

#[test]
fn test_single_range_five_minutes() {
    let ast = package(vec![stmt(from_bucket(range(ago(5, "m"), None)))]);
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(Some(300_000.0)));
}

#[test]
fn test_wall_clock_entry_point() {
    let ast = package(vec![stmt(from_bucket(range(ago(5, "m"), None)))]);
    assert_eq!(min_duration_from_ast(&ast), Ok(Some(300_000.0)));
}

#[test]
fn test_two_ranges_use_cross_pairings() {
    // {(-10m,-5m)=5m, (-10m,now)=10m, (-1h,-5m)=55m, (-1h,now)=1h}
    let ast = package(vec![
        assign("a", from_bucket(range(ago(10, "m"), Some(ago(5, "m"))))),
        assign("b", from_bucket(range(ago(1, "h"), None))),
    ]);
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(Some(300_000.0)));
}

#[test]
fn test_missing_start_fails() {
    let ast = package(vec![stmt(from_bucket(call(
        "range",
        vec![prop("stop", ago(5, "m"))],
    )))]);
    assert_eq!(
        min_duration_from_ast_at(&ast, NOW),
        Err(AnalysisError::MissingStart)
    );
}

#[test]
fn test_missing_stop_is_now() {
    let ast = package(vec![stmt(from_bucket(range(ago(2, "h"), None)))]);
    let times = all_range_times(&ast, NOW).unwrap();
    assert_eq!(times.len(), 1);
    assert_eq!(times[0].stop, NOW);
    assert_eq!(times[0].start, NOW - 120.0 * MINUTE);
}

#[test]
fn test_identifier_without_assignment_fails() {
    let ast = package(vec![stmt(from_bucket(range(ident("lookback"), None)))]);
    assert_eq!(
        min_duration_from_ast_at(&ast, NOW),
        Err(AnalysisError::UnresolvedIdentifier("lookback".to_string()))
    );
}

#[test]
fn test_identifier_with_two_assignments_fails() {
    let ast = package(vec![
        assign("lookback", ago(1, "h")),
        stmt(function_scope(assign("lookback", ago(2, "h")))),
        stmt(from_bucket(range(ident("lookback"), None))),
    ]);
    assert_eq!(
        min_duration_from_ast_at(&ast, NOW),
        Err(AnalysisError::DuplicateDeclaration("lookback".to_string()))
    );
}

#[test]
fn test_member_access_resolves_through_object() {
    let ast = package(vec![
        assign("bounds", object(vec![prop("start", ago(45, "m"))])),
        stmt(from_bucket(range(member("bounds", "start"), None))),
    ]);
    assert_eq!(
        min_duration_from_ast_at(&ast, NOW),
        Ok(Some(45.0 * MINUTE))
    );
}

#[test]
fn test_member_access_missing_property_fails() {
    let ast = package(vec![
        assign("bounds", object(vec![prop("stop", ago(45, "m"))])),
        stmt(from_bucket(range(member("bounds", "start"), None))),
    ]);
    assert!(matches!(
        min_duration_from_ast_at(&ast, NOW),
        Err(AnalysisError::UnresolvedMember { .. })
    ));
}

#[test]
fn test_member_access_missing_object_fails() {
    let ast = package(vec![stmt(from_bucket(range(member("bounds", "start"), None)))]);
    assert_eq!(
        min_duration_from_ast_at(&ast, NOW),
        Err(AnalysisError::UnresolvedIdentifier("bounds".to_string()))
    );
}

#[test]
fn test_member_access_ambiguous_object_fails() {
    let ast = package(vec![
        assign("bounds", object(vec![prop("start", ago(45, "m"))])),
        assign("bounds", object(vec![prop("start", ago(15, "m"))])),
        stmt(from_bucket(range(member("bounds", "start"), None))),
    ]);
    assert_eq!(
        min_duration_from_ast_at(&ast, NOW),
        Err(AnalysisError::DuplicateDeclaration("bounds".to_string()))
    );
}

#[test]
fn test_compound_duration_literal() {
    let start = serde_json::json!({
        "type": "UnaryExpression",
        "operator": "-",
        "argument": duration(&[(5, "m"), (30, "s")])
    });
    let ast = package(vec![stmt(from_bucket(range(start, None)))]);
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(Some(330_000.0)));
}

#[test]
fn test_one_bad_range_fails_the_whole_script() {
    let ast = package(vec![
        stmt(from_bucket(range(ago(5, "m"), None))),
        stmt(from_bucket(range(datetime("not a time"), None))),
    ]);
    assert_eq!(
        min_duration_from_ast_at(&ast, NOW),
        Err(AnalysisError::InvalidDateTime("not a time".to_string()))
    );
}

#[test]
fn test_no_ranges_is_distinct_from_failure() {
    let ast = package(vec![stmt(from_bucket(call("limit", vec![])))]);
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(None));
}

#[test]
fn test_parenthesized_range_is_found() {
    let ast = package(vec![stmt(paren(from_bucket(range(ago(5, "m"), None))))]);
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(Some(5.0 * MINUTE)));
}

#[test]
fn test_parenthesized_range_narrows_sibling_range() {
    let ast = package(vec![
        stmt(paren(from_bucket(range(ago(5, "m"), None)))),
        stmt(from_bucket(range(ago(1, "h"), None))),
    ]);
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(Some(5.0 * MINUTE)));
}

#[test]
fn test_assignment_inside_testcase_is_declared() {
    let testcase = serde_json::json!({
        "type": "TestCaseStatement",
        "id": ident("window"),
        "block": {"type": "Block", "body": [assign("lookback", ago(30, "m"))]}
    });
    let ast = package(vec![
        testcase,
        stmt(from_bucket(range(ident("lookback"), None))),
    ]);
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(Some(30.0 * MINUTE)));
}

#[test]
fn test_range_inside_string_interpolation_is_found() {
    let text = serde_json::json!({
        "type": "StringExpression",
        "parts": [
            {"type": "TextPart", "value": "rows: "},
            {"type": "InterpolatedPart", "expression": from_bucket(range(ago(15, "m"), None))}
        ]
    });
    let ast = package(vec![assign("label", text)]);
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(Some(15.0 * MINUTE)));
}

#[test]
fn test_join_fixture() {
    let ast = load_fixture("join_ranges.json");
    let report = analyze(&ast, NOW).unwrap();
    assert_eq!(report.ranges.len(), 2);
    assert_eq!(report.min_window_ms, Some(20.0 * MINUTE));
}

#[test]
fn test_absolute_fixture() {
    let ast = load_fixture("absolute_range.json");
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(Some(330_000.0)));
}

#[test]
fn test_unresolved_fixture() {
    let ast = load_fixture("unresolved_identifier.json");
    let err = min_duration_from_ast_at(&ast, NOW).unwrap_err();
    assert_eq!(err.to_string(), "unable to resolve identifier \"lookback\"");
}

#[test]
fn test_no_ranges_fixture() {
    let ast = load_fixture("no_ranges.json");
    assert_eq!(min_duration_from_ast_at(&ast, NOW), Ok(None));
}
