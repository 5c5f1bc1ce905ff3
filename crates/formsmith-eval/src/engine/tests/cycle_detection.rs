use super::common::{derived, input, schema};
use crate::engine::{DependencyGraph, GraphError};

fn cycle_of(fields: Vec<formsmith_schema::Field>) -> Vec<String> {
    match DependencyGraph::build(&schema(fields)) {
        Err(GraphError::Cycle(cycle)) => cycle.involved_field_ids,
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn self_reference_is_a_cycle() {
    let ids = cycle_of(vec![derived("x", &["x"], "x + 1")]);
    assert_eq!(ids, vec!["x"]);
}

#[test]
fn two_field_cycle_names_both() {
    let ids = cycle_of(vec![
        derived("a", &["b"], "b + 1"),
        derived("b", &["a"], "a + 1"),
    ]);
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn cycle_excludes_upstream_fields() {
    // in -> p -> q -> r -> p
    let ids = cycle_of(vec![
        input("in"),
        derived("p", &["in", "r"], "in + r"),
        derived("q", &["p"], "p"),
        derived("r", &["q"], "q"),
    ]);
    assert_eq!(ids.len(), 3);
    for id in ["p", "q", "r"] {
        assert!(ids.iter().any(|x| x == id), "{id} missing from {ids:?}");
    }
    assert!(!ids.iter().any(|x| x == "in"));
}

#[test]
fn cycle_found_beside_acyclic_branch() {
    let s = schema(vec![
        input("a"),
        derived("ok", &["a"], "a * 2"),
        derived("c1", &["c2"], "c2"),
        derived("c2", &["c1"], "c1"),
    ]);
    let Err(GraphError::Cycle(cycle)) = DependencyGraph::build(&s) else {
        panic!("expected a cycle");
    };
    assert!(cycle.contains("c1"));
    assert!(cycle.contains("c2"));
    assert!(!cycle.contains("ok"));
}

#[test]
fn diamond_is_not_a_cycle() {
    let s = schema(vec![
        input("a"),
        derived("l", &["a"], "a"),
        derived("r", &["a"], "a"),
        derived("join", &["l", "r"], "l + r"),
    ]);
    assert!(DependencyGraph::build(&s).is_ok());
}

#[test]
fn cycle_error_message_lists_the_loop() {
    let s = schema(vec![
        derived("a", &["b"], "b"),
        derived("b", &["a"], "a"),
    ]);
    let err = DependencyGraph::build(&s).unwrap_err();
    assert_eq!(err.to_string(), "circular dependency: a -> b -> a");

    let s = schema(vec![derived("x", &["x"], "x")]);
    let err = DependencyGraph::build(&s).unwrap_err();
    assert_eq!(err.to_string(), "field `x` depends on itself");
}
