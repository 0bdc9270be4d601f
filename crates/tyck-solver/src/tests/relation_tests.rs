//! Relation service tests: mark idempotence, unmarking, conversion mode
//! strengthening, assignability as the three-way disjunction, cycle
//! detection, and cache behavior across mark changes.

use std::rc::Rc;

use tyck_common::{NoLanguage, Problem};
use tyck_graph::{ConversionMode, EdgeKind};

use crate::system::TypeSystem;

fn engine() -> TypeSystem {
    TypeSystem::new(Rc::new(NoLanguage))
}

#[test]
fn marking_equal_twice_creates_one_edge() {
    let ts = engine();
    let a = ts.create_primitive("a");
    let b = ts.create_primitive("b");

    ts.mark_as_equal(a, b);
    ts.mark_as_equal(a, b);

    assert!(ts.are_equal(a, b));
    assert_eq!(ts.graph().outgoing_edges(a).len(), 1);
    // The bidirectional edge answers both orientations.
    assert!(ts.are_equal(b, a));
}

#[test]
fn unmarking_equality_reverts_the_relation() {
    let ts = engine();
    let a = ts.create_primitive("a");
    let b = ts.create_primitive("b");

    ts.mark_as_equal(a, b);
    assert!(ts.are_equal(a, b));
    ts.unmark_as_equal(a, b);
    assert!(!ts.are_equal(a, b));
    // Unmarking without a mark is a no-op.
    ts.unmark_as_equal(a, b);
    assert!(!ts.are_equal(a, b));
}

#[test]
fn conversion_mode_strengthens_monotonically() {
    let ts = engine();
    let number = ts.create_primitive("number");
    let string = ts.create_primitive("string");

    ts.mark_as_convertible(&[number], &[string], ConversionMode::Explicit);
    assert!(ts.is_convertible(number, string, ConversionMode::Explicit));
    assert!(!ts.is_convertible(number, string, ConversionMode::ImplicitExplicit));

    ts.mark_as_convertible(&[number], &[string], ConversionMode::ImplicitExplicit);
    assert!(ts.is_convertible(number, string, ConversionMode::ImplicitExplicit));

    // A later explicit mark must not downgrade the implicit one.
    ts.mark_as_convertible(&[number], &[string], ConversionMode::Explicit);
    assert_eq!(
        ts.conversion_mode(number, string),
        ConversionMode::ImplicitExplicit
    );
}

#[test]
fn conversion_marks_cover_the_cartesian_product() {
    let ts = engine();
    let a = ts.create_primitive("a");
    let b = ts.create_primitive("b");
    let c = ts.create_primitive("c");
    let d = ts.create_primitive("d");

    ts.mark_as_convertible(&[a, b], &[c, d], ConversionMode::ImplicitExplicit);
    for source in [a, b] {
        for target in [c, d] {
            assert!(ts.is_convertible(source, target, ConversionMode::ImplicitExplicit));
        }
    }
    assert!(!ts.is_convertible(c, a, ConversionMode::Explicit));
}

#[test]
fn implicit_conversion_feeds_assignability_one_way() {
    let ts = engine();
    let number = ts.create_primitive("number");
    let string = ts.create_primitive("string");

    ts.mark_as_convertible(&[number], &[string], ConversionMode::ImplicitExplicit);

    assert!(ts.is_assignable(number, string));
    assert!(!ts.is_assignable(string, number));
}

#[test]
fn explicit_conversion_does_not_feed_assignability() {
    let ts = engine();
    let number = ts.create_primitive("number");
    let string = ts.create_primitive("string");

    ts.mark_as_convertible(&[number], &[string], ConversionMode::Explicit);
    assert!(!ts.is_assignable(number, string));
}

#[test]
fn assignability_problem_lists_the_failed_checks() {
    let ts = engine();
    let a = ts.create_primitive("a");
    let b = ts.create_primitive("b");

    let problem = ts.assignability_problem(a, b).expect("not assignable");
    let Problem::Assignability(p) = &problem else {
        panic!("expected an assignability problem, got {problem:?}");
    };
    assert_eq!((p.source, p.target), (a, b));
    // All three checks of the disjunction are explained, in order.
    assert_eq!(p.sub_problems.len(), 3);
    assert!(matches!(p.sub_problems[0], Problem::TypeEquality(_)));
    assert!(matches!(p.sub_problems[1], Problem::Conversion(_)));
    assert!(matches!(p.sub_problems[2], Problem::SubType(_)));
}

#[test]
fn relation_queries_are_memoized_as_edges() {
    let ts = engine();
    let a = ts.create_primitive("a");
    let b = ts.create_primitive("b");

    assert!(!ts.is_sub_type(a, b));
    let edge = ts
        .graph()
        .find_edge(a, b, EdgeKind::SubType)
        .expect("the computed result is cached as an edge");
    assert_eq!(edge.caching(), tyck_graph::EdgeCacheState::NoLink);
    assert!(!edge.is_explicit());

    // Marking resets memoized results and reverses the answer.
    ts.mark_as_sub_type(a, b);
    assert!(ts.is_sub_type(a, b));
}

#[test]
#[should_panic(expected = "cycle")]
fn marking_a_subtype_cycle_panics() {
    let ts = engine();
    let a = ts.create_primitive("a");
    let b = ts.create_primitive("b");
    let c = ts.create_primitive("c");

    ts.mark_as_sub_type(a, b);
    ts.mark_as_sub_type(b, c);
    ts.mark_as_sub_type(c, a);
}

#[test]
fn reflexive_subtype_mark_is_allowed() {
    let ts = engine();
    let a = ts.create_primitive("a");
    ts.mark_as_sub_type(a, a);
    assert!(ts.is_sub_type(a, a));
}

#[test]
fn unmarking_subtype_reverts_the_relation() {
    let ts = engine();
    let a = ts.create_primitive("a");
    let b = ts.create_primitive("b");

    ts.mark_as_sub_type(a, b);
    assert!(ts.is_sub_type(a, b));
    assert!(ts.is_assignable(a, b));

    ts.unmark_as_sub_type(a, b);
    assert!(!ts.is_sub_type(a, b));
    assert!(!ts.is_assignable(a, b));
}
