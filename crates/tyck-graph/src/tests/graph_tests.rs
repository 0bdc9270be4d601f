//! Graph storage tests: registration, dedup panics, edge idempotence,
//! listener replay, and removal restoring the prior state.

use std::cell::RefCell;
use std::rc::Rc;

use tyck_common::TypeHandle;

use crate::edge::{EdgeCacheState, EdgeKind};
use crate::graph::{GraphListener, TypeGraph};
use crate::node::{PrimitiveTypeData, TypeData, TypePayload};

fn primitive(graph: &TypeGraph, name: &str) -> TypeHandle {
    let handle = graph.alloc_type(TypeData::new(TypePayload::Primitive(PrimitiveTypeData {
        name: name.to_string(),
    })));
    graph.register_type(handle, name.to_string());
    handle
}

#[test]
fn registered_type_is_found_by_identifier() {
    let graph = TypeGraph::new();
    let integer = primitive(&graph, "integer");

    assert_eq!(graph.get_type("integer"), Some(integer));
    assert_eq!(graph.all_registered(), vec![integer]);
}

#[test]
fn allocated_but_unregistered_type_is_invisible() {
    let graph = TypeGraph::new();
    let pending = graph.alloc_type(TypeData::new(TypePayload::Primitive(PrimitiveTypeData {
        name: "pending".to_string(),
    })));

    assert!(graph.get_type("pending").is_none());
    assert!(graph.all_registered().is_empty());
    // The arena still knows the node.
    assert!(graph.node(pending).is_some());
}

#[test]
#[should_panic(expected = "collide on identifier")]
fn identifier_collision_panics() {
    let graph = TypeGraph::new();
    primitive(&graph, "integer");
    let second = graph.alloc_type(TypeData::new(TypePayload::Primitive(PrimitiveTypeData {
        name: "integer".to_string(),
    })));
    graph.register_type(second, "integer".to_string());
}

#[test]
fn ensure_edge_is_idempotent() {
    let graph = TypeGraph::new();
    let a = primitive(&graph, "a");
    let b = primitive(&graph, "b");

    let first = graph.ensure_edge(a, b, EdgeKind::SubType);
    let second = graph.ensure_edge(a, b, EdgeKind::SubType);
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(graph.outgoing_edges(a).len(), 1);
}

#[test]
fn bidirectional_relation_matches_either_orientation() {
    let graph = TypeGraph::new();
    let a = primitive(&graph, "a");
    let b = primitive(&graph, "b");

    graph.ensure_edge(a, b, EdgeKind::Equality);
    assert!(graph.find_edge(b, a, EdgeKind::Equality).is_some());
    // Directed relations do not match the reverse orientation.
    graph.ensure_edge(a, b, EdgeKind::SubType);
    assert!(graph.find_edge(b, a, EdgeKind::SubType).is_none());
}

#[test]
fn removing_a_type_detaches_its_edges() {
    let graph = TypeGraph::new();
    let a = primitive(&graph, "a");
    let b = primitive(&graph, "b");
    graph.ensure_edge(a, b, EdgeKind::SubType);

    graph.remove_type(b);

    assert!(graph.get_type("b").is_none());
    assert!(graph.node(b).is_none());
    assert!(graph.outgoing_edges(a).is_empty());
    assert_eq!(graph.all_registered(), vec![a]);
}

#[test]
fn reset_computed_caches_keeps_explicit_edges() {
    let graph = TypeGraph::new();
    let a = primitive(&graph, "a");
    let b = primitive(&graph, "b");

    let fact = graph.ensure_edge(a, b, EdgeKind::SubType);
    fact.set_explicit(true);
    fact.set_caching(EdgeCacheState::LinkExists);
    let memo = graph.ensure_edge(b, a, EdgeKind::Equality);
    memo.set_caching(EdgeCacheState::NoLink);

    graph.reset_computed_caches();

    assert_eq!(fact.caching(), EdgeCacheState::LinkExists);
    assert_eq!(memo.caching(), EdgeCacheState::Unknown);
}

#[derive(Default)]
struct RecordingListener {
    added: RefCell<Vec<TypeHandle>>,
    removed: RefCell<Vec<TypeHandle>>,
}

impl GraphListener for RecordingListener {
    fn on_type_added(&self, _graph: &TypeGraph, handle: TypeHandle) {
        self.added.borrow_mut().push(handle);
    }

    fn on_type_removed(&self, _graph: &TypeGraph, handle: TypeHandle) {
        self.removed.borrow_mut().push(handle);
    }
}

#[test]
fn listener_replay_covers_existing_types() {
    let graph = TypeGraph::new();
    let a = primitive(&graph, "a");
    let b = primitive(&graph, "b");

    let listener = Rc::new(RecordingListener::default());
    graph.add_listener(listener.clone(), true);
    assert_eq!(*listener.added.borrow(), vec![a, b]);

    let c = primitive(&graph, "c");
    graph.remove_type(a);
    assert_eq!(*listener.added.borrow(), vec![a, b, c]);
    assert_eq!(*listener.removed.borrow(), vec![a]);
}

#[test]
fn listeners_are_notified_in_registration_order() {
    let graph = TypeGraph::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    struct Tagged {
        tag: u32,
        order: Rc<RefCell<Vec<u32>>>,
    }
    impl GraphListener for Tagged {
        fn on_type_added(&self, _graph: &TypeGraph, _handle: TypeHandle) {
            self.order.borrow_mut().push(self.tag);
        }
    }

    graph.add_listener(
        Rc::new(Tagged {
            tag: 1,
            order: order.clone(),
        }),
        false,
    );
    graph.add_listener(
        Rc::new(Tagged {
            tag: 2,
            order: order.clone(),
        }),
        false,
    );
    primitive(&graph, "a");
    assert_eq!(*order.borrow(), vec![1, 2]);
}
