//! The top and bottom singletons.
//!
//! When enabled, each registers a graph listener with replay: on every type
//! arrival it marks `other <: Top` (resp. `Bottom <: other`) as an explicit
//! subtype edge, so the universal axioms are ordinary graph facts that the
//! path search and the algorithms see.

use std::rc::Rc;

use tyck_common::{Problem, SubTypeProblem, TypeEqualityProblem, TypeHandle};
use tyck_graph::{
    EdgeCacheState, EdgeKind, GraphListener, SingletonTypeData, TypeData,
    TypeInitializationState, TypeGraph, TypePayload, TypeRef,
};

use crate::kind::Kind;
use crate::system::TypeSystem;

pub const TOP_KIND_NAME: &str = "top";
pub const BOTTOM_KIND_NAME: &str = "bottom";

const DEFAULT_TOP_NAME: &str = "any";
const DEFAULT_BOTTOM_NAME: &str = "never";

/// Marks `other <: singleton` (top) or `singleton <: other` (bottom) for
/// every type that enters the graph.
struct AxiomListener {
    singleton: TypeHandle,
    /// true: edges point towards the singleton (top); false: away (bottom).
    towards: bool,
}

impl GraphListener for AxiomListener {
    fn on_type_added(&self, graph: &TypeGraph, handle: TypeHandle) {
        if handle == self.singleton {
            return;
        }
        let (from, to) = if self.towards {
            (handle, self.singleton)
        } else {
            (self.singleton, handle)
        };
        let edge = graph.ensure_edge(from, to, EdgeKind::SubType);
        edge.set_explicit(true);
        edge.set_caching(EdgeCacheState::LinkExists);
    }
}

fn create_singleton(ts: &TypeSystem, name: &str, payload: TypePayload, towards: bool) -> TypeHandle {
    if let Some(existing) = ts.graph().get_type(name) {
        let data = ts
            .graph()
            .node(existing)
            .expect("registered types have live nodes");
        assert!(
            data.kind_name() == payload.kind_name(),
            "the name {name:?} is already taken by a different kind of type"
        );
        return existing;
    }
    let handle = ts.graph().alloc_type(TypeData::new(payload));
    let data = ts.graph().node(handle).expect("node just allocated");
    data.set_state(TypeInitializationState::Identifiable);
    ts.graph().register_type(handle, name.to_string());
    data.set_state(TypeInitializationState::Completed);
    ts.graph().add_listener(
        Rc::new(AxiomListener {
            singleton: handle,
            towards,
        }),
        true,
    );
    ts.after_type_registered();
    handle
}

fn singleton_equality(a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
    // Only one instance of the singleton exists; two distinct handles are
    // never equal.
    vec![Problem::TypeEquality(TypeEqualityProblem {
        first: a,
        second: b,
        sub_problems: Vec::new(),
    })]
}

/// The universal super-type.
pub struct TopKind {
    pub name: String,
}

impl TopKind {
    #[must_use]
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.unwrap_or_else(|| DEFAULT_TOP_NAME.to_string()),
        }
    }

    /// Get or create the top singleton.
    pub fn get_or_create(&self, ts: &TypeSystem) -> TypeHandle {
        create_singleton(
            ts,
            &self.name,
            TypePayload::Top(SingletonTypeData {
                name: self.name.clone(),
            }),
            true,
        )
    }
}

impl Kind for TopKind {
    fn name(&self) -> &str {
        TOP_KIND_NAME
    }

    fn calculate_identifier(&self, _ts: &TypeSystem, data: &TypeData) -> Option<String> {
        match data.payload() {
            TypePayload::Top(s) => Some(s.name.clone()),
            _ => None,
        }
    }

    fn identifiability_refs(&self, _data: &TypeData) -> Vec<TypeRef> {
        Vec::new()
    }

    fn analyze_equality(&self, _ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
        singleton_equality(a, b)
    }

    fn analyze_sub_type(&self, _ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
        // Everything is below top; the service's axiom check accepts before
        // kind analysis runs. Top below something else is not derivable.
        vec![Problem::SubType(SubTypeProblem {
            sub,
            sup,
            sub_problems: Vec::new(),
        })]
    }

    fn user_name(&self, _ts: &TypeSystem, _handle: TypeHandle) -> String {
        self.name.clone()
    }
}

/// The universal sub-type.
pub struct BottomKind {
    pub name: String,
}

impl BottomKind {
    #[must_use]
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.unwrap_or_else(|| DEFAULT_BOTTOM_NAME.to_string()),
        }
    }

    /// Get or create the bottom singleton.
    pub fn get_or_create(&self, ts: &TypeSystem) -> TypeHandle {
        create_singleton(
            ts,
            &self.name,
            TypePayload::Bottom(SingletonTypeData {
                name: self.name.clone(),
            }),
            false,
        )
    }
}

impl Kind for BottomKind {
    fn name(&self) -> &str {
        BOTTOM_KIND_NAME
    }

    fn calculate_identifier(&self, _ts: &TypeSystem, data: &TypeData) -> Option<String> {
        match data.payload() {
            TypePayload::Bottom(s) => Some(s.name.clone()),
            _ => None,
        }
    }

    fn identifiability_refs(&self, _data: &TypeData) -> Vec<TypeRef> {
        Vec::new()
    }

    fn analyze_equality(&self, _ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
        singleton_equality(a, b)
    }

    fn analyze_sub_type(&self, _ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
        vec![Problem::SubType(SubTypeProblem {
            sub,
            sup,
            sub_problems: Vec::new(),
        })]
    }

    fn user_name(&self, _ts: &TypeSystem, _handle: TypeHandle) -> String {
        self.name.clone()
    }
}
