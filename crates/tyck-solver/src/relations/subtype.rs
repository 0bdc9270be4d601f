//! The subtype service.
//!
//! `sub <: sup` holds when the types are the same, when the bottom/top
//! axioms apply, when a path of explicit subtype facts (marks, axiom edges)
//! connects them, or when the common kind's structural algorithm accepts.
//! Transitivity falls out of the path search over materialized edges.

use tracing::trace;
use tyck_common::{Problem, SubTypeProblem, TypeHandle};
use tyck_graph::{
    EdgeCacheState, EdgeKind, RelationMask, TypeEdge, TypePayload, exists_edge_path,
};

use crate::system::TypeSystem;

/// The subtype relation surface.
pub trait SubtypeApi {
    fn is_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> bool {
        self.sub_type_problem(ts, sub, sup).is_none()
    }

    /// `None` when `sub <: sup`; otherwise the problem explaining why not.
    fn sub_type_problem(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle)
    -> Option<Problem>;

    /// Explicitly mark `sub <: sup`. With cycle detection enabled, a mark
    /// that would close a non-reflexive subtype cycle is a programmer error.
    fn mark_as_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle);

    /// Remove an explicit subtype mark, if present.
    fn unmark_as_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle);
}

pub struct DefaultSubtype {
    /// Check for new cycles on every explicit mark.
    pub cycle_detection_on_mark: bool,
}

impl Default for DefaultSubtype {
    fn default() -> Self {
        Self {
            cycle_detection_on_mark: true,
        }
    }
}

impl SubtypeApi for DefaultSubtype {
    fn sub_type_problem(
        &self,
        ts: &TypeSystem,
        sub: TypeHandle,
        sup: TypeHandle,
    ) -> Option<Problem> {
        if sub == sup {
            return None;
        }
        if let Some(edge) = ts.graph().find_edge(sub, sup, EdgeKind::SubType) {
            match edge.caching() {
                EdgeCacheState::LinkExists => return None,
                EdgeCacheState::NoLink => {
                    return Some(Problem::SubType(SubTypeProblem {
                        sub,
                        sup,
                        sub_problems: Vec::new(),
                    }));
                }
                EdgeCacheState::Pending => return None,
                EdgeCacheState::Unknown => {}
            }
        }

        let edge = ts.graph().ensure_edge(sub, sup, EdgeKind::SubType);
        edge.set_caching(EdgeCacheState::Pending);
        let problems = analyze(ts, sub, sup);
        if problems.is_empty() {
            edge.set_caching(EdgeCacheState::LinkExists);
            trace!(?sub, ?sup, "subtype: confirmed");
            None
        } else {
            edge.set_caching(EdgeCacheState::NoLink);
            trace!(?sub, ?sup, "subtype: rejected");
            Some(Problem::SubType(SubTypeProblem {
                sub,
                sup,
                sub_problems: problems,
            }))
        }
    }

    fn mark_as_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) {
        if self.cycle_detection_on_mark && sub != sup {
            let explicit_only = |edge: &TypeEdge| {
                edge.caching() == EdgeCacheState::LinkExists && edge.is_explicit()
            };
            assert!(
                !exists_edge_path(
                    ts.graph(),
                    sup,
                    sub,
                    RelationMask::SUB_TYPE,
                    Some(&explicit_only)
                ),
                "marking {sub:?} <: {sup:?} would close a subtype cycle"
            );
        }
        let edge = ts.graph().ensure_edge(sub, sup, EdgeKind::SubType);
        edge.set_explicit(true);
        edge.set_caching(EdgeCacheState::LinkExists);
        ts.graph().reset_computed_caches();
        trace!(?sub, ?sup, "subtype: marked");
    }

    fn unmark_as_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) {
        let Some(edge) = ts.graph().find_edge(sub, sup, EdgeKind::SubType) else {
            return;
        };
        if !edge.is_explicit() {
            return;
        }
        ts.graph().remove_edge_between(sub, sup, EdgeKind::SubType);
        ts.graph().reset_computed_caches();
        trace!(?sub, ?sup, "subtype: unmarked");
    }
}

fn analyze(ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
    let (Some(data_sub), Some(data_sup)) = (ts.graph().node(sub), ts.graph().node(sup)) else {
        return vec![Problem::SubType(SubTypeProblem {
            sub,
            sup,
            sub_problems: Vec::new(),
        })];
    };
    // Axioms: bottom is below everything, everything is below top.
    if matches!(data_sub.payload(), TypePayload::Bottom(_))
        || matches!(data_sup.payload(), TypePayload::Top(_))
    {
        return Vec::new();
    }
    // Explicit facts (marks, axiom edges) and their transitive closure.
    let facts = |edge: &TypeEdge| edge.caching() == EdgeCacheState::LinkExists && edge.is_explicit();
    if exists_edge_path(ts.graph(), sub, sup, RelationMask::SUB_TYPE, Some(&facts)) {
        return Vec::new();
    }
    if data_sub.kind_name() == data_sup.kind_name() {
        return ts.kinds().kind_of(&data_sub).analyze_sub_type(ts, sub, sup);
    }
    vec![Problem::SubType(SubTypeProblem {
        sub,
        sup,
        sub_problems: Vec::new(),
    })]
}
