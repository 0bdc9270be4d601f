//! The equality service.
//!
//! Two types are equal when they are the same type, when an explicit
//! equality mark links them, or when their kind's structural algorithm says
//! so. Marks are bidirectional edges and removable; removal resets the
//! memoized relation caches so dependent results (function equality,
//! assignability) follow the change.

use tracing::trace;
use tyck_common::{Problem, TypeEqualityProblem, TypeHandle};
use tyck_graph::{EdgeCacheState, EdgeKind};

use crate::system::TypeSystem;

/// The equality relation surface.
pub trait EqualityApi {
    fn are_equal(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> bool {
        self.equality_problem(ts, a, b).is_none()
    }

    /// `None` when equal; otherwise the problem explaining the difference.
    fn equality_problem(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Option<Problem>;

    /// Explicitly mark two types as equal (bidirectional, idempotent).
    fn mark_as_equal(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle);

    /// Remove an explicit equality mark, if present.
    fn unmark_as_equal(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle);
}

pub struct DefaultEquality;

impl EqualityApi for DefaultEquality {
    fn equality_problem(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Option<Problem> {
        if a == b {
            return None;
        }
        if let Some(edge) = ts.graph().find_edge(a, b, EdgeKind::Equality) {
            match edge.caching() {
                EdgeCacheState::LinkExists => return None,
                EdgeCacheState::NoLink => {
                    return Some(Problem::TypeEquality(TypeEqualityProblem {
                        first: a,
                        second: b,
                        sub_problems: Vec::new(),
                    }));
                }
                // A computation for this pair is already running above us;
                // assume consistency and let the outer frame decide.
                EdgeCacheState::Pending => return None,
                EdgeCacheState::Unknown => {}
            }
        }

        let edge = ts.graph().ensure_edge(a, b, EdgeKind::Equality);
        edge.set_caching(EdgeCacheState::Pending);
        let problems = analyze(ts, a, b);
        if problems.is_empty() {
            edge.set_caching(EdgeCacheState::LinkExists);
            trace!(?a, ?b, "equality: confirmed");
            None
        } else {
            edge.set_caching(EdgeCacheState::NoLink);
            trace!(?a, ?b, "equality: rejected");
            Some(Problem::TypeEquality(TypeEqualityProblem {
                first: a,
                second: b,
                sub_problems: problems,
            }))
        }
    }

    fn mark_as_equal(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) {
        let edge = ts.graph().ensure_edge(a, b, EdgeKind::Equality);
        edge.set_explicit(true);
        edge.set_caching(EdgeCacheState::LinkExists);
        ts.graph().reset_computed_caches();
        trace!(?a, ?b, "equality: marked");
    }

    fn unmark_as_equal(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) {
        let Some(edge) = ts.graph().find_edge(a, b, EdgeKind::Equality) else {
            return;
        };
        if !edge.is_explicit() {
            return;
        }
        ts.graph().remove_edge_between(a, b, EdgeKind::Equality);
        ts.graph().reset_computed_caches();
        trace!(?a, ?b, "equality: unmarked");
    }
}

fn analyze(ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
    let (Some(data_a), Some(data_b)) = (ts.graph().node(a), ts.graph().node(b)) else {
        return vec![Problem::TypeEquality(TypeEqualityProblem {
            first: a,
            second: b,
            sub_problems: Vec::new(),
        })];
    };
    if data_a.kind_name() != data_b.kind_name() {
        return vec![Problem::TypeEquality(TypeEqualityProblem {
            first: a,
            second: b,
            sub_problems: Vec::new(),
        })];
    }
    ts.kinds().kind_of(&data_a).analyze_equality(ts, a, b)
}
