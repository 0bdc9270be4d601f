//! The assignability service.
//!
//! `Assignable(source, target)` iff the types are equal, or an implicit
//! conversion links them, or `source <: target`. This disjunction is the
//! whole definition; the service only adds memoization on top.

use tracing::trace;
use tyck_common::{AssignabilityProblem, Problem, TypeHandle};
use tyck_graph::{ConversionMode, EdgeCacheState, EdgeKind};

use crate::system::TypeSystem;

/// The assignability relation surface.
pub trait AssignabilityApi {
    fn is_assignable(&self, ts: &TypeSystem, source: TypeHandle, target: TypeHandle) -> bool;

    /// `None` when assignable; otherwise a problem whose sub-problems
    /// enumerate the three failed checks: equality, implicit conversion,
    /// and subtyping.
    fn assignability_problem(
        &self,
        ts: &TypeSystem,
        source: TypeHandle,
        target: TypeHandle,
    ) -> Option<Problem>;
}

pub struct DefaultAssignability;

impl AssignabilityApi for DefaultAssignability {
    fn is_assignable(&self, ts: &TypeSystem, source: TypeHandle, target: TypeHandle) -> bool {
        if source == target {
            return true;
        }
        if let Some(edge) = ts.graph().find_edge(source, target, EdgeKind::Assignability) {
            match edge.caching() {
                EdgeCacheState::LinkExists => return true,
                EdgeCacheState::NoLink => return false,
                EdgeCacheState::Pending => return true,
                EdgeCacheState::Unknown => {}
            }
        }
        let edge = ts.graph().ensure_edge(source, target, EdgeKind::Assignability);
        edge.set_caching(EdgeCacheState::Pending);
        let ok = ts.are_equal(source, target)
            || ts.is_convertible(source, target, ConversionMode::ImplicitExplicit)
            || ts.is_sub_type(source, target);
        edge.set_caching(if ok {
            EdgeCacheState::LinkExists
        } else {
            EdgeCacheState::NoLink
        });
        trace!(?source, ?target, ok, "assignability computed");
        ok
    }

    fn assignability_problem(
        &self,
        ts: &TypeSystem,
        source: TypeHandle,
        target: TypeHandle,
    ) -> Option<Problem> {
        if self.is_assignable(ts, source, target) {
            return None;
        }
        // One sub-problem per failed check, in disjunction order.
        let mut sub_problems = Vec::new();
        if let Some(problem) = ts.equality_problem(source, target) {
            sub_problems.push(problem);
        }
        if let Some(problem) =
            ts.conversion_problem(source, target, ConversionMode::ImplicitExplicit)
        {
            sub_problems.push(problem);
        }
        if let Some(problem) = ts.sub_type_problem(source, target) {
            sub_problems.push(problem);
        }
        Some(Problem::Assignability(AssignabilityProblem {
            source,
            target,
            sub_problems,
        }))
    }
}
