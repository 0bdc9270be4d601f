//! The conversion service.
//!
//! Conversions are explicit facts only: hosts mark source/target pairs with
//! a mode. Equal types are convertible in any mode. Mode changes strengthen
//! monotonically, so an implicit mark is never downgraded by a later
//! explicit one.

use tracing::trace;
use tyck_common::{ConversionProblem, Problem, TypeHandle};
use tyck_graph::{ConversionMode, EdgeCacheState, EdgeKind};

use crate::system::TypeSystem;

/// The conversion relation surface.
pub trait ConversionApi {
    /// Whether `from` converts to `to` at least as freely as `mode`
    /// (implicit conversions also satisfy explicit queries).
    fn is_convertible(
        &self,
        ts: &TypeSystem,
        from: TypeHandle,
        to: TypeHandle,
        mode: ConversionMode,
    ) -> bool;

    /// `None` when `from` converts to `to` at `mode`; otherwise the problem
    /// explaining the missing conversion.
    fn conversion_problem(
        &self,
        ts: &TypeSystem,
        from: TypeHandle,
        to: TypeHandle,
        mode: ConversionMode,
    ) -> Option<Problem> {
        if self.is_convertible(ts, from, to, mode) {
            return None;
        }
        Some(Problem::Conversion(ConversionProblem {
            from,
            to,
            required: mode,
            sub_problems: Vec::new(),
        }))
    }

    /// The strongest marked mode for the pair, `None` when unmarked.
    fn conversion_mode(&self, ts: &TypeSystem, from: TypeHandle, to: TypeHandle) -> ConversionMode;

    /// Mark every `sources x targets` pair as convertible with `mode`.
    fn mark_as_convertible(
        &self,
        ts: &TypeSystem,
        sources: &[TypeHandle],
        targets: &[TypeHandle],
        mode: ConversionMode,
    );

    /// Remove the conversion mark of a pair, if present.
    fn unmark_as_convertible(&self, ts: &TypeSystem, from: TypeHandle, to: TypeHandle);
}

pub struct DefaultConversion;

impl ConversionApi for DefaultConversion {
    fn is_convertible(
        &self,
        ts: &TypeSystem,
        from: TypeHandle,
        to: TypeHandle,
        mode: ConversionMode,
    ) -> bool {
        if ts.are_equal(from, to) {
            return true;
        }
        self.conversion_mode(ts, from, to) >= mode
    }

    fn conversion_mode(&self, ts: &TypeSystem, from: TypeHandle, to: TypeHandle) -> ConversionMode {
        match ts.graph().find_edge(from, to, EdgeKind::Conversion) {
            Some(edge) => edge.mode(),
            None => ConversionMode::None,
        }
    }

    fn mark_as_convertible(
        &self,
        ts: &TypeSystem,
        sources: &[TypeHandle],
        targets: &[TypeHandle],
        mode: ConversionMode,
    ) {
        assert!(
            mode != ConversionMode::None,
            "a conversion mark needs a mode; use unmark_as_convertible to remove one"
        );
        for &source in sources {
            for &target in targets {
                let edge = ts.graph().ensure_edge(source, target, EdgeKind::Conversion);
                edge.set_explicit(true);
                edge.set_caching(EdgeCacheState::LinkExists);
                edge.strengthen_mode(mode);
                trace!(?source, ?target, ?mode, "conversion: marked");
            }
        }
        ts.graph().reset_computed_caches();
    }

    fn unmark_as_convertible(&self, ts: &TypeSystem, from: TypeHandle, to: TypeHandle) {
        if ts.graph().find_edge(from, to, EdgeKind::Conversion).is_some() {
            ts.graph().remove_edge_between(from, to, EdgeKind::Conversion);
            ts.graph().reset_computed_caches();
            trace!(?from, ?to, "conversion: unmarked");
        }
    }
}
