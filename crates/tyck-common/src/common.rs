//! Common types - shared enums to break circular dependencies.
//!
//! `ConversionMode` is carried both by conversion edges in the graph and by
//! conversion problems in the taxonomy, so it lives below both crates.

/// Mode of a conversion between two types.
///
/// Ordered by strength: a mark only ever strengthens an edge's mode, and an
/// edge satisfies a query whose required mode is not above its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionMode {
    None,
    Explicit,
    /// Implicit conversions also satisfy explicit queries.
    ImplicitExplicit,
}
