//! Stable arena handles.
//!
//! Types and edges live in arenas owned by the type graph; everything else
//! refers to them through these copyable handles. Host language nodes are
//! never stored by the engine - the host keeps its AST and hands out opaque
//! `NodeHandle` values that only the host's `LanguageAdapter` and its
//! registered rules know how to interpret.

use serde::Serialize;

/// Handle of a type in the graph arena.
///
/// Handles are dense indices; a removed type leaves a tombstoned slot, so a
/// stale handle resolves to nothing instead of aliasing a new type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeHandle(pub u32);

impl TypeHandle {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a relationship edge in the graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque handle of a host language node.
///
/// The engine treats these as identity only: cache keys, problem locations,
/// and arguments passed back to host-registered rules and adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeHandle(pub u64);
