//! Typed relationship edges.
//!
//! Edges are both facts (explicit marks, class inheritance, top/bottom
//! axioms) and memoized computation results. The `EdgeCacheState`
//! distinguishes a computed link, a computed non-link, an in-flight
//! computation, and an invalidated entry so repeated relation queries are
//! O(1) after the first computation.

use std::cell::Cell;

use bitflags::bitflags;
use tyck_common::TypeHandle;
pub use tyck_common::ConversionMode;

/// The `$relation` tag of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    SubType,
    Conversion,
    Equality,
    ClassSuper,
    Assignability,
}

impl EdgeKind {
    /// Mask bit of this relation.
    #[must_use]
    pub const fn mask(self) -> RelationMask {
        match self {
            Self::SubType => RelationMask::SUB_TYPE,
            Self::Conversion => RelationMask::CONVERSION,
            Self::Equality => RelationMask::EQUALITY,
            Self::ClassSuper => RelationMask::CLASS_SUPER,
            Self::Assignability => RelationMask::ASSIGNABILITY,
        }
    }

    /// Declared traversal direction of this relation.
    #[must_use]
    pub const fn direction(self) -> EdgeDirection {
        match self {
            Self::Equality => EdgeDirection::Bidirectional,
            Self::SubType | Self::Conversion | Self::ClassSuper | Self::Assignability => {
                EdgeDirection::FromTo
            }
        }
    }
}

bitflags! {
    /// Set of edge relations, for the graph algorithms.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RelationMask: u8 {
        const SUB_TYPE = 1 << 0;
        const CONVERSION = 1 << 1;
        const EQUALITY = 1 << 2;
        const CLASS_SUPER = 1 << 3;
        const ASSIGNABILITY = 1 << 4;
    }
}

/// How the graph algorithms may walk a relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeDirection {
    /// Follow edges from `from` to `to` only.
    FromTo,
    /// Follow edges from `to` to `from` only.
    ToFrom,
    /// Follow edges either way.
    Bidirectional,
}

/// Cache state of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeCacheState {
    /// A computation for this pair is in flight; do not memoize on re-entry.
    Pending,
    /// The previous result was invalidated; recompute on next query.
    Unknown,
    /// The relation holds.
    LinkExists,
    /// The relation does not hold.
    NoLink,
}

/// A directed binary relationship between two types.
#[derive(Debug)]
pub struct TypeEdge {
    pub from: TypeHandle,
    pub to: TypeHandle,
    pub relation: EdgeKind,
    caching: Cell<EdgeCacheState>,
    /// Explicit edges are facts (marks, axioms, inheritance); they survive
    /// cache invalidation. Non-explicit edges are memoized results.
    explicit: Cell<bool>,
    mode: Cell<ConversionMode>,
}

impl TypeEdge {
    #[must_use]
    pub fn new(from: TypeHandle, to: TypeHandle, relation: EdgeKind) -> Self {
        Self {
            from,
            to,
            relation,
            caching: Cell::new(EdgeCacheState::Unknown),
            explicit: Cell::new(false),
            mode: Cell::new(ConversionMode::None),
        }
    }

    #[inline]
    #[must_use]
    pub fn caching(&self) -> EdgeCacheState {
        self.caching.get()
    }

    pub fn set_caching(&self, state: EdgeCacheState) {
        self.caching.set(state);
    }

    #[inline]
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.explicit.get()
    }

    pub fn set_explicit(&self, explicit: bool) {
        self.explicit.set(explicit);
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> ConversionMode {
        self.mode.get()
    }

    /// Strengthen the conversion mode monotonically: once implicit, a later
    /// explicit mark keeps the edge implicit.
    pub fn strengthen_mode(&self, mode: ConversionMode) {
        if mode > self.mode.get() {
            self.mode.set(mode);
        }
    }

    /// The neighbor of `handle` on this edge, honoring the declared
    /// traversal direction. `None` if the edge does not lead anywhere from
    /// `handle`.
    #[must_use]
    pub fn neighbor_of(&self, handle: TypeHandle) -> Option<TypeHandle> {
        match self.relation.direction() {
            EdgeDirection::FromTo => (self.from == handle).then_some(self.to),
            EdgeDirection::ToFrom => (self.to == handle).then_some(self.from),
            EdgeDirection::Bidirectional => {
                if self.from == handle {
                    Some(self.to)
                } else if self.to == handle {
                    Some(self.from)
                } else {
                    None
                }
            }
        }
    }
}
