//! Graph storage and the listener protocol.
//!
//! The graph owns two tombstoned arenas (types, edges), the identifier
//! index, and per-type edge indexes keyed by relation. Listeners observe
//! every mutation; the listener list is snapshot before notification so a
//! listener may mutate the graph while being notified.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;
use tyck_common::{EdgeId, TypeHandle};

use crate::edge::{EdgeKind, TypeEdge};
use crate::node::TypeData;

/// Observer of graph mutations.
///
/// Notifications are delivered in listener registration order. Mutations a
/// listener performs during notification are appended to the event
/// sequence; there is no re-entry protection.
pub trait GraphListener {
    fn on_type_added(&self, _graph: &TypeGraph, _handle: TypeHandle) {}
    fn on_type_removed(&self, _graph: &TypeGraph, _handle: TypeHandle) {}
    fn on_edge_added(&self, _graph: &TypeGraph, _edge: &Rc<TypeEdge>) {}
    fn on_edge_removed(&self, _graph: &TypeGraph, _edge: &Rc<TypeEdge>) {}
}

type EdgeList = SmallVec<[EdgeId; 4]>;

/// The type graph.
pub struct TypeGraph {
    types: RefCell<Vec<Option<Rc<TypeData>>>>,
    /// identifier -> handle, in registration order.
    identifiers: RefCell<IndexMap<String, TypeHandle>>,
    edges: RefCell<Vec<Option<Rc<TypeEdge>>>>,
    outgoing: RefCell<FxHashMap<TypeHandle, EdgeList>>,
    incoming: RefCell<FxHashMap<TypeHandle, EdgeList>>,
    listeners: RefCell<Vec<Rc<dyn GraphListener>>>,
}

impl TypeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: RefCell::new(Vec::new()),
            identifiers: RefCell::new(IndexMap::new()),
            edges: RefCell::new(Vec::new()),
            outgoing: RefCell::new(FxHashMap::default()),
            incoming: RefCell::new(FxHashMap::default()),
            listeners: RefCell::new(Vec::new()),
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Put a node into the arena without registering it.
    ///
    /// The node stays invisible to `get_type` / `all_registered` until
    /// `register_type` assigns its identifier; this is the home of types
    /// still waiting for their dependencies.
    pub fn alloc_type(&self, data: TypeData) -> TypeHandle {
        let mut types = self.types.borrow_mut();
        let handle = TypeHandle(u32::try_from(types.len()).unwrap_or(u32::MAX));
        types.push(Some(Rc::new(data)));
        handle
    }

    /// Register an allocated node under its computed identifier and notify
    /// listeners.
    ///
    /// Panics if another type already owns the identifier; callers must run
    /// the initializer dedup check first.
    pub fn register_type(&self, handle: TypeHandle, identifier: String) {
        let data = self
            .node(handle)
            .unwrap_or_else(|| panic!("register_type: no node for {handle:?}"));
        data.set_identifier(identifier.clone());
        {
            let mut identifiers = self.identifiers.borrow_mut();
            if let Some(existing) = identifiers.get(&identifier) {
                panic!(
                    "two types collide on identifier {identifier:?}: {existing:?} and {handle:?}"
                );
            }
            identifiers.insert(identifier.clone(), handle);
        }
        trace!(?handle, %identifier, "type registered");
        for listener in self.snapshot_listeners() {
            listener.on_type_added(self, handle);
        }
    }

    /// Remove a node: detach its edges, drop its identifier, tombstone the
    /// arena slot, and notify listeners.
    pub fn remove_type(&self, handle: TypeHandle) {
        let Some(data) = self.node(handle) else {
            return;
        };
        let touching: Vec<EdgeId> = {
            let outgoing = self.outgoing.borrow();
            let incoming = self.incoming.borrow();
            outgoing
                .get(&handle)
                .into_iter()
                .chain(incoming.get(&handle))
                .flatten()
                .copied()
                .collect()
        };
        for edge_id in touching {
            self.remove_edge(edge_id);
        }
        if let Some(identifier) = data.identifier() {
            self.identifiers.borrow_mut().shift_remove(&identifier);
        }
        self.types.borrow_mut()[handle.index()] = None;
        trace!(?handle, "type removed");
        for listener in self.snapshot_listeners() {
            listener.on_type_removed(self, handle);
        }
    }

    /// Look up a registered type by identifier.
    #[must_use]
    pub fn get_type(&self, identifier: &str) -> Option<TypeHandle> {
        self.identifiers.borrow().get(identifier).copied()
    }

    /// The node behind a handle, or `None` for tombstoned slots.
    #[must_use]
    pub fn node(&self, handle: TypeHandle) -> Option<Rc<TypeData>> {
        self.types.borrow().get(handle.index()).cloned().flatten()
    }

    /// All registered types, in registration order.
    #[must_use]
    pub fn all_registered(&self) -> Vec<TypeHandle> {
        self.identifiers.borrow().values().copied().collect()
    }

    /// Arena length, for sizing dense visited sets.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.types.borrow().len()
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// The edge between two types on a relation, if present.
    ///
    /// Bidirectional relations match either orientation.
    #[must_use]
    pub fn find_edge(
        &self,
        from: TypeHandle,
        to: TypeHandle,
        relation: EdgeKind,
    ) -> Option<Rc<TypeEdge>> {
        let edges = self.edges.borrow();
        let outgoing = self.outgoing.borrow();
        let scan = |a: TypeHandle, b: TypeHandle| {
            outgoing.get(&a).into_iter().flatten().find_map(|id| {
                let edge = edges.get(id.index())?.as_ref()?;
                (edge.relation == relation && edge.to == b).then(|| Rc::clone(edge))
            })
        };
        scan(from, to).or_else(|| {
            matches!(
                relation.direction(),
                crate::edge::EdgeDirection::Bidirectional
            )
            .then(|| scan(to, from))
            .flatten()
        })
    }

    /// Get or create the edge between two types on a relation.
    ///
    /// Idempotent: a second call for the same pair returns the existing
    /// edge, so duplicate marks never produce duplicate edges.
    pub fn ensure_edge(&self, from: TypeHandle, to: TypeHandle, relation: EdgeKind) -> Rc<TypeEdge> {
        if let Some(existing) = self.find_edge(from, to, relation) {
            return existing;
        }
        let edge = Rc::new(TypeEdge::new(from, to, relation));
        let edge_id = {
            let mut edges = self.edges.borrow_mut();
            let id = EdgeId(u32::try_from(edges.len()).unwrap_or(u32::MAX));
            edges.push(Some(Rc::clone(&edge)));
            id
        };
        self.outgoing
            .borrow_mut()
            .entry(from)
            .or_default()
            .push(edge_id);
        self.incoming
            .borrow_mut()
            .entry(to)
            .or_default()
            .push(edge_id);
        trace!(?from, ?to, ?relation, "edge added");
        for listener in self.snapshot_listeners() {
            listener.on_edge_added(self, &edge);
        }
        edge
    }

    /// Remove an edge and notify listeners.
    pub fn remove_edge(&self, edge_id: EdgeId) {
        let Some(edge) = self.edges.borrow_mut().get_mut(edge_id.index()).and_then(Option::take)
        else {
            return;
        };
        if let Some(list) = self.outgoing.borrow_mut().get_mut(&edge.from) {
            list.retain(|id| *id != edge_id);
        }
        if let Some(list) = self.incoming.borrow_mut().get_mut(&edge.to) {
            list.retain(|id| *id != edge_id);
        }
        for listener in self.snapshot_listeners() {
            listener.on_edge_removed(self, &edge);
        }
    }

    /// Remove the edge between two types on a relation, if present.
    pub fn remove_edge_between(&self, from: TypeHandle, to: TypeHandle, relation: EdgeKind) {
        let found = {
            let edges = self.edges.borrow();
            let outgoing = self.outgoing.borrow();
            let scan = |a: TypeHandle, b: TypeHandle| {
                outgoing.get(&a).into_iter().flatten().copied().find(|id| {
                    edges
                        .get(id.index())
                        .and_then(Option::as_ref)
                        .is_some_and(|e| e.relation == relation && e.to == b)
                })
            };
            scan(from, to).or_else(|| {
                matches!(
                    relation.direction(),
                    crate::edge::EdgeDirection::Bidirectional
                )
                .then(|| scan(to, from))
                .flatten()
            })
        };
        if let Some(edge_id) = found {
            self.remove_edge(edge_id);
        }
    }

    /// Outgoing edges of a type.
    #[must_use]
    pub fn outgoing_edges(&self, handle: TypeHandle) -> Vec<Rc<TypeEdge>> {
        self.collect_edges(&self.outgoing, handle)
    }

    /// Incoming edges of a type.
    #[must_use]
    pub fn incoming_edges(&self, handle: TypeHandle) -> Vec<Rc<TypeEdge>> {
        self.collect_edges(&self.incoming, handle)
    }

    fn collect_edges(
        &self,
        index: &RefCell<FxHashMap<TypeHandle, EdgeList>>,
        handle: TypeHandle,
    ) -> Vec<Rc<TypeEdge>> {
        let edges = self.edges.borrow();
        index
            .borrow()
            .get(&handle)
            .into_iter()
            .flatten()
            .filter_map(|id| edges.get(id.index()).cloned().flatten())
            .collect()
    }

    /// Reset every memoized (non-explicit) edge to `Unknown`.
    ///
    /// Called when an explicit mark changes: relations are live, so every
    /// cached result may now be stale. Explicit edges are facts and stay.
    pub fn reset_computed_caches(&self) {
        let edges = self.edges.borrow();
        for edge in edges.iter().flatten() {
            if !edge.is_explicit() {
                edge.set_caching(crate::edge::EdgeCacheState::Unknown);
            }
        }
        trace!("computed relation caches reset");
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Register a listener; with `replay`, `on_type_added` fires immediately
    /// for every already-registered type.
    pub fn add_listener(&self, listener: Rc<dyn GraphListener>, replay: bool) {
        self.listeners.borrow_mut().push(Rc::clone(&listener));
        if replay {
            for handle in self.all_registered() {
                listener.on_type_added(self, handle);
            }
        }
    }

    /// Deregister a listener by identity.
    pub fn remove_listener(&self, listener: &Rc<dyn GraphListener>) {
        self.listeners
            .borrow_mut()
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    fn snapshot_listeners(&self) -> Vec<Rc<dyn GraphListener>> {
        self.listeners.borrow().clone()
    }
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}
