//! Deferred type construction.
//!
//! A factory that cannot finish a type immediately (a component reference
//! is unresolved) hands out a `TypeInitializer`. The resolution sweeper
//! retries it whenever the environment changes; on success the candidate
//! either joins the graph or, when a type with the same identifier already
//! exists, is disposed in favor of the existing one (dedup).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;
use tyck_common::TypeHandle;
use tyck_graph::{InitializerHandle, TypeInitializationState};

use crate::kind::Kind;
use crate::system::TypeSystem;

/// Callback invoked once the final type is known.
pub type FinishListener = Box<dyn Fn(&TypeSystem, TypeHandle)>;

/// A deferred construction of one type.
pub struct TypeInitializer {
    kind: Rc<dyn Kind>,
    /// The type under construction; cleared when disposed by dedup.
    candidate: Cell<Option<TypeHandle>>,
    final_type: Cell<Option<TypeHandle>>,
    listeners: RefCell<Vec<FinishListener>>,
}

impl InitializerHandle for TypeInitializer {
    fn final_type(&self) -> Option<TypeHandle> {
        self.final_type.get()
    }

    fn placeholder(&self) -> Option<TypeHandle> {
        self.candidate.get()
    }
}

impl TypeInitializer {
    #[must_use]
    pub fn new(kind: Rc<dyn Kind>, candidate: TypeHandle) -> Rc<Self> {
        Rc::new(Self {
            kind,
            candidate: Cell::new(Some(candidate)),
            final_type: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// The deduplicated final type, once construction finished.
    #[must_use]
    pub fn get_type_final(&self) -> Option<TypeHandle> {
        self.final_type.get()
    }

    /// Register a callback for the final type; runs immediately when the
    /// initializer already finished.
    pub fn on_finished(&self, ts: &TypeSystem, listener: FinishListener) {
        if let Some(handle) = self.final_type.get() {
            listener(ts, handle);
        } else {
            self.listeners.borrow_mut().push(listener);
        }
    }

    /// Whether nothing remains to be done for this initializer.
    #[must_use]
    pub fn is_settled(&self, ts: &TypeSystem) -> bool {
        match self.final_type.get() {
            None => false,
            Some(handle) => ts
                .graph()
                .node(handle)
                .is_none_or(|data| data.state() == TypeInitializationState::Completed),
        }
    }

    /// Advance as far as the currently-resolvable references allow.
    ///
    /// Returns `true` when any progress was made (another pending
    /// initializer may now be resolvable).
    pub fn step(&self, ts: &TypeSystem) -> bool {
        if self.final_type.get().is_none() {
            self.try_finish(ts)
        } else {
            self.try_complete(ts)
        }
    }

    /// Attempt the `Invalid -> Identifiable` transition: all identifier
    /// preconditions resolved, identifier computed, dedup checked, graph
    /// registration done.
    fn try_finish(&self, ts: &TypeSystem) -> bool {
        let Some(candidate) = self.candidate.get() else {
            return false;
        };
        let Some(data) = ts.graph().node(candidate) else {
            return false;
        };
        for reference in self.kind.identifiability_refs(&data) {
            if reference.try_resolve(ts).is_none() {
                return false;
            }
        }
        let Some(identifier) = self.kind.calculate_identifier(ts, &data) else {
            return false;
        };

        if let Some(existing) = ts.graph().get_type(&identifier) {
            let existing_data = ts
                .graph()
                .node(existing)
                .expect("registered types have live nodes");
            assert!(
                existing_data.kind_name() == data.kind_name(),
                "two initializers collide on identifier {identifier:?} with different kinds"
            );
            // Dedup: dispose the fresh candidate, adopt the existing type.
            trace!(%identifier, ?existing, "initializer deduplicated");
            ts.graph().remove_type(candidate);
            self.candidate.set(None);
            self.settle(ts, existing);
            return true;
        }

        data.set_state(TypeInitializationState::Identifiable);
        ts.graph().register_type(candidate, identifier);
        self.settle(ts, candidate);
        self.try_complete(ts);
        true
    }

    /// Attempt the `Identifiable -> Completed` transition.
    fn try_complete(&self, ts: &TypeSystem) -> bool {
        let Some(handle) = self.final_type.get() else {
            return false;
        };
        let Some(data) = ts.graph().node(handle) else {
            return false;
        };
        if data.state() != TypeInitializationState::Identifiable {
            return false;
        }
        for reference in self.kind.completion_refs(&data) {
            if reference.try_resolve(ts).is_none() {
                return false;
            }
        }
        data.set_state(TypeInitializationState::Completed);
        trace!(?handle, "type completed");
        self.kind.on_completed(ts, handle);
        true
    }

    fn settle(&self, ts: &TypeSystem, handle: TypeHandle) {
        self.final_type.set(Some(handle));
        self.kind.on_finalized(ts, handle);
        // Snapshot before notifying: a listener may register further
        // listeners or types while running.
        let listeners: Vec<FinishListener> = self.listeners.borrow_mut().drain(..).collect();
        for listener in listeners {
            listener(ts, handle);
        }
    }
}
