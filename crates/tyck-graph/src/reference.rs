//! Lazy type references.
//!
//! A `TypeReference` designates a type that may not exist yet. The selector
//! says how to find it; resolution is retried whenever the environment
//! changes (a type arrives in the graph, an inference rule is registered)
//! until it sticks. When the resolved type is later removed, the reference
//! is invalidated and resolution starts over.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tyck_common::{NodeHandle, TypeHandle};

/// Shared handle to a lazy reference.
pub type TypeRef = Rc<TypeReference>;

/// What a reference resolves against.
///
/// The solver implements this over the graph and the inference service; the
/// indirection keeps this crate free of inference logic.
pub trait ResolutionEnv {
    /// Registered type with the given identifier.
    fn type_by_identifier(&self, identifier: &str) -> Option<TypeHandle>;

    /// Infer the type of a host language node, if currently inferable.
    fn infer_from_node(&self, node: NodeHandle) -> Option<TypeHandle>;

    /// Whether a handle may be exposed as a reference target. Types in
    /// state `Invalid` (and tombstoned slots) are skipped.
    fn is_reference_target(&self, handle: TypeHandle) -> bool;
}

/// View of a type initializer, as seen by a selector.
pub trait InitializerHandle {
    /// The deduplicated final type, once the initializer finished.
    fn final_type(&self) -> Option<TypeHandle>;

    /// The type under construction, usable as a placeholder target while
    /// the initializer is still waiting (enables self-referential types).
    fn placeholder(&self) -> Option<TypeHandle>;
}

/// A value that designates a type, possibly indirectly.
pub enum TypeSelector {
    /// The type itself.
    Direct(TypeHandle),
    /// A type identifier to look up in the graph.
    ById(String),
    /// A deferred construction; resolves to its final (or placeholder) type.
    Initializer(Rc<dyn InitializerHandle>),
    /// Another reference; delegates.
    Reference(TypeRef),
    /// A deferred selector; evaluated at most once.
    Thunk(Box<dyn Fn() -> TypeSelector>),
    /// A host language node whose inferred type is wanted.
    FromLanguageNode(NodeHandle),
}

impl fmt::Debug for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(h) => f.debug_tuple("Direct").field(h).finish(),
            Self::ById(id) => f.debug_tuple("ById").field(id).finish(),
            Self::Initializer(_) => f.write_str("Initializer(..)"),
            Self::Reference(_) => f.write_str("Reference(..)"),
            Self::Thunk(_) => f.write_str("Thunk(..)"),
            Self::FromLanguageNode(n) => f.debug_tuple("FromLanguageNode").field(n).finish(),
        }
    }
}

/// Observer of one reference's resolution state.
pub trait ReferenceListener {
    fn on_resolved(&self, reference: &TypeReference, target: TypeHandle);
    fn on_invalidated(&self, reference: &TypeReference);
}

/// A lazy handle to a type specified by a selector.
pub struct TypeReference {
    selector: RefCell<TypeSelector>,
    resolved: Cell<Option<TypeHandle>>,
    listeners: RefCell<Vec<Rc<dyn ReferenceListener>>>,
}

impl fmt::Debug for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeReference")
            .field("selector", &self.selector.borrow())
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

impl TypeReference {
    #[must_use]
    pub fn new(selector: TypeSelector) -> TypeRef {
        Rc::new(Self {
            selector: RefCell::new(selector),
            resolved: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// The resolved target, if resolution already succeeded.
    #[inline]
    #[must_use]
    pub fn resolved(&self) -> Option<TypeHandle> {
        self.resolved.get()
    }

    /// Try to resolve the selector against `env`.
    ///
    /// Selector cases are tried exactly once per call, in the fixed order:
    /// direct type, identifier lookup, initializer, delegated reference,
    /// thunk (evaluated then recursed), language node inference. Successful
    /// resolution is sticky and notifies listeners.
    pub fn try_resolve(&self, env: &dyn ResolutionEnv) -> Option<TypeHandle> {
        if let Some(handle) = self.resolved.get() {
            return Some(handle);
        }
        let found = self.resolve_selector(env)?;
        if !env.is_reference_target(found) {
            return None;
        }
        self.resolved.set(Some(found));
        for listener in self.listeners.borrow().clone() {
            listener.on_resolved(self, found);
        }
        Some(found)
    }

    fn resolve_selector(&self, env: &dyn ResolutionEnv) -> Option<TypeHandle> {
        // A thunk is replaced by its result so it runs at most once.
        let evaluated = match &*self.selector.borrow() {
            TypeSelector::Thunk(thunk) => Some(thunk()),
            _ => None,
        };
        if let Some(selector) = evaluated {
            *self.selector.borrow_mut() = selector;
            return self.resolve_selector(env);
        }
        match &*self.selector.borrow() {
            TypeSelector::Direct(handle) => Some(*handle),
            TypeSelector::ById(identifier) => env.type_by_identifier(identifier),
            TypeSelector::Initializer(initializer) => {
                initializer.final_type().or_else(|| initializer.placeholder())
            }
            TypeSelector::Reference(inner) => inner.try_resolve(env),
            TypeSelector::Thunk(_) => unreachable!("thunk replaced above"),
            TypeSelector::FromLanguageNode(node) => env.infer_from_node(*node),
        }
    }

    /// Drop the resolution (the target left the graph) and notify
    /// listeners; the next `try_resolve` starts over.
    pub fn invalidate(&self) {
        if self.resolved.take().is_some() {
            for listener in self.listeners.borrow().clone() {
                listener.on_invalidated(self);
            }
        }
    }

    pub fn add_listener(&self, listener: Rc<dyn ReferenceListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn remove_listener(&self, listener: &Rc<dyn ReferenceListener>) {
        self.listeners
            .borrow_mut()
            .retain(|l| !Rc::ptr_eq(l, listener));
    }
}
