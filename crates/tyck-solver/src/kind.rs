//! The kind contract and registry.
//!
//! A kind is a family of types: it owns identifier calculation, the
//! lifecycle preconditions, and the structural equality and subtyping
//! algorithms for types of that family. Kind objects are shared (`Rc`) and
//! looked up by name; registering a different object under a taken name is
//! a programmer error.

use std::rc::Rc;

use std::cell::RefCell;

use indexmap::IndexMap;
use tyck_common::{Problem, TypeHandle};
use tyck_graph::{TypeData, TypeRef, TypeSelector};

use crate::system::TypeSystem;

/// Shallow-clone a selector for identity queries (`get`).
///
/// Thunks cannot be cloned; they degrade to a selector that resolves to
/// nothing, so a `get` with a thunk simply finds no type.
pub(crate) fn clone_selector(selector: &TypeSelector) -> TypeSelector {
    match selector {
        TypeSelector::Direct(h) => TypeSelector::Direct(*h),
        TypeSelector::ById(id) => TypeSelector::ById(id.clone()),
        TypeSelector::Reference(r) => TypeSelector::Reference(std::rc::Rc::clone(r)),
        TypeSelector::Initializer(i) => TypeSelector::Initializer(std::rc::Rc::clone(i)),
        TypeSelector::FromLanguageNode(n) => TypeSelector::FromLanguageNode(*n),
        TypeSelector::Thunk(_) => TypeSelector::ById(String::new()),
    }
}

/// How a component type pair is compared during a subtype check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubTypeCheckingStrategy {
    EqualType,
    AssignableType,
    SubType,
}

impl SubTypeCheckingStrategy {
    /// Run this strategy for the pair `(source, target)`.
    #[must_use]
    pub fn check(self, ts: &TypeSystem, source: TypeHandle, target: TypeHandle) -> bool {
        match self {
            Self::EqualType => ts.are_equal(source, target),
            Self::AssignableType => ts.is_assignable(source, target),
            Self::SubType => ts.is_sub_type(source, target),
        }
    }
}

/// A family of types.
pub trait Kind {
    /// The kind name; also the tag stored in each type's payload.
    fn name(&self) -> &str;

    /// The identifier of a type of this kind, or `None` while a reference
    /// the identifier depends on is unresolved.
    fn calculate_identifier(&self, ts: &TypeSystem, data: &TypeData) -> Option<String>;

    /// References that must resolve before the type may become
    /// `Identifiable`.
    fn identifiability_refs(&self, data: &TypeData) -> Vec<TypeRef>;

    /// References that must resolve before the type may become `Completed`.
    /// Defaults to none (identifiable implies completed).
    fn completion_refs(&self, _data: &TypeData) -> Vec<TypeRef> {
        Vec::new()
    }

    /// Structural equality of two types of this kind; empty means equal.
    fn analyze_equality(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem>;

    /// Structural subtyping of two types of this kind; empty means
    /// `sub <: sup`. Reflexivity, explicit marks, and top/bottom axioms are
    /// already handled by the subtype service.
    fn analyze_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem>;

    /// User-visible rendering of a type of this kind.
    fn user_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String;

    /// Hook run when a type of this kind is registered in the graph.
    fn on_finalized(&self, _ts: &TypeSystem, _handle: TypeHandle) {}

    /// Hook run when a type of this kind reaches `Completed`.
    fn on_completed(&self, _ts: &TypeSystem, _handle: TypeHandle) {}
}

/// Registry of kind objects, keyed by kind name.
pub struct KindRegistry {
    kinds: RefCell<IndexMap<String, Rc<dyn Kind>>>,
}

impl KindRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: RefCell::new(IndexMap::new()),
        }
    }

    /// Register a kind object. Re-registering the same object is a no-op;
    /// a different object under the same name panics.
    pub fn register(&self, kind: Rc<dyn Kind>) {
        let name = kind.name().to_string();
        let mut kinds = self.kinds.borrow_mut();
        if let Some(existing) = kinds.get(&name) {
            assert!(
                Rc::ptr_eq(existing, &kind),
                "a different kind is already registered under the name {name:?}"
            );
            return;
        }
        kinds.insert(name, kind);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<dyn Kind>> {
        self.kinds.borrow().get(name).cloned()
    }

    /// The kind of a type node; panics when the payload tag was never
    /// registered (engine construction registers all default kinds).
    #[must_use]
    pub fn kind_of(&self, data: &TypeData) -> Rc<dyn Kind> {
        self.get(data.kind_name())
            .unwrap_or_else(|| panic!("no kind registered under {:?}", data.kind_name()))
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}
