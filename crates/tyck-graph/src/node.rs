//! Type nodes and their kind payloads.
//!
//! A `TypeData` is one semantic type: a tagged payload (one variant per
//! kind), the initialization state, and the identifier assigned when the
//! type becomes identifiable. Payloads hold `TypeRef`s for every component
//! type, so a type can be declared before its dependencies exist.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;

use crate::property::CustomProperty;
use crate::reference::TypeRef;

/// Upper multiplicity bound standing for "unlimited".
pub const UNLIMITED: i64 = -1;

/// Lifecycle state of a type.
///
/// Created `Invalid` by a kind factory; `Identifiable` once every
/// identifier-relevant reference resolved (the identifier is computed and
/// the type joins the graph); `Completed` once the remaining references
/// resolved; back to `Invalid` when a type it depends on is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeInitializationState {
    Invalid,
    Identifiable,
    Completed,
}

/// A type node.
#[derive(Debug)]
pub struct TypeData {
    payload: TypePayload,
    state: Cell<TypeInitializationState>,
    identifier: RefCell<Option<String>>,
}

impl TypeData {
    /// Create a new node in state `Invalid`, without an identifier.
    #[must_use]
    pub fn new(payload: TypePayload) -> Self {
        Self {
            payload,
            state: Cell::new(TypeInitializationState::Invalid),
            identifier: RefCell::new(None),
        }
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &TypePayload {
        &self.payload
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> TypeInitializationState {
        self.state.get()
    }

    pub fn set_state(&self, state: TypeInitializationState) {
        self.state.set(state);
    }

    /// The unique identifier, present from `Identifiable` onwards.
    #[must_use]
    pub fn identifier(&self) -> Option<String> {
        self.identifier.borrow().clone()
    }

    pub fn set_identifier(&self, identifier: String) {
        *self.identifier.borrow_mut() = Some(identifier);
    }

    /// The kind tag this node belongs to.
    #[must_use]
    pub fn kind_name(&self) -> &str {
        self.payload.kind_name()
    }

    /// Every component reference held by the payload.
    #[must_use]
    pub fn all_refs(&self) -> Vec<TypeRef> {
        self.payload.all_refs()
    }
}

/// Kind-specific payload of a type node.
///
/// One variant per kind; the solver dispatches exhaustively on the tag.
#[derive(Debug)]
pub enum TypePayload {
    Primitive(PrimitiveTypeData),
    Function(FunctionTypeData),
    Class(ClassTypeData),
    FixedParameters(FixedParametersTypeData),
    Multiplicity(MultiplicityTypeData),
    Top(SingletonTypeData),
    Bottom(SingletonTypeData),
    Custom(CustomTypeData),
}

impl TypePayload {
    /// The kind tag of this payload.
    #[must_use]
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Function(_) => "function",
            Self::Class(_) => "class",
            Self::FixedParameters(_) => "fixed-parameters",
            Self::Multiplicity(_) => "multiplicity",
            Self::Top(_) => "top",
            Self::Bottom(_) => "bottom",
            Self::Custom(data) => &data.kind_name,
        }
    }

    /// Every component reference held by this payload.
    #[must_use]
    pub fn all_refs(&self) -> Vec<TypeRef> {
        let mut refs = Vec::new();
        match self {
            Self::Primitive(_) | Self::Top(_) | Self::Bottom(_) => {}
            Self::Function(data) => {
                for param in &data.inputs {
                    refs.push(param.ty.clone());
                }
                if let Some(output) = &data.output {
                    refs.push(output.ty.clone());
                }
            }
            Self::Class(data) => {
                for field in &data.fields {
                    refs.push(field.ty.clone());
                }
                refs.extend(data.methods.iter().cloned());
                refs.extend(data.supers.iter().cloned());
            }
            Self::FixedParameters(data) => refs.extend(data.parameters.iter().cloned()),
            Self::Multiplicity(data) => refs.push(data.inner.clone()),
            Self::Custom(data) => {
                for property in data.properties.values() {
                    property.collect_refs(&mut refs);
                }
            }
        }
        refs
    }
}

/// Payload of a primitive type.
#[derive(Debug)]
pub struct PrimitiveTypeData {
    pub name: String,
}

/// A named, typed parameter of a function.
#[derive(Debug)]
pub struct ParameterData {
    pub name: String,
    pub ty: TypeRef,
}

/// Payload of a function type.
#[derive(Debug)]
pub struct FunctionTypeData {
    pub name: String,
    pub inputs: Vec<ParameterData>,
    /// `None` encodes "no usable output" (procedures).
    pub output: Option<ParameterData>,
}

/// A named, typed field of a class.
#[derive(Debug)]
pub struct FieldData {
    pub name: String,
    pub ty: TypeRef,
}

/// Payload of a class type.
#[derive(Debug)]
pub struct ClassTypeData {
    pub name: String,
    pub fields: Vec<FieldData>,
    /// Method types; each resolves to a function type.
    pub methods: Vec<TypeRef>,
    /// Declared super-classes, in declaration order.
    pub supers: Vec<TypeRef>,
}

/// Payload of a fixed-parameter generic instance (e.g. `List<string>`).
#[derive(Debug)]
pub struct FixedParametersTypeData {
    pub base_name: String,
    pub parameters: Vec<TypeRef>,
}

/// Payload of a multiplicity type (`inner[lower..upper]`).
#[derive(Debug)]
pub struct MultiplicityTypeData {
    pub inner: TypeRef,
    pub lower: i64,
    /// `UNLIMITED` means no upper bound.
    pub upper: i64,
}

/// Payload of the top or bottom singleton.
#[derive(Debug)]
pub struct SingletonTypeData {
    pub name: String,
}

/// Payload of a custom (user-defined) type.
#[derive(Debug)]
pub struct CustomTypeData {
    /// Name of the custom kind this type belongs to.
    pub kind_name: String,
    /// Optional user-visible name; the identifier is kind-defined.
    pub name: Option<String>,
    pub properties: IndexMap<String, CustomProperty>,
}
