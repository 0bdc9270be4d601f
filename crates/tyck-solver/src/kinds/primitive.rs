//! The primitive kind.
//!
//! A primitive is identified by its name; distinct names are distinct
//! types. Relationships beyond reflexivity come only from explicit marks
//! (subtype edges, conversions, equality).

use tyck_common::{Problem, SubTypeProblem, TypeEqualityProblem, TypeHandle};
use tyck_graph::{PrimitiveTypeData, TypeData, TypeInitializationState, TypePayload, TypeRef};

use crate::kind::Kind;
use crate::system::TypeSystem;

pub const PRIMITIVE_KIND_NAME: &str = "primitive";

pub struct PrimitiveKind;

impl PrimitiveKind {
    /// Create the primitive named `name`.
    ///
    /// Creating a name that already exists is a programmer error.
    pub fn create(ts: &TypeSystem, name: &str) -> TypeHandle {
        assert!(
            Self::get(ts, name).is_none(),
            "a primitive named {name:?} already exists"
        );
        let handle = ts.graph().alloc_type(TypeData::new(TypePayload::Primitive(
            PrimitiveTypeData {
                name: name.to_string(),
            },
        )));
        let data = ts.graph().node(handle).expect("node just allocated");
        data.set_state(TypeInitializationState::Identifiable);
        ts.graph().register_type(handle, name.to_string());
        data.set_state(TypeInitializationState::Completed);
        ts.after_type_registered();
        handle
    }

    /// The primitive named `name`, if it exists.
    #[must_use]
    pub fn get(ts: &TypeSystem, name: &str) -> Option<TypeHandle> {
        let handle = ts.graph().get_type(name)?;
        let data = ts.graph().node(handle)?;
        matches!(data.payload(), TypePayload::Primitive(_)).then_some(handle)
    }
}

impl Kind for PrimitiveKind {
    fn name(&self) -> &str {
        PRIMITIVE_KIND_NAME
    }

    fn calculate_identifier(&self, _ts: &TypeSystem, data: &TypeData) -> Option<String> {
        match data.payload() {
            TypePayload::Primitive(p) => Some(p.name.clone()),
            _ => None,
        }
    }

    fn identifiability_refs(&self, _data: &TypeData) -> Vec<TypeRef> {
        Vec::new()
    }

    fn analyze_equality(&self, _ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
        // Reflexive equality is handled by the service; two distinct
        // primitive types are never structurally equal.
        vec![Problem::TypeEquality(TypeEqualityProblem {
            first: a,
            second: b,
            sub_problems: Vec::new(),
        })]
    }

    fn analyze_sub_type(&self, _ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
        // No structural subtyping between primitives; explicit marks were
        // already consulted by the service.
        vec![Problem::SubType(SubTypeProblem {
            sub,
            sup,
            sub_problems: Vec::new(),
        })]
    }

    fn user_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String {
        match ts.graph().node(handle).map(|d| match d.payload() {
            TypePayload::Primitive(p) => p.name.clone(),
            _ => String::new(),
        }) {
            Some(name) => name,
            None => "<removed>".to_string(),
        }
    }
}
