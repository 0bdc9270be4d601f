//! The recursive property value of custom types.
//!
//! A custom type's specification is an open bag of named properties whose
//! values may nest: primitives, type references, lists, sets, and maps.
//! Every nested `Type` reference is an identifiability precondition of the
//! owning type, which is what enables reciprocal delays (a type referring
//! to another type that does not exist yet).

use indexmap::IndexMap;

use crate::reference::TypeRef;

/// One property value of a custom type.
#[derive(Clone, Debug)]
pub enum CustomProperty {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A component type; registered as a lifecycle precondition.
    Type(TypeRef),
    List(Vec<CustomProperty>),
    /// Order-insensitive collection; identifier calculation sorts it.
    Set(Vec<CustomProperty>),
    Map(IndexMap<String, CustomProperty>),
}

impl CustomProperty {
    /// Collect every type reference nested anywhere in this value.
    pub fn collect_refs(&self, out: &mut Vec<TypeRef>) {
        match self {
            Self::Str(_) | Self::Int(_) | Self::Float(_) | Self::Bool(_) => {}
            Self::Type(r) => out.push(r.clone()),
            Self::List(items) | Self::Set(items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            Self::Map(entries) => {
                for value in entries.values() {
                    value.collect_refs(out);
                }
            }
        }
    }
}
