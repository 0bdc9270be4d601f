//! The custom kind.
//!
//! Hosts define their own type families by registering a custom kind: an
//! identifier formula, optional equality and subtyping algorithms, and an
//! open property bag per type. Every type reference nested in the
//! properties becomes an identifiability precondition, which is what makes
//! reciprocal delays work (a type referring to a type that does not exist
//! yet).

use std::rc::Rc;

use indexmap::IndexMap;
use tyck_common::{Problem, SubTypeProblem, TypeEqualityProblem, TypeHandle};
use tyck_graph::{CustomProperty, CustomTypeData, TypeData, TypePayload, TypeRef};

use crate::initializer::TypeInitializer;
use crate::kind::Kind;
use crate::system::TypeSystem;

/// Identifier formula for types of a custom kind.
pub type IdentifierFn = Box<dyn Fn(&TypeSystem, &CustomTypeData) -> Option<String>>;
/// User-defined relation algorithm; empty result means the relation holds.
pub type RelationFn = Box<dyn Fn(&TypeSystem, TypeHandle, TypeHandle) -> Vec<Problem>>;
/// User-defined rendering of a custom type.
pub type UserNameFn = Box<dyn Fn(&TypeSystem, &CustomTypeData) -> String>;

/// Configuration of one custom kind.
pub struct CustomKindConfig {
    /// Kind name; types of this kind carry it as their tag.
    pub name: String,
    /// Identifier formula; the default derives one from the kind name, the
    /// type name, and a canonical walk over the properties.
    pub calculate_identifier: Option<IdentifierFn>,
    /// Equality algorithm; default is reflexive only.
    pub analyze_equality: Option<RelationFn>,
    /// Subtyping algorithm; default is reflexive only.
    pub analyze_sub_type: Option<RelationFn>,
    /// Rendering; default is the type name or the identifier.
    pub user_name: Option<UserNameFn>,
}

impl CustomKindConfig {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calculate_identifier: None,
            analyze_equality: None,
            analyze_sub_type: None,
            user_name: None,
        }
    }
}

/// Details of one custom type.
pub struct CustomDetails {
    pub name: Option<String>,
    pub properties: IndexMap<String, CustomProperty>,
}

pub struct CustomKind {
    pub config: CustomKindConfig,
}

impl CustomKind {
    #[must_use]
    pub fn new(config: CustomKindConfig) -> Self {
        Self { config }
    }

    /// Create a type of this kind; property references may point at types
    /// that do not exist yet.
    pub fn create(self: &Rc<Self>, ts: &TypeSystem, details: CustomDetails) -> Rc<TypeInitializer> {
        let data = TypeData::new(TypePayload::Custom(CustomTypeData {
            kind_name: self.config.name.clone(),
            name: details.name,
            properties: details.properties,
        }));
        ts.submit_initializer(Rc::clone(self) as Rc<dyn Kind>, data)
    }

    /// The existing type of this kind for these details, if any.
    #[must_use]
    pub fn get(&self, ts: &TypeSystem, details: &CustomDetails) -> Option<TypeHandle> {
        let data = TypeData::new(TypePayload::Custom(CustomTypeData {
            kind_name: self.config.name.clone(),
            name: details.name.clone(),
            properties: details.properties.clone(),
        }));
        for reference in data.all_refs() {
            let _ = reference.try_resolve(ts);
        }
        let identifier = self.calculate_identifier(ts, &data)?;
        ts.graph().get_type(&identifier)
    }

    /// Canonical text of a property value; `None` while a nested type
    /// reference is unresolved.
    fn property_text(ts: &TypeSystem, property: &CustomProperty) -> Option<String> {
        match property {
            CustomProperty::Str(s) => Some(format!("{s:?}")),
            CustomProperty::Int(i) => Some(i.to_string()),
            CustomProperty::Float(f) => Some(f.to_string()),
            CustomProperty::Bool(b) => Some(b.to_string()),
            CustomProperty::Type(r) => {
                let handle = r.resolved()?;
                ts.graph().node(handle)?.identifier()
            }
            CustomProperty::List(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(Self::property_text(ts, item)?);
                }
                Some(format!("[{}]", parts.join(",")))
            }
            CustomProperty::Set(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(Self::property_text(ts, item)?);
                }
                // Sets are order-insensitive.
                parts.sort();
                Some(format!("{{{}}}", parts.join(",")))
            }
            CustomProperty::Map(entries) => {
                let mut parts = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    parts.push(format!("{key}:{}", Self::property_text(ts, value)?));
                }
                parts.sort();
                Some(format!("{{{}}}", parts.join(",")))
            }
        }
    }
}

impl Kind for CustomKind {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn calculate_identifier(&self, ts: &TypeSystem, data: &TypeData) -> Option<String> {
        let TypePayload::Custom(c) = data.payload() else {
            return None;
        };
        if let Some(formula) = &self.config.calculate_identifier {
            return formula(ts, c);
        }
        let tail = match &c.name {
            Some(name) => name.clone(),
            None => {
                let mut parts = Vec::with_capacity(c.properties.len());
                for (key, value) in &c.properties {
                    parts.push(format!("{key}={}", Self::property_text(ts, value)?));
                }
                parts.join(";")
            }
        };
        Some(format!("custom-{}-{tail}", self.config.name))
    }

    fn identifiability_refs(&self, data: &TypeData) -> Vec<TypeRef> {
        data.all_refs()
    }

    fn analyze_equality(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
        if let Some(algorithm) = &self.config.analyze_equality {
            return algorithm(ts, a, b);
        }
        vec![Problem::TypeEquality(TypeEqualityProblem {
            first: a,
            second: b,
            sub_problems: Vec::new(),
        })]
    }

    fn analyze_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
        if let Some(algorithm) = &self.config.analyze_sub_type {
            return algorithm(ts, sub, sup);
        }
        vec![Problem::SubType(SubTypeProblem {
            sub,
            sup,
            sub_problems: Vec::new(),
        })]
    }

    fn user_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String {
        let Some(data) = ts.graph().node(handle) else {
            return "<removed>".to_string();
        };
        let TypePayload::Custom(c) = data.payload() else {
            return "<custom>".to_string();
        };
        if let Some(render) = &self.config.user_name {
            return render(ts, c);
        }
        c.name
            .clone()
            .or_else(|| data.identifier())
            .unwrap_or_else(|| self.config.name.clone())
    }
}
