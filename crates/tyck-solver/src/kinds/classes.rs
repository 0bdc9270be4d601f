//! The class kind.
//!
//! Classes are nominal by default: identity is the class name (behind a
//! configurable prefix) and subtyping follows the declared super-class
//! chain. In structural mode, identity and subtyping are computed from
//! fields and methods instead, independent of the class name.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use tyck_common::{
    ConflictIndex, IndexedTypeConflict, Problem, SubTypeProblem, TypeEqualityProblem, TypeHandle,
    ValueConflict,
};
use tyck_graph::{
    ClassTypeData, EdgeCacheState, EdgeKind, FieldData, TypeData, TypePayload, TypeRef,
    TypeReference, TypeSelector,
};

use crate::initializer::TypeInitializer;
use crate::kind::{Kind, SubTypeCheckingStrategy};
use crate::system::TypeSystem;

pub const CLASS_KIND_NAME: &str = "class";

/// Identity mode of the class kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassTyping {
    Nominal,
    Structural,
}

#[derive(Clone, Debug)]
pub struct ClassKindConfig {
    pub typing: ClassTyping,
    pub maximum_number_of_super_classes: usize,
    pub subtype_field_checking: SubTypeCheckingStrategy,
    pub identifier_prefix: String,
}

impl Default for ClassKindConfig {
    fn default() -> Self {
        Self {
            typing: ClassTyping::Nominal,
            maximum_number_of_super_classes: 1,
            subtype_field_checking: SubTypeCheckingStrategy::EqualType,
            identifier_prefix: "class".to_string(),
        }
    }
}

pub struct FieldDetails {
    pub name: String,
    pub ty: TypeSelector,
}

pub struct ClassDetails {
    pub name: String,
    pub fields: Vec<FieldDetails>,
    /// Method types; each selector must yield a function type.
    pub methods: Vec<TypeSelector>,
    pub super_classes: Vec<TypeSelector>,
}

pub struct ClassKind {
    pub config: ClassKindConfig,
}

impl ClassKind {
    #[must_use]
    pub fn new(config: ClassKindConfig) -> Self {
        Self { config }
    }

    /// Create a class type; supers, field types, and methods may not exist
    /// yet. Declaring more supers than configured is a programmer error.
    pub fn create(self: &Rc<Self>, ts: &TypeSystem, details: ClassDetails) -> Rc<TypeInitializer> {
        assert!(
            details.super_classes.len() <= self.config.maximum_number_of_super_classes,
            "class {:?} declares {} super-classes, the configured maximum is {}",
            details.name,
            details.super_classes.len(),
            self.config.maximum_number_of_super_classes
        );
        let data = TypeData::new(TypePayload::Class(ClassTypeData {
            name: details.name,
            fields: details
                .fields
                .into_iter()
                .map(|f| FieldData {
                    name: f.name,
                    ty: TypeReference::new(f.ty),
                })
                .collect(),
            methods: details
                .methods
                .into_iter()
                .map(TypeReference::new)
                .collect(),
            supers: details
                .super_classes
                .into_iter()
                .map(TypeReference::new)
                .collect(),
        }));
        ts.submit_initializer(Rc::clone(self) as Rc<dyn Kind>, data)
    }

    /// The existing class type for these details, if any.
    #[must_use]
    pub fn get(&self, ts: &TypeSystem, details: &ClassDetails) -> Option<TypeHandle> {
        use crate::kind::clone_selector;
        let data = TypeData::new(TypePayload::Class(ClassTypeData {
            name: details.name.clone(),
            fields: details
                .fields
                .iter()
                .map(|f| FieldData {
                    name: f.name.clone(),
                    ty: TypeReference::new(clone_selector(&f.ty)),
                })
                .collect(),
            methods: details
                .methods
                .iter()
                .map(|m| TypeReference::new(clone_selector(m)))
                .collect(),
            supers: details
                .super_classes
                .iter()
                .map(|s| TypeReference::new(clone_selector(s)))
                .collect(),
        }));
        for reference in data.all_refs() {
            let _ = reference.try_resolve(ts);
        }
        let identifier = self.calculate_identifier(ts, &data)?;
        ts.graph().get_type(&identifier)
    }

    /// Resolved direct supers of a class.
    fn supers_of(ts: &TypeSystem, handle: TypeHandle) -> Vec<TypeHandle> {
        let Some(data) = ts.graph().node(handle) else {
            return Vec::new();
        };
        match data.payload() {
            TypePayload::Class(c) => c.supers.iter().filter_map(|s| s.resolved()).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `sup` appears in the transitive super chain of `sub`.
    fn inherits_from(ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> bool {
        let mut visited = FxHashSet::default();
        let mut work = vec![sub];
        while let Some(current) = work.pop() {
            if !visited.insert(current) {
                continue;
            }
            for parent in Self::supers_of(ts, current) {
                if parent == sup {
                    return true;
                }
                work.push(parent);
            }
        }
        false
    }

    fn structural_members(
        ts: &TypeSystem,
        handle: TypeHandle,
    ) -> Option<(Vec<(String, TypeHandle)>, Vec<TypeHandle>)> {
        let data = ts.graph().node(handle)?;
        let TypePayload::Class(c) = data.payload() else {
            return None;
        };
        let mut fields = Vec::with_capacity(c.fields.len());
        for field in &c.fields {
            fields.push((field.name.clone(), field.ty.resolved()?));
        }
        let mut methods = Vec::with_capacity(c.methods.len());
        for method in &c.methods {
            methods.push(method.resolved()?);
        }
        Some((fields, methods))
    }

    fn method_name(ts: &TypeSystem, method: TypeHandle) -> Option<String> {
        let data = ts.graph().node(method)?;
        match data.payload() {
            TypePayload::Function(f) => Some(f.name.clone()),
            _ => None,
        }
    }
}

impl Kind for ClassKind {
    fn name(&self) -> &str {
        CLASS_KIND_NAME
    }

    fn calculate_identifier(&self, ts: &TypeSystem, data: &TypeData) -> Option<String> {
        let TypePayload::Class(c) = data.payload() else {
            return None;
        };
        match self.config.typing {
            ClassTyping::Nominal => {
                Some(format!("{}-{}", self.config.identifier_prefix, c.name))
            }
            ClassTyping::Structural => {
                // Structural identity is independent of the class name.
                let mut fields = Vec::with_capacity(c.fields.len());
                for field in &c.fields {
                    let handle = field.ty.resolved()?;
                    let id = ts.graph().node(handle)?.identifier()?;
                    fields.push(format!("{}:{id}", field.name));
                }
                fields.sort();
                let mut methods = Vec::with_capacity(c.methods.len());
                for method in &c.methods {
                    let handle = method.resolved()?;
                    methods.push(ts.graph().node(handle)?.identifier()?);
                }
                methods.sort();
                let mut supers = Vec::with_capacity(c.supers.len());
                for sup in &c.supers {
                    let handle = sup.resolved()?;
                    supers.push(ts.graph().node(handle)?.identifier()?);
                }
                supers.sort();
                Some(format!(
                    "{}-fields{{{}}}-methods{{{}}}-supers{{{}}}",
                    self.config.identifier_prefix,
                    fields.join(","),
                    methods.join(","),
                    supers.join(",")
                ))
            }
        }
    }

    fn identifiability_refs(&self, data: &TypeData) -> Vec<TypeRef> {
        match self.config.typing {
            // Nominal identity needs the name only; members may follow.
            ClassTyping::Nominal => Vec::new(),
            ClassTyping::Structural => data.all_refs(),
        }
    }

    fn completion_refs(&self, data: &TypeData) -> Vec<TypeRef> {
        data.all_refs()
    }

    fn analyze_equality(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
        match self.config.typing {
            ClassTyping::Nominal => {
                // Distinct nominal classes are never equal; reflexivity was
                // already handled by the service.
                vec![Problem::TypeEquality(TypeEqualityProblem {
                    first: a,
                    second: b,
                    sub_problems: Vec::new(),
                })]
            }
            ClassTyping::Structural => {
                let (Some((fields_a, methods_a)), Some((fields_b, methods_b))) =
                    (Self::structural_members(ts, a), Self::structural_members(ts, b))
                else {
                    return vec![Problem::TypeEquality(TypeEqualityProblem {
                        first: a,
                        second: b,
                        sub_problems: Vec::new(),
                    })];
                };
                let mut problems = Vec::new();
                if fields_a.len() != fields_b.len() || methods_a.len() != methods_b.len() {
                    problems.push(Problem::ValueConflict(ValueConflict {
                        first: Some(format!("{}/{}", fields_a.len(), methods_a.len())),
                        second: Some(format!("{}/{}", fields_b.len(), methods_b.len())),
                        location: "number of fields/methods".to_string(),
                    }));
                    return problems;
                }
                for (name, ty_a) in &fields_a {
                    match fields_b.iter().find(|(n, _)| n == name) {
                        Some((_, ty_b)) => {
                            if let Some(problem) = ts.equality_problem(*ty_a, *ty_b) {
                                problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                                    expected: Some(*ty_a),
                                    actual: Some(*ty_b),
                                    index: ConflictIndex::Property(name.clone()),
                                    sub_problems: vec![problem],
                                }));
                            }
                        }
                        None => problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                            expected: Some(*ty_a),
                            actual: None,
                            index: ConflictIndex::Property(name.clone()),
                            sub_problems: Vec::new(),
                        })),
                    }
                }
                for (index, (m_a, m_b)) in methods_a.iter().zip(&methods_b).enumerate() {
                    if let Some(problem) = ts.equality_problem(*m_a, *m_b) {
                        problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                            expected: Some(*m_a),
                            actual: Some(*m_b),
                            index: ConflictIndex::Position(index),
                            sub_problems: vec![problem],
                        }));
                    }
                }
                problems
            }
        }
    }

    fn analyze_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
        match self.config.typing {
            ClassTyping::Nominal => {
                if Self::inherits_from(ts, sub, sup) {
                    Vec::new()
                } else {
                    vec![Problem::SubType(SubTypeProblem {
                        sub,
                        sup,
                        sub_problems: Vec::new(),
                    })]
                }
            }
            ClassTyping::Structural => {
                let (Some((fields_sub, methods_sub)), Some((fields_sup, methods_sup))) = (
                    Self::structural_members(ts, sub),
                    Self::structural_members(ts, sup),
                ) else {
                    return vec![Problem::SubType(SubTypeProblem {
                        sub,
                        sup,
                        sub_problems: Vec::new(),
                    })];
                };
                let strategy = self.config.subtype_field_checking;
                let mut problems = Vec::new();
                // Every member of the super side must be present below.
                for (name, ty_sup) in &fields_sup {
                    match fields_sub.iter().find(|(n, _)| n == name) {
                        Some((_, ty_sub)) => {
                            if !strategy.check(ts, *ty_sub, *ty_sup) {
                                problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                                    expected: Some(*ty_sup),
                                    actual: Some(*ty_sub),
                                    index: ConflictIndex::Property(name.clone()),
                                    sub_problems: Vec::new(),
                                }));
                            }
                        }
                        None => problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                            expected: Some(*ty_sup),
                            actual: None,
                            index: ConflictIndex::Property(name.clone()),
                            sub_problems: Vec::new(),
                        })),
                    }
                }
                for m_sup in &methods_sup {
                    let sup_name = Self::method_name(ts, *m_sup);
                    let found = methods_sub.iter().any(|m_sub| {
                        Self::method_name(ts, *m_sub) == sup_name
                            && strategy.check(ts, *m_sub, *m_sup)
                    });
                    if !found {
                        problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                            expected: Some(*m_sup),
                            actual: None,
                            index: ConflictIndex::Property(
                                sup_name.unwrap_or_else(|| "<method>".to_string()),
                            ),
                            sub_problems: Vec::new(),
                        }));
                    }
                }
                problems
            }
        }
    }

    fn user_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String {
        let Some(data) = ts.graph().node(handle) else {
            return "<removed>".to_string();
        };
        match data.payload() {
            TypePayload::Class(c) => c.name.clone(),
            _ => "<class>".to_string(),
        }
    }

    fn on_completed(&self, ts: &TypeSystem, handle: TypeHandle) {
        // Record the declared inheritance as explicit CLASS_SUPER facts so
        // graph algorithms and hosts can walk the hierarchy.
        for sup in Self::supers_of(ts, handle) {
            let edge = ts.graph().ensure_edge(handle, sup, EdgeKind::ClassSuper);
            edge.set_explicit(true);
            edge.set_caching(EdgeCacheState::LinkExists);
        }
    }
}
