//! The fixed-parameters kind (generic instances like `List<string>`).
//!
//! Identity is the base name plus the ordered identifiers of the parameter
//! types. Two instances relate only when they share the base; parameters
//! are compared pair-wise under the configured strategy.

use std::rc::Rc;

use tyck_common::{ConflictIndex, IndexedTypeConflict, Problem, TypeHandle, ValueConflict};
use tyck_graph::{
    FixedParametersTypeData, TypeData, TypePayload, TypeRef, TypeReference, TypeSelector,
};

use crate::initializer::TypeInitializer;
use crate::kind::{Kind, SubTypeCheckingStrategy};
use crate::system::TypeSystem;

pub const FIXED_PARAMETERS_KIND_NAME: &str = "fixed-parameters";

#[derive(Clone, Copy, Debug)]
pub struct FixedParametersKindConfig {
    pub parameter_subtype_checking_strategy: SubTypeCheckingStrategy,
}

impl Default for FixedParametersKindConfig {
    fn default() -> Self {
        Self {
            parameter_subtype_checking_strategy: SubTypeCheckingStrategy::EqualType,
        }
    }
}

pub struct FixedParametersKind {
    pub config: FixedParametersKindConfig,
}

impl FixedParametersKind {
    #[must_use]
    pub fn new(config: FixedParametersKindConfig) -> Self {
        Self { config }
    }

    /// Create `base_name<parameters...>`; parameter types may not exist yet.
    pub fn create(
        self: &Rc<Self>,
        ts: &TypeSystem,
        base_name: &str,
        parameters: Vec<TypeSelector>,
    ) -> Rc<TypeInitializer> {
        let data = TypeData::new(TypePayload::FixedParameters(FixedParametersTypeData {
            base_name: base_name.to_string(),
            parameters: parameters.into_iter().map(TypeReference::new).collect(),
        }));
        ts.submit_initializer(Rc::clone(self) as Rc<dyn Kind>, data)
    }

    /// The existing instance for this base and these parameters, if any.
    #[must_use]
    pub fn get(
        &self,
        ts: &TypeSystem,
        base_name: &str,
        parameters: &[TypeSelector],
    ) -> Option<TypeHandle> {
        use crate::kind::clone_selector;
        let data = TypeData::new(TypePayload::FixedParameters(FixedParametersTypeData {
            base_name: base_name.to_string(),
            parameters: parameters
                .iter()
                .map(|p| TypeReference::new(clone_selector(p)))
                .collect(),
        }));
        for reference in data.all_refs() {
            let _ = reference.try_resolve(ts);
        }
        let identifier = self.calculate_identifier(ts, &data)?;
        ts.graph().get_type(&identifier)
    }
}

fn payload(ts: &TypeSystem, handle: TypeHandle) -> Option<(String, Vec<TypeHandle>)> {
    let data = ts.graph().node(handle)?;
    match data.payload() {
        TypePayload::FixedParameters(f) => {
            let mut params = Vec::with_capacity(f.parameters.len());
            for parameter in &f.parameters {
                params.push(parameter.resolved()?);
            }
            Some((f.base_name.clone(), params))
        }
        _ => None,
    }
}

impl Kind for FixedParametersKind {
    fn name(&self) -> &str {
        FIXED_PARAMETERS_KIND_NAME
    }

    fn calculate_identifier(&self, ts: &TypeSystem, data: &TypeData) -> Option<String> {
        match data.payload() {
            TypePayload::FixedParameters(f) => {
                let mut ids = Vec::with_capacity(f.parameters.len());
                for parameter in &f.parameters {
                    let handle = parameter.resolved()?;
                    ids.push(ts.graph().node(handle)?.identifier()?);
                }
                Some(format!("{}<{}>", f.base_name, ids.join(",")))
            }
            _ => None,
        }
    }

    fn identifiability_refs(&self, data: &TypeData) -> Vec<TypeRef> {
        data.all_refs()
    }

    fn analyze_equality(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
        let (Some((base_a, params_a)), Some((base_b, params_b))) = (payload(ts, a), payload(ts, b))
        else {
            return vec![unresolved_conflict()];
        };
        if base_a != base_b {
            return vec![Problem::ValueConflict(ValueConflict {
                first: Some(base_a),
                second: Some(base_b),
                location: "base name".to_string(),
            })];
        }
        if params_a.len() != params_b.len() {
            return vec![arity_conflict(params_a.len(), params_b.len())];
        }
        let mut problems = Vec::new();
        for (index, (pa, pb)) in params_a.iter().zip(&params_b).enumerate() {
            if let Some(problem) = ts.equality_problem(*pa, *pb) {
                problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                    expected: Some(*pa),
                    actual: Some(*pb),
                    index: ConflictIndex::Position(index),
                    sub_problems: vec![problem],
                }));
            }
        }
        problems
    }

    fn analyze_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
        let (Some((base_sub, params_sub)), Some((base_sup, params_sup))) =
            (payload(ts, sub), payload(ts, sup))
        else {
            return vec![unresolved_conflict()];
        };
        if base_sub != base_sup {
            return vec![Problem::ValueConflict(ValueConflict {
                first: Some(base_sub),
                second: Some(base_sup),
                location: "base name".to_string(),
            })];
        }
        if params_sub.len() != params_sup.len() {
            return vec![arity_conflict(params_sub.len(), params_sup.len())];
        }
        let strategy = self.config.parameter_subtype_checking_strategy;
        let mut problems = Vec::new();
        for (index, (psub, psup)) in params_sub.iter().zip(&params_sup).enumerate() {
            if !strategy.check(ts, *psub, *psup) {
                problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                    expected: Some(*psup),
                    actual: Some(*psub),
                    index: ConflictIndex::Position(index),
                    sub_problems: Vec::new(),
                }));
            }
        }
        problems
    }

    fn user_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String {
        match payload(ts, handle) {
            Some((base, params)) => {
                let names: Vec<String> = params.iter().map(|p| ts.type_name(*p)).collect();
                format!("{base}<{}>", names.join(", "))
            }
            None => "<fixed-parameters>".to_string(),
        }
    }
}

fn unresolved_conflict() -> Problem {
    Problem::ValueConflict(ValueConflict {
        first: None,
        second: None,
        location: "fixed-parameters payload".to_string(),
    })
}

fn arity_conflict(first: usize, second: usize) -> Problem {
    Problem::ValueConflict(ValueConflict {
        first: Some(first.to_string()),
        second: Some(second.to_string()),
        location: "number of type parameters".to_string(),
    })
}
