//! The function kind.
//!
//! Function identity is structural: the function name plus the identifiers
//! of the input parameter types (plus configurable name/output parts).
//! Functions sharing a name form an overload group; call sites are resolved
//! against the whole group, argument-driven, with equality preferred over
//! conversion over subtyping.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::debug;
use tyck_common::{
    ConflictIndex, IndexedTypeConflict, InferenceProblem, InferenceProblemKind, LanguageKey,
    NodeHandle, Problem, TypeEqualityProblem, TypeHandle, ValidationProblem, ValueConflict,
};
use tyck_graph::{
    FunctionTypeData, ParameterData, TypeData, TypePayload, TypeRef, TypeReference, TypeSelector,
};

use crate::infer::{InferenceRule, InferenceRuleOptions, InferenceRuleOutcome};
use crate::initializer::TypeInitializer;
use crate::kind::{Kind, SubTypeCheckingStrategy};
use crate::system::TypeSystem;
use crate::validation::{ValidationRule, ValidationRuleOptions};

pub const FUNCTION_KIND_NAME: &str = "function";

#[derive(Clone, Copy, Debug)]
pub struct FunctionKindConfig {
    /// Include the function name in identity and equality.
    pub enforce_function_name: bool,
    /// Include input parameter names in identity and equality.
    pub enforce_input_parameter_names: bool,
    /// Include the output parameter name in identity and equality.
    pub enforce_output_parameter_name: bool,
    /// Strategy for comparing parameter types during subtype checks.
    pub subtype_parameter_checking: SubTypeCheckingStrategy,
}

impl Default for FunctionKindConfig {
    fn default() -> Self {
        Self {
            enforce_function_name: true,
            enforce_input_parameter_names: false,
            enforce_output_parameter_name: false,
            subtype_parameter_checking: SubTypeCheckingStrategy::AssignableType,
        }
    }
}

/// One named, typed parameter in a function declaration.
pub struct ParameterDetails {
    pub name: String,
    pub ty: TypeSelector,
}

/// Declaration of one function signature.
pub struct FunctionDetails {
    pub function_name: String,
    pub input_parameters: Vec<ParameterDetails>,
    pub output_parameter: Option<ParameterDetails>,
}

/// Host view of a call site: whether a node calls this function/operator,
/// and which nodes are its arguments.
pub trait CallAdapter {
    fn matches(&self, ts: &TypeSystem, node: NodeHandle) -> bool;
    fn arguments(&self, ts: &TypeSystem, node: NodeHandle) -> Vec<NodeHandle>;
}

struct OverloadGroup {
    /// Overload signatures in registration order; a handle occurring twice
    /// records a duplicate declaration of the same signature.
    overloads: Vec<TypeHandle>,
    /// Memoized shared return type: outer `None` until computed, inner
    /// `None` when the overloads disagree. Reset whenever the group gains
    /// an overload.
    same_output: Cell<Option<Option<TypeHandle>>>,
}

pub struct FunctionKind {
    pub config: FunctionKindConfig,
    groups: RefCell<IndexMap<String, OverloadGroup>>,
    /// (group name, adapter identity) pairs whose call rules are installed;
    /// several overloads sharing one adapter get one rule, not one each.
    installed_adapters: RefCell<FxHashSet<(String, usize)>>,
}

impl FunctionKind {
    #[must_use]
    pub fn new(config: FunctionKindConfig) -> Self {
        Self {
            config,
            groups: RefCell::new(IndexMap::new()),
            installed_adapters: RefCell::new(FxHashSet::default()),
        }
    }

    /// Record the adapter for a group; `false` when it was already there.
    fn install_adapter(&self, name: &str, adapter: &Rc<dyn CallAdapter>) -> bool {
        let identity = Rc::as_ptr(adapter).cast::<()>() as usize;
        self.installed_adapters
            .borrow_mut()
            .insert((name.to_string(), identity))
    }

    /// Start building a function type.
    pub fn create<'ts>(
        self: &Rc<Self>,
        ts: &'ts TypeSystem,
        details: FunctionDetails,
    ) -> FunctionBuilder<'ts> {
        FunctionBuilder {
            ts,
            kind: Rc::clone(self),
            details,
            call_adapters: Vec::new(),
            validate_calls: false,
        }
    }

    /// The existing function type for these details, if any.
    #[must_use]
    pub fn get(&self, ts: &TypeSystem, details: &FunctionDetails) -> Option<TypeHandle> {
        let data = build_payload(details_clone_shallow(details));
        for reference in data.all_refs() {
            let _ = reference.try_resolve(ts);
        }
        let identifier = self.calculate_identifier(ts, &data)?;
        ts.graph().get_type(&identifier)
    }

    /// The memoized shared return type of the named overload group, when
    /// every overload agrees on one (fast path for call sites whose output
    /// does not depend on the chosen overload).
    #[must_use]
    pub fn same_output_type(&self, ts: &TypeSystem, name: &str) -> Option<TypeHandle> {
        let groups = self.groups.borrow();
        let group = groups.get(name)?;
        if let Some(memo) = group.same_output.get() {
            // A memoized type may have left the graph since; recompute then.
            if memo.is_none_or(|shared| ts.graph().node(shared).is_some()) {
                return memo;
            }
        }
        let mut shared: Option<TypeHandle> = None;
        for overload in &group.overloads {
            let Some(output) = function_signature(ts, *overload).and_then(|(_, out)| out) else {
                shared = None;
                break;
            };
            match shared {
                None => shared = Some(output),
                Some(existing) if existing == output => {}
                Some(_) => {
                    shared = None;
                    break;
                }
            }
        }
        group.same_output.set(Some(shared));
        shared
    }

    /// Signatures registered more than once under the same name.
    #[must_use]
    pub fn duplicate_signatures(&self) -> Vec<(String, TypeHandle)> {
        let mut result = Vec::new();
        for (name, group) in self.groups.borrow().iter() {
            let mut seen = FxHashSet::default();
            for overload in &group.overloads {
                if !seen.insert(*overload) {
                    result.push((name.clone(), *overload));
                }
            }
        }
        result
    }

    fn register_overload(&self, name: &str, handle: TypeHandle) {
        let mut groups = self.groups.borrow_mut();
        let group = groups
            .entry(name.to_string())
            .or_insert_with(|| OverloadGroup {
                overloads: Vec::new(),
                same_output: Cell::new(None),
            });
        group.overloads.push(handle);
        group.same_output.set(None);
    }

    /// Resolve a call of the named group against inferred argument types.
    ///
    /// The unique overload whose parameter list accepts the arguments wins;
    /// among several, the one matching by equality beats conversion beats
    /// subtyping; a remaining tie is ambiguous.
    pub fn resolve_call(
        &self,
        ts: &TypeSystem,
        name: &str,
        arg_types: &[TypeHandle],
        node: NodeHandle,
    ) -> Result<TypeHandle, InferenceProblem> {
        let candidates: Vec<TypeHandle> = {
            let groups = self.groups.borrow();
            let mut unique = Vec::new();
            let mut seen = FxHashSet::default();
            for overload in groups.get(name).map(|g| g.overloads.as_slice()).unwrap_or(&[]) {
                if seen.insert(*overload) {
                    unique.push(*overload);
                }
            }
            unique
        };

        let mut best_rank = usize::MAX;
        let mut best: Vec<TypeHandle> = Vec::new();
        for candidate in candidates {
            let Some((params, _)) = function_signature(ts, candidate) else {
                continue;
            };
            if params.len() != arg_types.len() {
                continue;
            }
            let Some(rank) = match_rank(ts, arg_types, &params) else {
                debug!(name, ?candidate, "overload rejected: arguments not assignable");
                continue;
            };
            debug!(name, ?candidate, rank, "overload accepted");
            if rank < best_rank {
                best_rank = rank;
                best = vec![candidate];
            } else if rank == best_rank {
                best.push(candidate);
            }
        }

        match best.len() {
            0 => Err(InferenceProblem {
                node,
                kind: InferenceProblemKind::NoMatchingOverload,
                location: name.to_string(),
                sub_problems: Vec::new(),
            }),
            1 => {
                let (_, output) = function_signature(ts, best[0]).expect("candidate was readable");
                output.ok_or_else(|| InferenceProblem {
                    node,
                    kind: InferenceProblemKind::NoMatchingOverload,
                    location: format!("{name} has no output type"),
                    sub_problems: Vec::new(),
                })
            }
            _ => Err(InferenceProblem {
                node,
                kind: InferenceProblemKind::AmbiguousOverload,
                location: name.to_string(),
                sub_problems: Vec::new(),
            }),
        }
    }
}

/// Worst-pair match level of a candidate: 0 when every argument is equal to
/// its parameter, 1 when implicit conversion is needed, 2 when subtyping is
/// needed. `None` when any argument is not assignable at all.
fn match_rank(ts: &TypeSystem, args: &[TypeHandle], params: &[TypeHandle]) -> Option<usize> {
    let mut worst = 0;
    for (arg, param) in args.iter().zip(params) {
        let level = if ts.are_equal(*arg, *param) {
            0
        } else if ts.is_convertible(*arg, *param, tyck_graph::ConversionMode::ImplicitExplicit) {
            1
        } else if ts.is_sub_type(*arg, *param) {
            2
        } else {
            return None;
        };
        worst = worst.max(level);
    }
    Some(worst)
}

/// Resolved input parameter types and output type of a function type.
fn function_signature(
    ts: &TypeSystem,
    handle: TypeHandle,
) -> Option<(Vec<TypeHandle>, Option<TypeHandle>)> {
    let data = ts.graph().node(handle)?;
    match data.payload() {
        TypePayload::Function(f) => {
            let mut params = Vec::with_capacity(f.inputs.len());
            for input in &f.inputs {
                params.push(input.ty.resolved()?);
            }
            let output = match &f.output {
                Some(out) => Some(out.ty.resolved()?),
                None => None,
            };
            Some((params, output))
        }
        _ => None,
    }
}

fn build_payload(details: FunctionDetails) -> TypeData {
    TypeData::new(TypePayload::Function(FunctionTypeData {
        name: details.function_name,
        inputs: details
            .input_parameters
            .into_iter()
            .map(|p| ParameterData {
                name: p.name,
                ty: TypeReference::new(p.ty),
            })
            .collect(),
        output: details.output_parameter.map(|p| ParameterData {
            name: p.name,
            ty: TypeReference::new(p.ty),
        }),
    }))
}

// `get` needs a payload for identifier calculation only.
fn details_clone_shallow(details: &FunctionDetails) -> FunctionDetails {
    use crate::kind::clone_selector;
    FunctionDetails {
        function_name: details.function_name.clone(),
        input_parameters: details
            .input_parameters
            .iter()
            .map(|p| ParameterDetails {
                name: p.name.clone(),
                ty: clone_selector(&p.ty),
            })
            .collect(),
        output_parameter: details.output_parameter.as_ref().map(|p| ParameterDetails {
            name: p.name.clone(),
            ty: clone_selector(&p.ty),
        }),
    }
}

/// Configuration chain for one function signature.
pub struct FunctionBuilder<'ts> {
    ts: &'ts TypeSystem,
    kind: Rc<FunctionKind>,
    details: FunctionDetails,
    call_adapters: Vec<(Rc<dyn CallAdapter>, Option<LanguageKey>)>,
    validate_calls: bool,
}

impl<'ts> FunctionBuilder<'ts> {
    /// Attach an inference rule for call sites of this function.
    #[must_use]
    pub fn inference_rule_for_calls(
        mut self,
        adapter: Rc<dyn CallAdapter>,
        language_key: Option<LanguageKey>,
    ) -> Self {
        self.call_adapters.push((adapter, language_key));
        self
    }

    /// Also register a validation rule reporting call sites that match no
    /// overload (or too many).
    #[must_use]
    pub fn validate_calls(mut self) -> Self {
        self.validate_calls = true;
        self
    }

    /// Finalize: the type is constructed as soon as its parameter types
    /// resolve, deduplicated by identifier, and added to its overload group.
    pub fn finish(self) -> Rc<TypeInitializer> {
        let Self {
            ts,
            kind,
            details,
            call_adapters,
            validate_calls,
        } = self;
        let name = details.function_name.clone();
        let initializer =
            ts.submit_initializer(Rc::clone(&kind) as Rc<dyn Kind>, build_payload(details));

        let group_kind = Rc::clone(&kind);
        let group_name = name.clone();
        initializer.on_finished(
            ts,
            Box::new(move |ts, handle| {
                group_kind.register_overload(&group_name, handle);
                for (adapter, language_key) in &call_adapters {
                    // One call rule per (group, adapter), shared by every
                    // overload the adapter serves.
                    if !group_kind.install_adapter(&group_name, adapter) {
                        continue;
                    }
                    ts.add_inference_rule(
                        Rc::new(OverloadCallRule {
                            kind: Rc::clone(&group_kind),
                            name: group_name.clone(),
                            adapter: Rc::clone(adapter),
                        }),
                        InferenceRuleOptions {
                            language_key: language_key.clone(),
                            bound_to_type: None,
                        },
                    );
                    if validate_calls {
                        ts.add_validation_rule(
                            Rc::new(OverloadCallValidator {
                                kind: Rc::clone(&group_kind),
                                name: group_name.clone(),
                                adapter: Rc::clone(adapter),
                            }),
                            ValidationRuleOptions {
                                language_key: language_key.clone(),
                                bound_to_type: None,
                            },
                        );
                    }
                }
            }),
        );
        initializer
    }
}

/// Inference rule for call sites of one overload group.
struct OverloadCallRule {
    kind: Rc<FunctionKind>,
    name: String,
    adapter: Rc<dyn CallAdapter>,
}

impl InferenceRule for OverloadCallRule {
    fn infer(&self, ts: &TypeSystem, node: NodeHandle) -> InferenceRuleOutcome {
        if !self.adapter.matches(ts, node) {
            return InferenceRuleOutcome::NotApplicable;
        }
        InferenceRuleOutcome::InferChildren(self.adapter.arguments(ts, node))
    }

    fn with_children(
        &self,
        ts: &TypeSystem,
        node: NodeHandle,
        children: &[TypeHandle],
    ) -> Result<TypeHandle, InferenceProblem> {
        self.kind.resolve_call(ts, &self.name, children, node)
    }
}

/// Validation rule reporting unresolvable call sites of one overload group.
struct OverloadCallValidator {
    kind: Rc<FunctionKind>,
    name: String,
    adapter: Rc<dyn CallAdapter>,
}

impl ValidationRule for OverloadCallValidator {
    fn validate(
        &self,
        ts: &TypeSystem,
        node: NodeHandle,
        accept: &mut dyn FnMut(ValidationProblem),
    ) {
        if !self.adapter.matches(ts, node) {
            return;
        }
        let mut arg_types = Vec::new();
        for argument in self.adapter.arguments(ts, node) {
            match ts.try_infer_type(argument) {
                Some(ty) => arg_types.push(ty),
                // Uninferable arguments are reported by inference itself.
                None => return,
            }
        }
        if let Err(problem) = self.kind.resolve_call(ts, &self.name, &arg_types, node) {
            let names: Vec<String> = arg_types.iter().map(|t| ts.type_name(*t)).collect();
            let message = match problem.kind {
                InferenceProblemKind::AmbiguousOverload => format!(
                    "the call of '{}' is ambiguous for arguments of type ({})",
                    self.name,
                    names.join(", ")
                ),
                _ => format!(
                    "no applicable overload of '{}' for arguments of type ({})",
                    self.name,
                    names.join(", ")
                ),
            };
            accept(
                ValidationProblem::error(node, message)
                    .with_sub_problems(vec![Problem::Inference(problem)]),
            );
        }
    }
}

impl Kind for FunctionKind {
    fn name(&self) -> &str {
        FUNCTION_KIND_NAME
    }

    fn calculate_identifier(&self, ts: &TypeSystem, data: &TypeData) -> Option<String> {
        let TypePayload::Function(f) = data.payload() else {
            return None;
        };
        let mut identifier = String::from("fn");
        if self.config.enforce_function_name {
            identifier.push('-');
            identifier.push_str(&f.name);
        }
        identifier.push('(');
        for (index, input) in f.inputs.iter().enumerate() {
            if index > 0 {
                identifier.push(',');
            }
            if self.config.enforce_input_parameter_names {
                identifier.push_str(&input.name);
                identifier.push(':');
            }
            let handle = input.ty.resolved()?;
            identifier.push_str(&ts.graph().node(handle)?.identifier()?);
        }
        identifier.push(')');
        if let Some(output) = &f.output {
            identifier.push_str("=>");
            if self.config.enforce_output_parameter_name {
                identifier.push_str(&output.name);
                identifier.push(':');
            }
            let handle = output.ty.resolved()?;
            identifier.push_str(&ts.graph().node(handle)?.identifier()?);
        }
        Some(identifier)
    }

    fn identifiability_refs(&self, data: &TypeData) -> Vec<TypeRef> {
        data.all_refs()
    }

    fn analyze_equality(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
        let (Some(data_a), Some(data_b)) = (ts.graph().node(a), ts.graph().node(b)) else {
            return vec![Problem::TypeEquality(TypeEqualityProblem {
                first: a,
                second: b,
                sub_problems: Vec::new(),
            })];
        };
        let (TypePayload::Function(fa), TypePayload::Function(fb)) =
            (data_a.payload(), data_b.payload())
        else {
            return Vec::new();
        };
        let mut problems = Vec::new();
        if self.config.enforce_function_name && fa.name != fb.name {
            problems.push(Problem::ValueConflict(ValueConflict {
                first: Some(fa.name.clone()),
                second: Some(fb.name.clone()),
                location: "function name".to_string(),
            }));
        }
        if fa.inputs.len() != fb.inputs.len() {
            problems.push(Problem::ValueConflict(ValueConflict {
                first: Some(fa.inputs.len().to_string()),
                second: Some(fb.inputs.len().to_string()),
                location: "number of input parameters".to_string(),
            }));
            return problems;
        }
        match (&fa.output, &fb.output) {
            (None, None) => {}
            (Some(out_a), Some(out_b)) => {
                if self.config.enforce_output_parameter_name && out_a.name != out_b.name {
                    problems.push(Problem::ValueConflict(ValueConflict {
                        first: Some(out_a.name.clone()),
                        second: Some(out_b.name.clone()),
                        location: "output parameter name".to_string(),
                    }));
                }
                if let (Some(ha), Some(hb)) = (out_a.ty.resolved(), out_b.ty.resolved()) {
                    if let Some(problem) = ts.equality_problem(ha, hb) {
                        problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                            expected: Some(ha),
                            actual: Some(hb),
                            index: ConflictIndex::Property("output".to_string()),
                            sub_problems: vec![problem],
                        }));
                    }
                }
            }
            _ => problems.push(Problem::ValueConflict(ValueConflict {
                first: Some(fa.output.is_some().to_string()),
                second: Some(fb.output.is_some().to_string()),
                location: "presence of an output parameter".to_string(),
            })),
        }
        for (index, (in_a, in_b)) in fa.inputs.iter().zip(&fb.inputs).enumerate() {
            if self.config.enforce_input_parameter_names && in_a.name != in_b.name {
                problems.push(Problem::ValueConflict(ValueConflict {
                    first: Some(in_a.name.clone()),
                    second: Some(in_b.name.clone()),
                    location: format!("name of input parameter {index}"),
                }));
            }
            if let (Some(ha), Some(hb)) = (in_a.ty.resolved(), in_b.ty.resolved()) {
                if let Some(problem) = ts.equality_problem(ha, hb) {
                    problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                        expected: Some(ha),
                        actual: Some(hb),
                        index: ConflictIndex::Position(index),
                        sub_problems: vec![problem],
                    }));
                }
            }
        }
        problems
    }

    fn analyze_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
        let (Some((params_sub, out_sub)), Some((params_sup, out_sup))) =
            (function_signature(ts, sub), function_signature(ts, sup))
        else {
            return vec![Problem::ValueConflict(ValueConflict {
                first: None,
                second: None,
                location: "function signature".to_string(),
            })];
        };
        let mut problems = Vec::new();
        if params_sub.len() != params_sup.len() {
            problems.push(Problem::ValueConflict(ValueConflict {
                first: Some(params_sub.len().to_string()),
                second: Some(params_sup.len().to_string()),
                location: "number of input parameters".to_string(),
            }));
            return problems;
        }
        let strategy = self.config.subtype_parameter_checking;
        // Co-variant output.
        match (out_sub, out_sup) {
            (_, None) => {}
            (Some(o_sub), Some(o_sup)) => {
                if !strategy.check(ts, o_sub, o_sup) {
                    problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                        expected: Some(o_sup),
                        actual: Some(o_sub),
                        index: ConflictIndex::Property("output".to_string()),
                        sub_problems: Vec::new(),
                    }));
                }
            }
            (None, Some(o_sup)) => {
                problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                    expected: Some(o_sup),
                    actual: None,
                    index: ConflictIndex::Property("output".to_string()),
                    sub_problems: Vec::new(),
                }));
            }
        }
        // Contra-variant inputs.
        for (index, (p_sub, p_sup)) in params_sub.iter().zip(&params_sup).enumerate() {
            if !strategy.check(ts, *p_sup, *p_sub) {
                problems.push(Problem::IndexedTypeConflict(IndexedTypeConflict {
                    expected: Some(*p_sup),
                    actual: Some(*p_sub),
                    index: ConflictIndex::Position(index),
                    sub_problems: Vec::new(),
                }));
            }
        }
        problems
    }

    fn user_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String {
        let Some(data) = ts.graph().node(handle) else {
            return "<removed>".to_string();
        };
        let TypePayload::Function(f) = data.payload() else {
            return "<function>".to_string();
        };
        let params: Vec<String> = f
            .inputs
            .iter()
            .map(|p| match p.ty.resolved() {
                Some(h) => format!("{}: {}", p.name, ts.type_name(h)),
                None => format!("{}: ?", p.name),
            })
            .collect();
        let output = match &f.output {
            Some(out) => match out.ty.resolved() {
                Some(h) => format!(" => {}", ts.type_name(h)),
                None => " => ?".to_string(),
            },
            None => String::new(),
        };
        format!("{}({}){}", f.name, params.join(", "), output)
    }
}
