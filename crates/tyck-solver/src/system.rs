//! The `TypeSystem` context.
//!
//! One `TypeSystem` instance is one independent engine: the type graph, the
//! kind registry, the services, and the pending work of deferred type
//! constructions. Services are trait objects so a host can override any of
//! them; they receive `&TypeSystem` per call instead of storing back
//! references, which keeps the whole object tree cycle-free.
//!
//! The engine is single-threaded cooperative: interior mutability
//! (`RefCell`/`Cell`) instead of locks, and every operation completes
//! synchronously.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;
use tyck_common::{
    LanguageAdapter, NoLanguage, NodeHandle, Problem, TypeHandle, ValidationProblem,
};
use tyck_graph::{
    ConversionMode, InitializerHandle, ResolutionEnv, TypeData, TypeGraph,
    TypeInitializationState, TypeSelector,
};

use crate::infer::{DefaultInference, InferenceApi, InferenceRule, InferenceRuleOptions};
use crate::initializer::TypeInitializer;
use crate::kind::{Kind, KindRegistry};
use crate::kinds::classes::{ClassDetails, ClassKind, ClassKindConfig};
use crate::kinds::custom::{CustomKind, CustomKindConfig};
use crate::kinds::fixed_parameters::{FixedParametersKind, FixedParametersKindConfig};
use crate::kinds::function::{FunctionBuilder, FunctionDetails, FunctionKind, FunctionKindConfig};
use crate::kinds::multiplicity::{MultiplicityKind, MultiplicityKindConfig};
use crate::kinds::primitive::PrimitiveKind;
use crate::kinds::top_bottom::{BottomKind, TopKind};
use crate::operators::{OperatorBuilder, OperatorManager, OperatorSignature};
use crate::printer::{DefaultPrinter, PrinterApi};
use crate::relations::assignability::{AssignabilityApi, DefaultAssignability};
use crate::relations::conversion::{ConversionApi, DefaultConversion};
use crate::relations::equality::{DefaultEquality, EqualityApi};
use crate::relations::subtype::{DefaultSubtype, SubtypeApi};
use crate::validation::{
    DefaultValidation, InvalidClassRule, UniqueFunctionSignatureRule, ValidationApi,
    ValidationRule, ValidationRuleOptions,
};

/// One type system engine instance.
pub struct TypeSystem {
    graph: TypeGraph,
    kinds: KindRegistry,
    language: Rc<dyn LanguageAdapter>,
    inference: Box<dyn InferenceApi>,
    equality: Box<dyn EqualityApi>,
    subtype: Box<dyn SubtypeApi>,
    conversion: Box<dyn ConversionApi>,
    assignability: Box<dyn AssignabilityApi>,
    validation: Box<dyn ValidationApi>,
    printer: Box<dyn PrinterApi>,
    functions: Rc<FunctionKind>,
    classes: Rc<ClassKind>,
    fixed_parameters: Rc<FixedParametersKind>,
    multiplicities: Rc<MultiplicityKind>,
    top: Rc<TopKind>,
    bottom: Rc<BottomKind>,
    /// Initializers still waiting for dependencies.
    pending: RefCell<Vec<Rc<TypeInitializer>>>,
    /// Re-entry guard: a sweep step may trigger another sweep request.
    sweeping: Cell<bool>,
}

impl TypeSystem {
    /// An engine with default services and kind configurations.
    #[must_use]
    pub fn new(language: Rc<dyn LanguageAdapter>) -> Self {
        TypeSystemBuilder::new().language(language).build()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    #[must_use]
    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    #[must_use]
    pub fn language(&self) -> &dyn LanguageAdapter {
        self.language.as_ref()
    }

    /// The function kind (overload groups, duplicate-signature queries).
    #[must_use]
    pub fn functions(&self) -> Rc<FunctionKind> {
        Rc::clone(&self.functions)
    }

    // =========================================================================
    // Type creation
    // =========================================================================

    /// Create the primitive named `name`; duplicates are a programmer error.
    pub fn create_primitive(&self, name: &str) -> TypeHandle {
        PrimitiveKind::create(self, name)
    }

    /// The primitive named `name`, if it exists.
    #[must_use]
    pub fn get_primitive(&self, name: &str) -> Option<TypeHandle> {
        PrimitiveKind::get(self, name)
    }

    /// Start building a function type.
    pub fn create_function(&self, details: FunctionDetails) -> FunctionBuilder<'_> {
        self.functions.create(self, details)
    }

    /// The existing function type for these details, if any.
    #[must_use]
    pub fn get_function(&self, details: &FunctionDetails) -> Option<TypeHandle> {
        self.functions.get(self, details)
    }

    /// Shared return type of the named overload group, when unique.
    #[must_use]
    pub fn function_same_output(&self, name: &str) -> Option<TypeHandle> {
        self.functions.same_output_type(self, name)
    }

    /// Create a class type.
    pub fn create_class(&self, details: ClassDetails) -> Rc<TypeInitializer> {
        self.classes.create(self, details)
    }

    /// The existing class type for these details, if any.
    #[must_use]
    pub fn get_class(&self, details: &ClassDetails) -> Option<TypeHandle> {
        self.classes.get(self, details)
    }

    /// Create a fixed-parameters generic instance (e.g. `List<string>`).
    pub fn create_fixed_parameters(
        &self,
        base_name: &str,
        parameters: Vec<TypeSelector>,
    ) -> Rc<TypeInitializer> {
        self.fixed_parameters.create(self, base_name, parameters)
    }

    /// The existing generic instance for this base and parameters, if any.
    #[must_use]
    pub fn get_fixed_parameters(
        &self,
        base_name: &str,
        parameters: &[TypeSelector],
    ) -> Option<TypeHandle> {
        self.fixed_parameters.get(self, base_name, parameters)
    }

    /// Create a multiplicity type `inner[lower..upper]`.
    pub fn create_multiplicity(
        &self,
        inner: TypeSelector,
        lower: i64,
        upper: i64,
    ) -> Rc<TypeInitializer> {
        self.multiplicities.create(self, inner, lower, upper)
    }

    /// The existing multiplicity type for these parts, if any.
    #[must_use]
    pub fn get_multiplicity(
        &self,
        inner: &TypeSelector,
        lower: i64,
        upper: i64,
    ) -> Option<TypeHandle> {
        self.multiplicities.get(self, inner, lower, upper)
    }

    /// Get or create the top singleton (default name "any").
    pub fn get_or_create_top(&self) -> TypeHandle {
        self.top.get_or_create(self)
    }

    /// Get or create the bottom singleton (default name "never").
    pub fn get_or_create_bottom(&self) -> TypeHandle {
        self.bottom.get_or_create(self)
    }

    /// Register a custom kind; its factory creates the types.
    pub fn create_custom_kind(&self, config: CustomKindConfig) -> Rc<CustomKind> {
        let kind = Rc::new(CustomKind::new(config));
        self.kinds.register(Rc::clone(&kind) as Rc<dyn Kind>);
        kind
    }

    /// Start building an operator (unary/binary/ternary/n-ary signatures).
    pub fn create_operator(
        &self,
        name: impl Into<String>,
        signatures: Vec<OperatorSignature>,
    ) -> OperatorBuilder<'_> {
        OperatorManager::create(self, name, signatures)
    }

    /// Remove a type: its edges are disposed, rules bound to it are
    /// deregistered, references to it are invalidated, and types depending
    /// on it drop to `Invalid`.
    pub fn remove_type(&self, handle: TypeHandle) {
        self.graph.remove_type(handle);
        for other in self.graph.all_registered() {
            let Some(data) = self.graph.node(other) else {
                continue;
            };
            let mut depends_on_removed = false;
            for reference in data.all_refs() {
                if reference.resolved() == Some(handle) {
                    reference.invalidate();
                    depends_on_removed = true;
                }
            }
            if depends_on_removed {
                data.set_state(TypeInitializationState::Invalid);
                trace!(?other, "type invalidated: dependency removed");
            }
        }
        // Pending candidates may hold stale resolutions as well.
        for initializer in self.pending.borrow().iter() {
            let Some(candidate) = initializer.placeholder() else {
                continue;
            };
            let Some(data) = self.graph.node(candidate) else {
                continue;
            };
            for reference in data.all_refs() {
                if reference.resolved() == Some(handle) {
                    reference.invalidate();
                }
            }
        }
        self.inference.remove_rules_bound_to(handle);
        self.validation.remove_rules_bound_to(handle);
        self.inference.clear_cache();
        self.graph.reset_computed_caches();
        self.sweep();
    }

    // =========================================================================
    // Relations
    // =========================================================================

    #[must_use]
    pub fn are_equal(&self, a: TypeHandle, b: TypeHandle) -> bool {
        self.equality.are_equal(self, a, b)
    }

    #[must_use]
    pub fn equality_problem(&self, a: TypeHandle, b: TypeHandle) -> Option<Problem> {
        self.equality.equality_problem(self, a, b)
    }

    pub fn mark_as_equal(&self, a: TypeHandle, b: TypeHandle) {
        self.equality.mark_as_equal(self, a, b);
    }

    pub fn unmark_as_equal(&self, a: TypeHandle, b: TypeHandle) {
        self.equality.unmark_as_equal(self, a, b);
    }

    #[must_use]
    pub fn is_sub_type(&self, sub: TypeHandle, sup: TypeHandle) -> bool {
        self.subtype.is_sub_type(self, sub, sup)
    }

    #[must_use]
    pub fn sub_type_problem(&self, sub: TypeHandle, sup: TypeHandle) -> Option<Problem> {
        self.subtype.sub_type_problem(self, sub, sup)
    }

    pub fn mark_as_sub_type(&self, sub: TypeHandle, sup: TypeHandle) {
        self.subtype.mark_as_sub_type(self, sub, sup);
    }

    pub fn unmark_as_sub_type(&self, sub: TypeHandle, sup: TypeHandle) {
        self.subtype.unmark_as_sub_type(self, sub, sup);
    }

    #[must_use]
    pub fn is_convertible(&self, from: TypeHandle, to: TypeHandle, mode: ConversionMode) -> bool {
        self.conversion.is_convertible(self, from, to, mode)
    }

    #[must_use]
    pub fn conversion_problem(
        &self,
        from: TypeHandle,
        to: TypeHandle,
        mode: ConversionMode,
    ) -> Option<Problem> {
        self.conversion.conversion_problem(self, from, to, mode)
    }

    #[must_use]
    pub fn conversion_mode(&self, from: TypeHandle, to: TypeHandle) -> ConversionMode {
        self.conversion.conversion_mode(self, from, to)
    }

    pub fn mark_as_convertible(
        &self,
        sources: &[TypeHandle],
        targets: &[TypeHandle],
        mode: ConversionMode,
    ) {
        self.conversion.mark_as_convertible(self, sources, targets, mode);
    }

    pub fn unmark_as_convertible(&self, from: TypeHandle, to: TypeHandle) {
        self.conversion.unmark_as_convertible(self, from, to);
    }

    #[must_use]
    pub fn is_assignable(&self, source: TypeHandle, target: TypeHandle) -> bool {
        self.assignability.is_assignable(self, source, target)
    }

    #[must_use]
    pub fn assignability_problem(&self, source: TypeHandle, target: TypeHandle) -> Option<Problem> {
        self.assignability.assignability_problem(self, source, target)
    }

    // =========================================================================
    // Inference
    // =========================================================================

    /// The type of a language node, or the problems explaining why none.
    pub fn infer_type(&self, node: NodeHandle) -> Result<TypeHandle, Vec<Problem>> {
        self.inference.infer_type(self, node)
    }

    /// Silent variant of `infer_type`.
    #[must_use]
    pub fn try_infer_type(&self, node: NodeHandle) -> Option<TypeHandle> {
        self.inference.try_infer(self, node)
    }

    /// Register an inference rule; pending references retry afterwards.
    pub fn add_inference_rule(&self, rule: Rc<dyn InferenceRule>, options: InferenceRuleOptions) {
        self.inference.add_rule(rule, options);
        self.sweep();
    }

    /// Drop all memoized node types (e.g. after the host re-indexed).
    pub fn clear_inference_cache(&self) {
        self.inference.clear_cache();
    }

    // =========================================================================
    // Validation
    // =========================================================================

    pub fn add_validation_rule(&self, rule: Rc<dyn ValidationRule>, options: ValidationRuleOptions) {
        self.validation.add_rule(rule, options);
    }

    /// Run all `before` hooks against the visit root.
    pub fn validate_before(&self, root: NodeHandle) -> Vec<ValidationProblem> {
        self.validation.validate_before(self, root)
    }

    /// Run the rules matching one visited node.
    pub fn validate(&self, node: NodeHandle) -> Vec<ValidationProblem> {
        self.validation.validate(self, node)
    }

    /// Run all `after` hooks against the visit root.
    pub fn validate_after(&self, root: NodeHandle) -> Vec<ValidationProblem> {
        self.validation.validate_after(self, root)
    }

    // =========================================================================
    // Printing
    // =========================================================================

    /// User-visible name of a type.
    #[must_use]
    pub fn type_name(&self, handle: TypeHandle) -> String {
        self.printer.type_name(self, handle)
    }

    /// Render a problem with its sub-problem tree.
    #[must_use]
    pub fn print_problem(&self, problem: &Problem) -> String {
        self.printer.print_problem(self, problem)
    }

    // =========================================================================
    // Lifecycle driving
    // =========================================================================

    /// Allocate a type for `data` and track its construction; the
    /// initializer finishes as soon as its preconditions resolve (possibly
    /// before this call returns).
    pub fn submit_initializer(&self, kind: Rc<dyn Kind>, data: TypeData) -> Rc<TypeInitializer> {
        let candidate = self.graph.alloc_type(data);
        let initializer = TypeInitializer::new(kind, candidate);
        self.pending.borrow_mut().push(Rc::clone(&initializer));
        self.sweep();
        initializer
    }

    /// Hook for factories that register types directly (primitives,
    /// top/bottom): retry pending work now that the graph grew.
    pub fn after_type_registered(&self) {
        self.sweep();
    }

    /// Retry pending initializers until a fixpoint: one resolution may
    /// enable the next (reciprocal delays).
    fn sweep(&self) {
        if self.sweeping.replace(true) {
            return;
        }
        loop {
            let snapshot: Vec<Rc<TypeInitializer>> = self.pending.borrow().clone();
            if snapshot.is_empty() {
                break;
            }
            let mut progressed = false;
            for initializer in &snapshot {
                if initializer.step(self) {
                    progressed = true;
                }
            }
            self.pending.borrow_mut().retain(|i| !i.is_settled(self));
            if !progressed {
                break;
            }
        }
        self.sweeping.set(false);
    }
}

impl ResolutionEnv for TypeSystem {
    fn type_by_identifier(&self, identifier: &str) -> Option<TypeHandle> {
        self.graph.get_type(identifier)
    }

    fn infer_from_node(&self, node: NodeHandle) -> Option<TypeHandle> {
        self.inference.try_infer(self, node)
    }

    fn is_reference_target(&self, handle: TypeHandle) -> bool {
        match self.graph.node(handle) {
            // A registered type that dropped back to `Invalid` is skipped;
            // an unregistered candidate (no identifier yet) is a legal
            // placeholder target for self-referential construction.
            Some(data) => {
                !(data.identifier().is_some()
                    && data.state() == TypeInitializationState::Invalid)
            }
            None => false,
        }
    }
}

/// Builder assembling a `TypeSystem` from partial overrides.
pub struct TypeSystemBuilder {
    language: Option<Rc<dyn LanguageAdapter>>,
    inference: Option<Box<dyn InferenceApi>>,
    equality: Option<Box<dyn EqualityApi>>,
    subtype: Option<Box<dyn SubtypeApi>>,
    conversion: Option<Box<dyn ConversionApi>>,
    assignability: Option<Box<dyn AssignabilityApi>>,
    validation: Option<Box<dyn ValidationApi>>,
    printer: Option<Box<dyn PrinterApi>>,
    function_config: FunctionKindConfig,
    class_config: ClassKindConfig,
    fixed_parameters_config: FixedParametersKindConfig,
    multiplicity_config: MultiplicityKindConfig,
    top_name: Option<String>,
    bottom_name: Option<String>,
}

impl TypeSystemBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: None,
            inference: None,
            equality: None,
            subtype: None,
            conversion: None,
            assignability: None,
            validation: None,
            printer: None,
            function_config: FunctionKindConfig::default(),
            class_config: ClassKindConfig::default(),
            fixed_parameters_config: FixedParametersKindConfig::default(),
            multiplicity_config: MultiplicityKindConfig::default(),
            top_name: None,
            bottom_name: None,
        }
    }

    #[must_use]
    pub fn language(mut self, language: Rc<dyn LanguageAdapter>) -> Self {
        self.language = Some(language);
        self
    }

    #[must_use]
    pub fn inference(mut self, service: Box<dyn InferenceApi>) -> Self {
        self.inference = Some(service);
        self
    }

    #[must_use]
    pub fn equality(mut self, service: Box<dyn EqualityApi>) -> Self {
        self.equality = Some(service);
        self
    }

    #[must_use]
    pub fn subtype(mut self, service: Box<dyn SubtypeApi>) -> Self {
        self.subtype = Some(service);
        self
    }

    #[must_use]
    pub fn conversion(mut self, service: Box<dyn ConversionApi>) -> Self {
        self.conversion = Some(service);
        self
    }

    #[must_use]
    pub fn assignability(mut self, service: Box<dyn AssignabilityApi>) -> Self {
        self.assignability = Some(service);
        self
    }

    #[must_use]
    pub fn validation(mut self, service: Box<dyn ValidationApi>) -> Self {
        self.validation = Some(service);
        self
    }

    #[must_use]
    pub fn printer(mut self, service: Box<dyn PrinterApi>) -> Self {
        self.printer = Some(service);
        self
    }

    #[must_use]
    pub fn function_config(mut self, config: FunctionKindConfig) -> Self {
        self.function_config = config;
        self
    }

    #[must_use]
    pub fn class_config(mut self, config: ClassKindConfig) -> Self {
        self.class_config = config;
        self
    }

    #[must_use]
    pub fn fixed_parameters_config(mut self, config: FixedParametersKindConfig) -> Self {
        self.fixed_parameters_config = config;
        self
    }

    #[must_use]
    pub fn multiplicity_config(mut self, config: MultiplicityKindConfig) -> Self {
        self.multiplicity_config = config;
        self
    }

    #[must_use]
    pub fn top_name(mut self, name: impl Into<String>) -> Self {
        self.top_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn bottom_name(mut self, name: impl Into<String>) -> Self {
        self.bottom_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn build(self) -> TypeSystem {
        let functions = Rc::new(FunctionKind::new(self.function_config));
        let classes = Rc::new(ClassKind::new(self.class_config));
        let fixed_parameters = Rc::new(FixedParametersKind::new(self.fixed_parameters_config));
        let multiplicities = Rc::new(MultiplicityKind::new(self.multiplicity_config));
        let top = Rc::new(TopKind::new(self.top_name));
        let bottom = Rc::new(BottomKind::new(self.bottom_name));

        let kinds = KindRegistry::new();
        kinds.register(Rc::new(PrimitiveKind) as Rc<dyn Kind>);
        kinds.register(Rc::clone(&functions) as Rc<dyn Kind>);
        kinds.register(Rc::clone(&classes) as Rc<dyn Kind>);
        kinds.register(Rc::clone(&fixed_parameters) as Rc<dyn Kind>);
        kinds.register(Rc::clone(&multiplicities) as Rc<dyn Kind>);
        kinds.register(Rc::clone(&top) as Rc<dyn Kind>);
        kinds.register(Rc::clone(&bottom) as Rc<dyn Kind>);

        let ts = TypeSystem {
            graph: TypeGraph::new(),
            kinds,
            language: self.language.unwrap_or_else(|| Rc::new(NoLanguage)),
            inference: self
                .inference
                .unwrap_or_else(|| Box::new(DefaultInference::new())),
            equality: self.equality.unwrap_or_else(|| Box::new(DefaultEquality)),
            subtype: self
                .subtype
                .unwrap_or_else(|| Box::new(DefaultSubtype::default())),
            conversion: self
                .conversion
                .unwrap_or_else(|| Box::new(DefaultConversion)),
            assignability: self
                .assignability
                .unwrap_or_else(|| Box::new(DefaultAssignability)),
            validation: self
                .validation
                .unwrap_or_else(|| Box::new(DefaultValidation::new())),
            printer: self.printer.unwrap_or_else(|| Box::new(DefaultPrinter)),
            functions: Rc::clone(&functions),
            classes,
            fixed_parameters,
            multiplicities,
            top,
            bottom,
            pending: RefCell::new(Vec::new()),
            sweeping: Cell::new(false),
        };

        // Stock system rules.
        ts.add_validation_rule(Rc::new(InvalidClassRule), ValidationRuleOptions::default());
        ts.add_validation_rule(
            Rc::new(UniqueFunctionSignatureRule { functions }),
            ValidationRuleOptions::default(),
        );
        ts
    }
}

impl Default for TypeSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}
