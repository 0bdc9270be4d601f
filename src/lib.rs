//! tyck - a reusable, language-agnostic type system engine.
//!
//! Authors of programming languages, DSLs, and static analyzers use tyck to
//! obtain type inference, subtyping, assignability, operator and function
//! overload resolution, and typing validation over their own syntax trees.
//!
//! The engine is assembled from three crates re-exported here:
//! - `tyck-common` - handles, the host-language adapter, the problem taxonomy
//! - `tyck-graph` - the type graph: nodes, edges, listeners, algorithms
//! - `tyck-solver` - kinds, inference, relation services, operators,
//!   validation, printing
//!
//! Entry point: [`di::create_type_system`] with a [`di::TypeSystemModule`]
//! of partial overrides, or simply [`TypeSystem::new`] for the defaults.
//!
//! ```
//! use std::rc::Rc;
//! use tyck::prelude::*;
//!
//! let ts = TypeSystem::new(Rc::new(NoLanguage));
//! let integer = ts.create_primitive("integer");
//! let string = ts.create_primitive("string");
//! ts.mark_as_convertible(&[integer], &[string], ConversionMode::ImplicitExplicit);
//! assert!(ts.is_assignable(integer, string));
//! assert!(!ts.is_assignable(string, integer));
//! ```

pub use tyck_common::{
    AssignabilityProblem, ConflictIndex, ConversionProblem, EdgeId, IndexedTypeConflict,
    InferenceProblem, InferenceProblemKind, LanguageAdapter, LanguageKey, NoLanguage, NodeHandle,
    Problem, Severity, SubTypeProblem, TypeEqualityProblem, TypeHandle, ValidationProblem,
    ValueConflict,
};
pub use tyck_graph::{
    ConversionMode, CustomProperty, EdgeCacheState, EdgeDirection, EdgeKind, GraphListener,
    RelationMask, TypeEdge, TypeGraph, TypeInitializationState, TypeRef, TypeReference,
    TypeSelector, UNLIMITED, collect_reachable, edge_path, exists_edge_path,
};
pub use tyck_solver::{
    AssignabilityApi, BottomKind, CallAdapter, ClassDetails, ClassKind, ClassKindConfig,
    ClassTyping, ConversionApi, CustomDetails, CustomKind, CustomKindConfig, DefaultAssignability,
    DefaultConversion, DefaultEquality, DefaultInference, DefaultPrinter, DefaultSubtype,
    DefaultValidation, EqualityApi, FieldDetails, FixedParametersKind, FixedParametersKindConfig,
    FunctionBuilder, FunctionDetails, FunctionKind, FunctionKindConfig, InferenceApi,
    InferenceCache, InferenceCacheEntry, InferenceRule, InferenceRuleOptions,
    InferenceRuleOutcome, Kind, KindRegistry, MultiplicityKind, MultiplicityKindConfig,
    OperatorBuilder, OperatorManager, OperatorSignature, ParameterDetails, PrimitiveKind,
    PrinterApi, SubTypeCheckingStrategy, SubtypeApi, TopKind, TypeInitializer, TypeSystem,
    TypeSystemBuilder, ValidationApi, ValidationRule, ValidationRuleOptions, check_assignable,
};

pub mod di;

/// The commonly-needed surface in one import.
pub mod prelude {
    pub use crate::di::{TypeSystemModule, create_type_system};
    pub use tyck_common::{
        LanguageAdapter, LanguageKey, NoLanguage, NodeHandle, Problem, Severity, TypeHandle,
        ValidationProblem,
    };
    pub use tyck_graph::{ConversionMode, CustomProperty, TypeReference, TypeSelector, UNLIMITED};
    pub use tyck_solver::{
        CallAdapter, ClassDetails, CustomDetails, CustomKindConfig, FieldDetails, FunctionDetails,
        InferenceRule, InferenceRuleOptions, InferenceRuleOutcome, OperatorSignature,
        ParameterDetails, SubTypeCheckingStrategy, TypeSystem, TypeSystemBuilder, ValidationRule,
        ValidationRuleOptions,
    };
}
