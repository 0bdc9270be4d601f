//! Kinds, inference, and relation services for the tyck type system engine.
//!
//! This crate owns the behavior over the `tyck-graph` data model:
//! - `system` - the `TypeSystem` context tying everything together
//! - `kind` - the kind contract and registry
//! - `kinds` - primitive, function, class, fixed-parameters, multiplicity,
//!   top, bottom, and custom kinds with their factories
//! - `initializer` - deferred type construction with identifier dedup
//! - `infer` - the inference rule registry with its pending cache
//! - `relations` - equality, subtyping, conversion, assignability
//! - `operators` - operator registration over function overload groups
//! - `validation` - the validation collector and stock rules
//! - `printer` - user-visible type names and problem rendering

pub mod system;
pub use system::{TypeSystem, TypeSystemBuilder};

pub mod kind;
pub use kind::{Kind, KindRegistry, SubTypeCheckingStrategy};

pub mod initializer;
pub use initializer::TypeInitializer;

pub mod kinds;
pub use kinds::classes::{ClassDetails, ClassKind, ClassKindConfig, ClassTyping, FieldDetails};
pub use kinds::custom::{CustomDetails, CustomKind, CustomKindConfig};
pub use kinds::fixed_parameters::{FixedParametersKind, FixedParametersKindConfig};
pub use kinds::function::{
    CallAdapter, FunctionBuilder, FunctionDetails, FunctionKind, FunctionKindConfig,
    ParameterDetails,
};
pub use kinds::multiplicity::{MultiplicityKind, MultiplicityKindConfig};
pub use kinds::primitive::PrimitiveKind;
pub use kinds::top_bottom::{BottomKind, TopKind};

pub mod infer;
pub use infer::{
    DefaultInference, InferenceApi, InferenceCache, InferenceCacheEntry, InferenceRule,
    InferenceRuleOptions, InferenceRuleOutcome, MapInferenceCache,
};

pub mod relations;
pub use relations::assignability::{AssignabilityApi, DefaultAssignability};
pub use relations::conversion::{ConversionApi, DefaultConversion};
pub use relations::equality::{DefaultEquality, EqualityApi};
pub use relations::subtype::{DefaultSubtype, SubtypeApi};

pub mod operators;
pub use operators::{OperatorBuilder, OperatorManager, OperatorSignature};

pub mod validation;
pub use validation::{
    DefaultValidation, InvalidClassRule, UniqueFunctionSignatureRule, ValidationApi,
    ValidationRule, ValidationRuleOptions, check_assignable,
};

pub mod printer;
pub use printer::{DefaultPrinter, PrinterApi, print_validation_problem};

#[cfg(test)]
mod tests;
