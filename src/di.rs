//! Dependency-injection skeleton.
//!
//! A `TypeSystemModule` is a bundle of partial overrides: every service and
//! kind configuration slot is optional, and unset slots fall back to the
//! defaults. Hosts compose an engine with exactly the pieces they need to
//! replace.

use std::rc::Rc;

use tyck_common::LanguageAdapter;
use tyck_solver::{
    AssignabilityApi, ClassKindConfig, ConversionApi, EqualityApi, FixedParametersKindConfig,
    FunctionKindConfig, InferenceApi, MultiplicityKindConfig, PrinterApi, SubtypeApi, TypeSystem,
    TypeSystemBuilder, ValidationApi,
};

/// Partial overrides for engine assembly.
///
/// Service slots replace whole implementations; kind slots replace the
/// factory configurations; `top_name`/`bottom_name` rename the singletons.
#[derive(Default)]
pub struct TypeSystemModule {
    /// Host-node introspection; defaults to `NoLanguage`.
    pub language: Option<Rc<dyn LanguageAdapter>>,
    pub inference: Option<Box<dyn InferenceApi>>,
    pub equality: Option<Box<dyn EqualityApi>>,
    pub subtype: Option<Box<dyn SubtypeApi>>,
    pub conversion: Option<Box<dyn ConversionApi>>,
    pub assignability: Option<Box<dyn AssignabilityApi>>,
    pub validation: Option<Box<dyn ValidationApi>>,
    pub printer: Option<Box<dyn PrinterApi>>,
    pub functions: Option<FunctionKindConfig>,
    pub classes: Option<ClassKindConfig>,
    pub fixed_parameters: Option<FixedParametersKindConfig>,
    pub multiplicities: Option<MultiplicityKindConfig>,
    pub top_name: Option<String>,
    pub bottom_name: Option<String>,
}

/// Assemble an engine from a module of partial overrides.
#[must_use]
pub fn create_type_system(module: TypeSystemModule) -> TypeSystem {
    let mut builder = TypeSystemBuilder::new();
    if let Some(language) = module.language {
        builder = builder.language(language);
    }
    if let Some(service) = module.inference {
        builder = builder.inference(service);
    }
    if let Some(service) = module.equality {
        builder = builder.equality(service);
    }
    if let Some(service) = module.subtype {
        builder = builder.subtype(service);
    }
    if let Some(service) = module.conversion {
        builder = builder.conversion(service);
    }
    if let Some(service) = module.assignability {
        builder = builder.assignability(service);
    }
    if let Some(service) = module.validation {
        builder = builder.validation(service);
    }
    if let Some(service) = module.printer {
        builder = builder.printer(service);
    }
    if let Some(config) = module.functions {
        builder = builder.function_config(config);
    }
    if let Some(config) = module.classes {
        builder = builder.class_config(config);
    }
    if let Some(config) = module.fixed_parameters {
        builder = builder.fixed_parameters_config(config);
    }
    if let Some(config) = module.multiplicities {
        builder = builder.multiplicity_config(config);
    }
    if let Some(name) = module.top_name {
        builder = builder.top_name(name);
    }
    if let Some(name) = module.bottom_name {
        builder = builder.bottom_name(name);
    }
    builder.build()
}
