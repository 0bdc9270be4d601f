//! The problem taxonomy.
//!
//! Services never throw for user-level misuse; they return `Problem` values
//! that the validation collector aggregates and the printer renders. Each
//! variant carries the sub-problems that explain it, forming a tree.
//!
//! Programmer errors (duplicate primitive names, identifier collisions,
//! marked subtype cycles) are panics, not problems.

use serde::Serialize;

use crate::{ConversionMode, NodeHandle, TypeHandle};

/// Severity of a validation problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// A typing problem, possibly explained by nested sub-problems.
#[derive(Clone, Debug, PartialEq)]
pub enum Problem {
    ValueConflict(ValueConflict),
    IndexedTypeConflict(IndexedTypeConflict),
    TypeEquality(TypeEqualityProblem),
    SubType(SubTypeProblem),
    Conversion(ConversionProblem),
    Assignability(AssignabilityProblem),
    Inference(InferenceProblem),
    Validation(ValidationProblem),
}

impl Problem {
    /// The sub-problems explaining this problem.
    #[must_use]
    pub fn sub_problems(&self) -> &[Problem] {
        match self {
            Self::ValueConflict(_) => &[],
            Self::IndexedTypeConflict(p) => &p.sub_problems,
            Self::TypeEquality(p) => &p.sub_problems,
            Self::SubType(p) => &p.sub_problems,
            Self::Conversion(p) => &p.sub_problems,
            Self::Assignability(p) => &p.sub_problems,
            Self::Inference(p) => &p.sub_problems,
            Self::Validation(p) => &p.sub_problems,
        }
    }
}

/// Two mismatched primitive values (e.g. a lower bound, a name, an arity).
#[derive(Clone, Debug, PartialEq)]
pub struct ValueConflict {
    /// Value on the first/source side, if any.
    pub first: Option<String>,
    /// Value on the second/target side, if any.
    pub second: Option<String>,
    /// What the conflicting values are (e.g. "lower bound").
    pub location: String,
}

/// Type mismatch at an array index or property name.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedTypeConflict {
    /// Expected type, if one exists at this position.
    pub expected: Option<TypeHandle>,
    /// Actual type, if one exists at this position.
    pub actual: Option<TypeHandle>,
    /// Index for positional containers, name for keyed ones.
    pub index: ConflictIndex,
    pub sub_problems: Vec<Problem>,
}

/// Position of an indexed conflict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConflictIndex {
    Position(usize),
    Property(String),
}

/// Two types failed the equality check.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeEqualityProblem {
    pub first: TypeHandle,
    pub second: TypeHandle,
    pub sub_problems: Vec<Problem>,
}

/// A type is not a subtype of another.
#[derive(Clone, Debug, PartialEq)]
pub struct SubTypeProblem {
    pub sub: TypeHandle,
    pub sup: TypeHandle,
    pub sub_problems: Vec<Problem>,
}

/// No conversion of the required mode links two types.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionProblem {
    pub from: TypeHandle,
    pub to: TypeHandle,
    /// The mode the failed query required.
    pub required: ConversionMode,
    pub sub_problems: Vec<Problem>,
}

/// A value of `source` may not flow into a slot of `target`.
///
/// The sub-problems enumerate the three failed checks: equality, implicit
/// conversion, and subtyping.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignabilityProblem {
    pub source: TypeHandle,
    pub target: TypeHandle,
    pub sub_problems: Vec<Problem>,
}

/// Why an inference attempt produced no type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InferenceProblemKind {
    /// No registered rule was applicable to the node.
    NoRuleApplicable,
    /// A rule requested child inference and a child could not be inferred.
    ChildInferenceFailed,
    /// Several overloads matched the call site equally well.
    AmbiguousOverload,
    /// No overload of the named group accepted the argument types.
    NoMatchingOverload,
    /// The query re-entered a node already being inferred.
    PendingCycle,
}

/// Inference could not assign a type to a language node.
#[derive(Clone, Debug, PartialEq)]
pub struct InferenceProblem {
    pub node: NodeHandle,
    pub kind: InferenceProblemKind,
    /// Where inference failed (rule name, overload group, ...).
    pub location: String,
    pub sub_problems: Vec<Problem>,
}

/// Problem emitted by a validation rule.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationProblem {
    pub node: NodeHandle,
    pub severity: Severity,
    pub message: String,
    /// Property of the language node to attach the report to.
    pub language_property: Option<String>,
    /// Index within `language_property` for list-valued properties.
    pub language_index: Option<usize>,
    pub sub_problems: Vec<Problem>,
}

impl ValidationProblem {
    /// Create an error-severity problem at `node`.
    #[must_use]
    pub fn error(node: NodeHandle, message: impl Into<String>) -> Self {
        Self {
            node,
            severity: Severity::Error,
            message: message.into(),
            language_property: None,
            language_index: None,
            sub_problems: Vec::new(),
        }
    }

    /// Attach a language property for precise reporting.
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>, index: Option<usize>) -> Self {
        self.language_property = Some(property.into());
        self.language_index = index;
        self
    }

    /// Attach explaining sub-problems.
    #[must_use]
    pub fn with_sub_problems(mut self, sub_problems: Vec<Problem>) -> Self {
        self.sub_problems = sub_problems;
        self
    }
}

/// Format a message template by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
