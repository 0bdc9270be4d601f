//! Common types and utilities for the tyck type system engine.
//!
//! This crate provides foundational types used across all tyck crates:
//! - Arena handles (`TypeHandle`, `EdgeId`, `NodeHandle`)
//! - Host-language introspection (`LanguageKey`, `LanguageAdapter`)
//! - The problem taxonomy (`Problem` and its variants, `Severity`)
//! - Message formatting helpers

// Arena handles for types, edges, and host language nodes
pub mod handles;
pub use handles::{EdgeId, NodeHandle, TypeHandle};

// Shared enums to break circular dependencies
pub mod common;
pub use common::ConversionMode;

// Host-node introspection
pub mod language;
pub use language::{LanguageAdapter, LanguageKey, NoLanguage};

// Problem taxonomy shared by all services
pub mod problems;
pub use problems::{
    AssignabilityProblem, ConflictIndex, ConversionProblem, IndexedTypeConflict,
    InferenceProblem, InferenceProblemKind, Problem, Severity, SubTypeProblem,
    TypeEqualityProblem, ValidationProblem, ValueConflict, format_message,
};
