//! Operator registration.
//!
//! Operators are specialized function types: each signature becomes one
//! function overload named after the operator, with a host call adapter
//! describing which nodes are applications of the operator and where the
//! operands sit. Call validation is always on, so an operator application
//! that matches no signature is reported.

use std::rc::Rc;

use tyck_common::LanguageKey;
use tyck_graph::TypeSelector;

use crate::initializer::TypeInitializer;
use crate::kinds::function::{CallAdapter, FunctionDetails, ParameterDetails};
use crate::system::TypeSystem;

/// An n-ary operator signature.
pub struct OperatorSignature {
    pub operands: Vec<TypeSelector>,
    pub ret: TypeSelector,
}

impl OperatorSignature {
    /// A unary signature.
    #[must_use]
    pub fn unary(operand: TypeSelector, ret: TypeSelector) -> Self {
        Self {
            operands: vec![operand],
            ret,
        }
    }

    /// A binary signature.
    #[must_use]
    pub fn binary(left: TypeSelector, right: TypeSelector, ret: TypeSelector) -> Self {
        Self {
            operands: vec![left, right],
            ret,
        }
    }

    /// A ternary signature.
    #[must_use]
    pub fn ternary(
        first: TypeSelector,
        second: TypeSelector,
        third: TypeSelector,
        ret: TypeSelector,
    ) -> Self {
        Self {
            operands: vec![first, second, third],
            ret,
        }
    }
}

/// Entry point for operator registration.
pub struct OperatorManager;

impl OperatorManager {
    /// Start building the operator `name` with the given signatures.
    pub fn create<'ts>(
        ts: &'ts TypeSystem,
        name: impl Into<String>,
        signatures: Vec<OperatorSignature>,
    ) -> OperatorBuilder<'ts> {
        OperatorBuilder {
            ts,
            name: name.into(),
            signatures,
            adapter: None,
        }
    }
}

/// Configuration chain for one operator.
pub struct OperatorBuilder<'ts> {
    ts: &'ts TypeSystem,
    name: String,
    signatures: Vec<OperatorSignature>,
    adapter: Option<(Rc<dyn CallAdapter>, Option<LanguageKey>)>,
}

impl<'ts> OperatorBuilder<'ts> {
    /// Attach the host adapter recognizing applications of this operator.
    #[must_use]
    pub fn inference_rule(
        mut self,
        adapter: Rc<dyn CallAdapter>,
        language_key: Option<LanguageKey>,
    ) -> Self {
        self.adapter = Some((adapter, language_key));
        self
    }

    /// Create one function overload per signature.
    pub fn finish(self) -> Vec<Rc<TypeInitializer>> {
        let Self {
            ts,
            name,
            signatures,
            adapter,
        } = self;
        let operand_names: &[&str] = &["left", "right", "third"];
        signatures
            .into_iter()
            .map(|signature| {
                let details = FunctionDetails {
                    function_name: name.clone(),
                    input_parameters: signature
                        .operands
                        .into_iter()
                        .enumerate()
                        .map(|(index, operand)| ParameterDetails {
                            name: operand_names
                                .get(index)
                                .map_or_else(|| format!("operand{index}"), |n| (*n).to_string()),
                            ty: operand,
                        })
                        .collect(),
                    output_parameter: Some(ParameterDetails {
                        name: "result".to_string(),
                        ty: signature.ret,
                    }),
                };
                let mut builder = ts.create_function(details).validate_calls();
                if let Some((adapter, language_key)) = &adapter {
                    builder = builder
                        .inference_rule_for_calls(Rc::clone(adapter), language_key.clone());
                }
                builder.finish()
            })
            .collect()
    }
}
