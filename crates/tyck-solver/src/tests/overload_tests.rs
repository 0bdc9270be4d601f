//! Overload resolution and operator tests.

use std::rc::Rc;

use tyck_common::{NodeHandle, TypeHandle};
use tyck_graph::{ConversionMode, TypeSelector};

use crate::infer::InferenceRuleOptions;
use crate::kinds::function::CallAdapter;
use crate::operators::OperatorSignature;
use crate::system::TypeSystem;
use crate::tests::support::{LiteralRule, TestLanguage, TestNode, init_tracing};

/// Recognizes binary nodes with one operator character.
struct BinOpAdapter {
    language: TestLanguage,
    op: char,
}

impl CallAdapter for BinOpAdapter {
    fn matches(&self, _ts: &TypeSystem, node: NodeHandle) -> bool {
        matches!(self.language.get(node), Some(TestNode::Binary { op, .. }) if op == self.op)
    }

    fn arguments(&self, _ts: &TypeSystem, node: NodeHandle) -> Vec<NodeHandle> {
        match self.language.get(node) {
            Some(TestNode::Binary { left, right, .. }) => vec![left, right],
            _ => Vec::new(),
        }
    }
}

struct Fixture {
    ts: TypeSystem,
    language: TestLanguage,
    number: TypeHandle,
    string: TypeHandle,
}

/// Number/string primitives, literal rules, and the operators `+` and `-`.
fn fixture() -> Fixture {
    init_tracing();
    let language = TestLanguage::default();
    let ts = TypeSystem::new(Rc::new(language.clone()));
    let number = ts.create_primitive("number");
    let string = ts.create_primitive("string");

    ts.add_inference_rule(
        Rc::new(LiteralRule {
            language: language.clone(),
            matches_int: true,
            ty: number,
        }),
        InferenceRuleOptions {
            language_key: Some("IntLiteral".to_string()),
            bound_to_type: None,
        },
    );
    ts.add_inference_rule(
        Rc::new(LiteralRule {
            language: language.clone(),
            matches_int: false,
            ty: string,
        }),
        InferenceRuleOptions {
            language_key: Some("StringLiteral".to_string()),
            bound_to_type: None,
        },
    );

    let direct = TypeSelector::Direct;
    ts.create_operator(
        "+",
        vec![
            OperatorSignature::binary(direct(number), direct(number), direct(number)),
            OperatorSignature::binary(direct(string), direct(string), direct(string)),
        ],
    )
    .inference_rule(
        Rc::new(BinOpAdapter {
            language: language.clone(),
            op: '+',
        }),
        Some("BinaryExpression".to_string()),
    )
    .finish();

    ts.create_operator(
        "-",
        vec![OperatorSignature::binary(
            direct(number),
            direct(number),
            direct(number),
        )],
    )
    .inference_rule(
        Rc::new(BinOpAdapter {
            language: language.clone(),
            op: '-',
        }),
        Some("BinaryExpression".to_string()),
    )
    .finish();

    Fixture {
        ts,
        language,
        number,
        string,
    }
}

#[test]
fn addition_resolves_per_operand_types() {
    let f = fixture();
    let numbers = f
        .language
        .binary('+', f.language.int(), f.language.int());
    let strings = f
        .language
        .binary('+', f.language.string(), f.language.string());

    assert_eq!(f.ts.infer_type(numbers), Ok(f.number));
    assert_eq!(f.ts.infer_type(strings), Ok(f.string));
}

#[test]
fn subtraction_of_strings_reports_one_issue() {
    let f = fixture();
    let node = f
        .language
        .binary('-', f.language.string(), f.language.string());

    let problems = f.ts.validate(node);
    assert_eq!(problems.len(), 1);
    assert!(
        problems[0].message.contains('-'),
        "the report names the operator: {}",
        problems[0].message
    );
    assert!(problems[0].message.contains("no applicable overload"));
}

#[test]
fn implicit_conversion_makes_mixed_addition_clean() {
    let f = fixture();
    f.ts
        .mark_as_convertible(&[f.number], &[f.string], ConversionMode::ImplicitExplicit);

    // "a" + 2 infers as string via the string overload.
    let node = f.language.binary('+', f.language.string(), f.language.int());
    assert_eq!(f.ts.infer_type(node), Ok(f.string));
    assert!(f.ts.validate(node).is_empty());
}

#[test]
fn mixed_addition_without_conversion_is_reported() {
    let f = fixture();
    let node = f.language.binary('+', f.language.string(), f.language.int());

    assert!(f.ts.infer_type(node).is_err());
    let problems = f.ts.validate(node);
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message.contains('+'));
}

#[test]
fn equality_beats_conversion_in_overload_ranking() {
    let f = fixture();
    f.ts
        .mark_as_convertible(&[f.number], &[f.string], ConversionMode::ImplicitExplicit);

    // With number -> string implicit, 2 + 2 matches both overloads: the
    // number one by equality, the string one by conversion. Equality wins,
    // so the call is neither ambiguous nor string-typed.
    let node = f.language.binary('+', f.language.int(), f.language.int());
    assert_eq!(f.ts.infer_type(node), Ok(f.number));
    assert!(f.ts.validate(node).is_empty());
}

#[test]
fn shared_output_type_is_memoized_per_group() {
    let f = fixture();
    // "-" has a single signature returning number.
    assert_eq!(f.ts.function_same_output("-"), Some(f.number));
    // "+" returns number or string depending on the overload.
    assert_eq!(f.ts.function_same_output("+"), None);
    // The memo answers repeated queries consistently.
    assert_eq!(f.ts.function_same_output("-"), Some(f.number));
}

#[test]
fn adding_an_overload_invalidates_the_shared_output_memo() {
    let f = fixture();
    assert_eq!(f.ts.function_same_output("-"), Some(f.number));

    // A string signature for '-' makes the outputs disagree.
    let direct = TypeSelector::Direct;
    f.ts.create_operator(
        "-",
        vec![OperatorSignature::binary(
            direct(f.string),
            direct(f.string),
            direct(f.string),
        )],
    )
    .finish();

    assert_eq!(f.ts.function_same_output("-"), None);
}

#[test]
fn unknown_operator_nodes_are_left_to_inference_problems() {
    let f = fixture();
    let node = f.language.binary('*', f.language.int(), f.language.int());
    // No adapter matches: validation is silent, inference reports no rule.
    assert!(f.ts.validate(node).is_empty());
    assert!(f.ts.infer_type(node).is_err());
}
