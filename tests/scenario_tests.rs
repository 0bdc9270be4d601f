//! End-to-end scenarios through the public API, driven by a small
//! expression language standing in for a host AST.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tyck::prelude::*;
use tyck::{InferenceProblemKind, TypeReference};

// =============================================================================
// A minimal host language
// =============================================================================

#[derive(Clone, Debug)]
enum Expr {
    NumberLiteral,
    StringLiteral,
    Binary {
        op: char,
        left: NodeHandle,
        right: NodeHandle,
    },
}

#[derive(Clone, Default)]
struct ExprLanguage {
    nodes: Rc<RefCell<Vec<Expr>>>,
}

impl ExprLanguage {
    fn add(&self, expr: Expr) -> NodeHandle {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(expr);
        NodeHandle((nodes.len() - 1) as u64)
    }

    fn get(&self, node: NodeHandle) -> Option<Expr> {
        self.nodes.borrow().get(node.0 as usize).cloned()
    }

    fn number(&self) -> NodeHandle {
        self.add(Expr::NumberLiteral)
    }

    fn string(&self) -> NodeHandle {
        self.add(Expr::StringLiteral)
    }

    fn binary(&self, op: char, left: NodeHandle, right: NodeHandle) -> NodeHandle {
        self.add(Expr::Binary { op, left, right })
    }

    /// Visit a subtree the way a host validation driver would.
    fn walk(&self, node: NodeHandle, visit: &mut dyn FnMut(NodeHandle)) {
        visit(node);
        if let Some(Expr::Binary { left, right, .. }) = self.get(node) {
            self.walk(left, visit);
            self.walk(right, visit);
        }
    }
}

impl LanguageAdapter for ExprLanguage {
    fn node_key(&self, node: NodeHandle) -> Option<LanguageKey> {
        Some(
            match self.get(node)? {
                Expr::NumberLiteral => "NumberLiteral",
                Expr::StringLiteral => "StringLiteral",
                Expr::Binary { .. } => "BinaryExpression",
            }
            .to_string(),
        )
    }

    fn all_sub_keys(&self, key: &str) -> Vec<LanguageKey> {
        match key {
            "Expression" => vec![
                "NumberLiteral".to_string(),
                "StringLiteral".to_string(),
                "BinaryExpression".to_string(),
            ],
            _ => Vec::new(),
        }
    }

    fn all_super_keys(&self, key: &str) -> Vec<LanguageKey> {
        match key {
            "NumberLiteral" | "StringLiteral" | "BinaryExpression" => {
                vec!["Expression".to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn is_node(&self, node: NodeHandle) -> bool {
        (node.0 as usize) < self.nodes.borrow().len()
    }
}

struct LiteralRule {
    language: ExprLanguage,
    number: TypeHandle,
    string: TypeHandle,
}

impl InferenceRule for LiteralRule {
    fn infer(&self, _ts: &TypeSystem, node: NodeHandle) -> InferenceRuleOutcome {
        match self.language.get(node) {
            Some(Expr::NumberLiteral) => InferenceRuleOutcome::Inferred(self.number),
            Some(Expr::StringLiteral) => InferenceRuleOutcome::Inferred(self.string),
            _ => InferenceRuleOutcome::NotApplicable,
        }
    }
}

struct BinOpAdapter {
    language: ExprLanguage,
    op: char,
}

impl CallAdapter for BinOpAdapter {
    fn matches(&self, _ts: &TypeSystem, node: NodeHandle) -> bool {
        matches!(self.language.get(node), Some(Expr::Binary { op, .. }) if op == self.op)
    }

    fn arguments(&self, _ts: &TypeSystem, node: NodeHandle) -> Vec<NodeHandle> {
        match self.language.get(node) {
            Some(Expr::Binary { left, right, .. }) => vec![left, right],
            _ => Vec::new(),
        }
    }
}

fn engine_for(language: &ExprLanguage) -> TypeSystem {
    create_type_system(TypeSystemModule {
        language: Some(Rc::new(language.clone())),
        ..Default::default()
    })
}

/// Validate a whole subtree: before hooks, every node, after hooks.
fn validate_tree(ts: &TypeSystem, language: &ExprLanguage, root: NodeHandle) -> Vec<ValidationProblem> {
    let mut problems = ts.validate_before(root);
    language.walk(root, &mut |node| problems.extend(ts.validate(node)));
    problems.extend(ts.validate_after(root));
    problems
}

// =============================================================================
// Scenario 1: primitive uniqueness
// =============================================================================

#[test]
fn scenario_primitive_uniqueness() {
    let language = ExprLanguage::default();
    let ts = engine_for(&language);
    let integer = ts.create_primitive("integer");
    assert_eq!(ts.graph().get_type("integer"), Some(integer));
    assert_eq!(ts.graph().all_registered().len(), 1);
}

#[test]
#[should_panic(expected = "already exists")]
fn scenario_primitive_uniqueness_second_creation_panics() {
    let language = ExprLanguage::default();
    let ts = engine_for(&language);
    ts.create_primitive("integer");
    ts.create_primitive("integer");
}

// =============================================================================
// Scenario 2: implicit conversion in assignment
// =============================================================================

#[test]
fn scenario_implicit_conversion_assignability() {
    let language = ExprLanguage::default();
    let ts = engine_for(&language);
    let number = ts.create_primitive("number");
    let string = ts.create_primitive("string");

    ts.mark_as_convertible(&[number], &[string], ConversionMode::ImplicitExplicit);

    assert!(ts.is_assignable(number, string));
    assert!(!ts.is_assignable(string, number));
}

// =============================================================================
// Scenario 3: operator overloads
// =============================================================================

struct OperatorFixture {
    ts: TypeSystem,
    language: ExprLanguage,
    number: TypeHandle,
    string: TypeHandle,
}

fn operator_fixture() -> OperatorFixture {
    let language = ExprLanguage::default();
    let ts = engine_for(&language);
    let number = ts.create_primitive("number");
    let string = ts.create_primitive("string");

    ts.add_inference_rule(
        Rc::new(LiteralRule {
            language: language.clone(),
            number,
            string,
        }),
        InferenceRuleOptions {
            language_key: Some("Expression".to_string()),
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

    OperatorFixture {
        ts,
        language,
        number,
        string,
    }
}

#[test]
fn scenario_operator_overloads() {
    let f = operator_fixture();

    // "a" - "b": one issue mentioning that no overload of '-' applies.
    let subtraction = f
        .language
        .binary('-', f.language.string(), f.language.string());
    let problems = validate_tree(&f.ts, &f.language, subtraction);
    assert_eq!(problems.len(), 1);
    assert!(problems[0].message.contains("no applicable overload"));
    assert!(problems[0].message.contains('-'));

    // "a" + 2 with number -> string implicit in place: clean, and the
    // expression infers as string.
    f.ts
        .mark_as_convertible(&[f.number], &[f.string], ConversionMode::ImplicitExplicit);
    let addition = f.language.binary('+', f.language.string(), f.language.number());
    assert_eq!(f.ts.infer_type(addition), Ok(f.string));
    assert!(validate_tree(&f.ts, &f.language, addition).is_empty());
}

#[test]
fn scenario_operator_overload_resolution_is_unique_or_problem() {
    let f = operator_fixture();

    // Exactly one overload resolves per well-typed call site.
    let numbers = f.language.binary('+', f.language.number(), f.language.number());
    assert_eq!(f.ts.infer_type(numbers), Ok(f.number));

    // A call matching no overload is an inference problem, not a panic.
    let mixed = f.language.binary('-', f.language.string(), f.language.number());
    let problems = f.ts.infer_type(mixed).unwrap_err();
    assert!(problems.iter().any(|p| matches!(
        p,
        tyck::Problem::Inference(ip) if ip.kind == InferenceProblemKind::NoMatchingOverload
    )));
}

// =============================================================================
// Scenario 4: nominal class subtyping
// =============================================================================

#[test]
fn scenario_nominal_class_subtyping() {
    let language = ExprLanguage::default();
    let ts = engine_for(&language);

    let animal = ts
        .create_class(ClassDetails {
            name: "Animal".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_classes: Vec::new(),
        })
        .get_type_final()
        .unwrap();
    let dog = ts
        .create_class(ClassDetails {
            name: "Dog".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_classes: vec![TypeSelector::Direct(animal)],
        })
        .get_type_final()
        .unwrap();
    let cat = ts
        .create_class(ClassDetails {
            name: "Cat".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_classes: vec![TypeSelector::Direct(animal)],
        })
        .get_type_final()
        .unwrap();

    assert!(ts.is_sub_type(dog, animal));
    assert!(!ts.is_sub_type(cat, dog));
    assert!(ts.is_assignable(dog, animal));
}

// =============================================================================
// Scenario 5: delayed creation
// =============================================================================

#[test]
fn scenario_delayed_creation() {
    let language = ExprLanguage::default();
    let ts = engine_for(&language);
    let kind = ts.create_custom_kind(CustomKindConfig::named("item"));

    let mut properties = IndexMap::new();
    properties.insert(
        "depends_on".to_string(),
        CustomProperty::Type(TypeReference::new(TypeSelector::ById(
            "custom-item-C1".to_string(),
        ))),
    );
    let c2 = kind.create(
        &ts,
        CustomDetails {
            name: Some("C2".to_string()),
            properties,
        },
    );

    // C1 does not exist yet: C2 stays unfinished.
    assert_eq!(c2.get_type_final(), None);

    let c1 = kind.create(
        &ts,
        CustomDetails {
            name: Some("C1".to_string()),
            properties: IndexMap::new(),
        },
    );
    let c1_handle = c1.get_type_final().unwrap();

    // C1's arrival finished C2; the property resolves to C1.
    let c2_handle = c2.get_type_final().expect("C2 finished after C1 arrived");
    let refs = ts.graph().node(c2_handle).unwrap().all_refs();
    assert_eq!(refs[0].resolved(), Some(c1_handle));
}

// =============================================================================
// Scenario 6: function equality under primitive equality
// =============================================================================

#[test]
fn scenario_function_equality_is_live() {
    let language = ExprLanguage::default();
    let ts = engine_for(&language);
    let a = ts.create_primitive("A");
    let b = ts.create_primitive("B");
    ts.create_primitive("void");

    let make = |param: TypeHandle| {
        ts.create_function(FunctionDetails {
            function_name: "f".to_string(),
            input_parameters: vec![ParameterDetails {
                name: "p1".to_string(),
                ty: TypeSelector::Direct(param),
            }],
            output_parameter: Some(ParameterDetails {
                name: "out".to_string(),
                ty: TypeSelector::ById("void".to_string()),
            }),
        })
        .finish()
        .get_type_final()
        .unwrap()
    };
    let f_a = make(a);
    let f_b = make(b);

    assert!(!ts.are_equal(f_a, f_b));
    ts.mark_as_equal(a, b);
    assert!(ts.are_equal(f_a, f_b));
    ts.unmark_as_equal(a, b);
    assert!(!ts.are_equal(f_a, f_b));
}

// =============================================================================
// DI overrides
// =============================================================================

#[test]
fn di_module_overrides_kind_configurations() {
    let ts = create_type_system(TypeSystemModule {
        top_name: Some("value".to_string()),
        classes: Some(tyck::ClassKindConfig {
            maximum_number_of_super_classes: 2,
            ..Default::default()
        }),
        ..Default::default()
    });

    let top = ts.get_or_create_top();
    assert_eq!(ts.type_name(top), "value");

    let a = ts
        .create_class(ClassDetails {
            name: "A".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_classes: Vec::new(),
        })
        .get_type_final()
        .unwrap();
    let b = ts
        .create_class(ClassDetails {
            name: "B".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_classes: Vec::new(),
        })
        .get_type_final()
        .unwrap();
    // Two supers are fine under the overridden configuration.
    let c = ts
        .create_class(ClassDetails {
            name: "C".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_classes: vec![TypeSelector::Direct(a), TypeSelector::Direct(b)],
        })
        .get_type_final()
        .unwrap();
    assert!(ts.is_sub_type(c, a));
    assert!(ts.is_sub_type(c, b));
}
