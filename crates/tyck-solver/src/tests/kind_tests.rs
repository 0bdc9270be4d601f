//! Kind-specific identity, equality, and subtyping tests.

use std::rc::Rc;

use tyck_common::NoLanguage;
use tyck_graph::{TypeSelector, UNLIMITED};

use crate::kind::SubTypeCheckingStrategy;
use crate::kinds::classes::{ClassDetails, ClassKindConfig, ClassTyping, FieldDetails};
use crate::kinds::fixed_parameters::FixedParametersKindConfig;
use crate::kinds::function::{FunctionDetails, ParameterDetails};
use crate::system::{TypeSystem, TypeSystemBuilder};

fn engine() -> TypeSystem {
    TypeSystem::new(Rc::new(NoLanguage))
}

fn by_id(name: &str) -> TypeSelector {
    TypeSelector::ById(name.to_string())
}

// =============================================================================
// Primitives
// =============================================================================

#[test]
#[should_panic(expected = "already exists")]
fn duplicate_primitive_name_is_a_programmer_error() {
    let ts = engine();
    ts.create_primitive("integer");
    ts.create_primitive("integer");
}

#[test]
fn primitive_identifier_is_its_name() {
    let ts = engine();
    let integer = ts.create_primitive("integer");
    assert_eq!(ts.graph().get_type("integer"), Some(integer));
    assert_eq!(ts.get_primitive("integer"), Some(integer));
    assert_eq!(ts.get_primitive("string"), None);
}

#[test]
fn distinct_primitives_are_unrelated() {
    let ts = engine();
    let a = ts.create_primitive("a");
    let b = ts.create_primitive("b");
    assert!(!ts.are_equal(a, b));
    assert!(!ts.is_sub_type(a, b));
    assert!(!ts.is_assignable(a, b));
}

// =============================================================================
// Functions
// =============================================================================

fn unary_function(ts: &TypeSystem, name: &str, param: &str, output: &str) -> tyck_common::TypeHandle {
    ts.create_function(FunctionDetails {
        function_name: name.to_string(),
        input_parameters: vec![ParameterDetails {
            name: "p1".to_string(),
            ty: by_id(param),
        }],
        output_parameter: Some(ParameterDetails {
            name: "out".to_string(),
            ty: by_id(output),
        }),
    })
    .finish()
    .get_type_final()
    .expect("parameter types exist, the function finishes synchronously")
}

#[test]
fn function_identity_is_structural() {
    let ts = engine();
    ts.create_primitive("A");
    ts.create_primitive("void");

    let first = unary_function(&ts, "f", "A", "void");
    // The same signature resolves to the same type (initializer dedup).
    let second = unary_function(&ts, "f", "A", "void");
    assert_eq!(first, second);

    // A different parameter type yields a different type.
    ts.create_primitive("B");
    let third = unary_function(&ts, "f", "B", "void");
    assert_ne!(first, third);
}

#[test]
fn factories_find_existing_types_by_details() {
    let ts = engine();
    ts.create_primitive("A");
    ts.create_primitive("void");

    let details = FunctionDetails {
        function_name: "f".to_string(),
        input_parameters: vec![ParameterDetails {
            name: "p1".to_string(),
            ty: by_id("A"),
        }],
        output_parameter: Some(ParameterDetails {
            name: "out".to_string(),
            ty: by_id("void"),
        }),
    };
    assert_eq!(ts.get_function(&details), None);
    let created = unary_function(&ts, "f", "A", "void");
    assert_eq!(ts.get_function(&details), Some(created));

    let list = ts
        .create_fixed_parameters("List", vec![by_id("A")])
        .get_type_final()
        .unwrap();
    assert_eq!(ts.get_fixed_parameters("List", &[by_id("A")]), Some(list));
    assert_eq!(ts.get_fixed_parameters("Set", &[by_id("A")]), None);

    let class = ts
        .create_class(ClassDetails {
            name: "Widget".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_classes: Vec::new(),
        })
        .get_type_final()
        .unwrap();
    assert_eq!(
        ts.get_class(&ClassDetails {
            name: "Widget".to_string(),
            fields: Vec::new(),
            methods: Vec::new(),
            super_classes: Vec::new(),
        }),
        Some(class)
    );
}

#[test]
fn function_equality_follows_parameter_equality() {
    let ts = engine();
    ts.create_primitive("A");
    ts.create_primitive("B");
    ts.create_primitive("void");
    let f_a = unary_function(&ts, "f", "A", "void");
    let f_b = unary_function(&ts, "f", "B", "void");

    assert!(!ts.are_equal(f_a, f_b));

    // Equality is a live relation: marking the parameter types equal makes
    // the functions equal, unmarking reverts it.
    let a = ts.get_primitive("A").unwrap();
    let b = ts.get_primitive("B").unwrap();
    ts.mark_as_equal(a, b);
    assert!(ts.are_equal(f_a, f_b));
    ts.unmark_as_equal(a, b);
    assert!(!ts.are_equal(f_a, f_b));
}

#[test]
fn function_subtyping_is_contravariant_in_parameters() {
    let ts = TypeSystemBuilder::new()
        .function_config(crate::kinds::function::FunctionKindConfig {
            subtype_parameter_checking: SubTypeCheckingStrategy::SubType,
            ..Default::default()
        })
        .build();
    let animal = ts.create_primitive("animal");
    let dog = ts.create_primitive("dog");
    ts.mark_as_sub_type(dog, animal);
    ts.create_primitive("void");

    let takes_animal = unary_function(&ts, "g", "animal", "void");
    let takes_dog = unary_function(&ts, "g", "dog", "void");

    // A function accepting every animal may stand in where one accepting
    // dogs is expected, not vice versa.
    assert!(ts.is_sub_type(takes_animal, takes_dog));
    assert!(!ts.is_sub_type(takes_dog, takes_animal));
}

// =============================================================================
// Classes
// =============================================================================

#[test]
fn nominal_class_subtyping_follows_the_super_chain() {
    let ts = engine();
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
    assert!(ts.is_sub_type(cat, animal));
    assert!(!ts.is_sub_type(cat, dog));
    assert!(!ts.is_sub_type(animal, dog));
    assert!(ts.is_assignable(dog, animal));
    assert!(!ts.is_assignable(animal, dog));
}

#[test]
#[should_panic(expected = "super-classes")]
fn too_many_super_classes_is_a_programmer_error() {
    let ts = engine();
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
    // The default configuration allows a single super-class.
    ts.create_class(ClassDetails {
        name: "C".to_string(),
        fields: Vec::new(),
        methods: Vec::new(),
        super_classes: vec![TypeSelector::Direct(a), TypeSelector::Direct(b)],
    });
}

#[test]
fn structural_class_identity_ignores_the_name() {
    let ts = TypeSystemBuilder::new()
        .class_config(ClassKindConfig {
            typing: ClassTyping::Structural,
            ..Default::default()
        })
        .build();
    ts.create_primitive("integer");

    let first = ts
        .create_class(ClassDetails {
            name: "Point".to_string(),
            fields: vec![FieldDetails {
                name: "x".to_string(),
                ty: by_id("integer"),
            }],
            methods: Vec::new(),
            super_classes: Vec::new(),
        })
        .get_type_final()
        .unwrap();
    let second = ts
        .create_class(ClassDetails {
            name: "Coordinate".to_string(),
            fields: vec![FieldDetails {
                name: "x".to_string(),
                ty: by_id("integer"),
            }],
            methods: Vec::new(),
            super_classes: Vec::new(),
        })
        .get_type_final()
        .unwrap();

    // Same shape, different names: the same type.
    assert_eq!(first, second);
}

#[test]
fn structural_class_subtyping_checks_fields() {
    let ts = TypeSystemBuilder::new()
        .class_config(ClassKindConfig {
            typing: ClassTyping::Structural,
            ..Default::default()
        })
        .build();
    ts.create_primitive("integer");
    ts.create_primitive("string");

    let narrow = ts
        .create_class(ClassDetails {
            name: "Narrow".to_string(),
            fields: vec![FieldDetails {
                name: "x".to_string(),
                ty: by_id("integer"),
            }],
            methods: Vec::new(),
            super_classes: Vec::new(),
        })
        .get_type_final()
        .unwrap();
    let wide = ts
        .create_class(ClassDetails {
            name: "Wide".to_string(),
            fields: vec![
                FieldDetails {
                    name: "x".to_string(),
                    ty: by_id("integer"),
                },
                FieldDetails {
                    name: "y".to_string(),
                    ty: by_id("string"),
                },
            ],
            methods: Vec::new(),
            super_classes: Vec::new(),
        })
        .get_type_final()
        .unwrap();

    // The wider shape provides everything the narrow one requires.
    assert!(ts.is_sub_type(wide, narrow));
    assert!(!ts.is_sub_type(narrow, wide));
}

// =============================================================================
// Fixed parameters
// =============================================================================

#[test]
fn fixed_parameters_identity_and_equality() {
    let ts = engine();
    ts.create_primitive("integer");
    ts.create_primitive("string");

    let ints = ts
        .create_fixed_parameters("List", vec![by_id("integer")])
        .get_type_final()
        .unwrap();
    let ints_again = ts
        .create_fixed_parameters("List", vec![by_id("integer")])
        .get_type_final()
        .unwrap();
    let strings = ts
        .create_fixed_parameters("List", vec![by_id("string")])
        .get_type_final()
        .unwrap();

    assert_eq!(ints, ints_again);
    assert_ne!(ints, strings);
    assert!(!ts.are_equal(ints, strings));
    assert_eq!(ts.type_name(ints), "List<integer>");
}

#[test]
fn fixed_parameters_subtyping_uses_the_configured_strategy() {
    let ts = TypeSystemBuilder::new()
        .fixed_parameters_config(FixedParametersKindConfig {
            parameter_subtype_checking_strategy: SubTypeCheckingStrategy::SubType,
        })
        .build();
    let animal = ts.create_primitive("animal");
    let dog = ts.create_primitive("dog");
    ts.mark_as_sub_type(dog, animal);

    let dogs = ts
        .create_fixed_parameters("List", vec![TypeSelector::Direct(dog)])
        .get_type_final()
        .unwrap();
    let animals = ts
        .create_fixed_parameters("List", vec![TypeSelector::Direct(animal)])
        .get_type_final()
        .unwrap();
    let sets = ts
        .create_fixed_parameters("Set", vec![TypeSelector::Direct(dog)])
        .get_type_final()
        .unwrap();

    assert!(ts.is_sub_type(dogs, animals));
    assert!(!ts.is_sub_type(animals, dogs));
    // Different bases never relate.
    assert!(!ts.is_sub_type(sets, animals));
}

// =============================================================================
// Multiplicities
// =============================================================================

#[test]
fn multiplicity_subtyping_narrows_the_range() {
    let ts = engine();
    let item = ts.create_primitive("item");

    let narrow = ts
        .create_multiplicity(TypeSelector::Direct(item), 1, 3)
        .get_type_final()
        .unwrap();
    let wide = ts
        .create_multiplicity(TypeSelector::Direct(item), 0, UNLIMITED)
        .get_type_final()
        .unwrap();

    // [1..3] fits inside [0..*].
    assert!(ts.is_sub_type(narrow, wide));
    assert!(!ts.is_sub_type(wide, narrow));
    assert_eq!(ts.type_name(wide), "item[0..*]");
    assert_eq!(ts.type_name(narrow), "item[1..3]");
}

#[test]
fn multiplicity_equality_needs_equal_bounds_and_inner() {
    let ts = engine();
    let item = ts.create_primitive("item");

    let a = ts
        .create_multiplicity(TypeSelector::Direct(item), 0, 5)
        .get_type_final()
        .unwrap();
    let b = ts
        .create_multiplicity(TypeSelector::Direct(item), 0, 5)
        .get_type_final()
        .unwrap();
    let c = ts
        .create_multiplicity(TypeSelector::Direct(item), 1, 5)
        .get_type_final()
        .unwrap();

    assert_eq!(a, b);
    assert!(!ts.are_equal(a, c));
}
