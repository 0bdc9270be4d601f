//! Printer tests: user-visible type names and the indented problem tree.

use std::rc::Rc;

use tyck_common::NoLanguage;
use tyck_graph::TypeSelector;

use crate::kinds::function::{FunctionDetails, ParameterDetails};
use crate::system::TypeSystem;

fn engine() -> TypeSystem {
    TypeSystem::new(Rc::new(NoLanguage))
}

#[test]
fn function_types_print_with_parameters_and_output() {
    let ts = engine();
    let integer = ts.create_primitive("integer");
    let string = ts.create_primitive("string");

    let f = ts
        .create_function(FunctionDetails {
            function_name: "concat".to_string(),
            input_parameters: vec![
                ParameterDetails {
                    name: "left".to_string(),
                    ty: TypeSelector::Direct(string),
                },
                ParameterDetails {
                    name: "count".to_string(),
                    ty: TypeSelector::Direct(integer),
                },
            ],
            output_parameter: Some(ParameterDetails {
                name: "result".to_string(),
                ty: TypeSelector::Direct(string),
            }),
        })
        .finish()
        .get_type_final()
        .unwrap();

    assert_eq!(
        ts.type_name(f),
        "concat(left: string, count: integer) => string"
    );
}

#[test]
fn problem_tree_is_indented_with_arrows() {
    let ts = engine();
    let a = ts.create_primitive("alpha");
    let b = ts.create_primitive("beta");

    let problem = ts.assignability_problem(a, b).expect("not assignable");
    let printed = ts.print_problem(&problem);

    let lines: Vec<&str> = printed.lines().collect();
    assert!(
        lines[0].contains("'alpha' is not assignable to type 'beta'"),
        "headline: {}",
        lines[0]
    );
    // Each nesting level gets one arrow, indented one step further.
    assert!(lines.len() >= 3, "sub-problems are rendered: {printed}");
    assert!(lines[1].starts_with("-> "), "first level: {}", lines[1]);
    assert!(
        lines
            .iter()
            .skip(1)
            .all(|l| l.trim_start().starts_with("-> ")),
        "every sub-line carries an arrow: {printed}"
    );
}

#[test]
fn removed_types_print_as_removed() {
    let ts = engine();
    let temp = ts.create_primitive("temp");
    ts.remove_type(temp);
    assert_eq!(ts.type_name(temp), "<removed>");
}
