//! Diagnostic rendering.
//!
//! Types print as their kind-specific user-visible name; problems print as
//! an indented multi-line tree, one `-> ` arrow per nesting level.

use tyck_common::{
    ConflictIndex, ConversionMode, InferenceProblemKind, Problem, Severity, TypeHandle,
    ValidationProblem,
};

use crate::system::TypeSystem;

/// The printing surface.
pub trait PrinterApi {
    /// User-visible name of a type.
    fn type_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String;

    /// Render a problem with its sub-problem tree.
    fn print_problem(&self, ts: &TypeSystem, problem: &Problem) -> String;
}

pub struct DefaultPrinter;

impl PrinterApi for DefaultPrinter {
    fn type_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String {
        match ts.graph().node(handle) {
            Some(data) => ts.kinds().kind_of(&data).user_name(ts, handle),
            None => "<removed>".to_string(),
        }
    }

    fn print_problem(&self, ts: &TypeSystem, problem: &Problem) -> String {
        let mut out = String::new();
        render(self, ts, problem, 0, &mut out);
        out
    }
}

fn render(printer: &dyn PrinterApi, ts: &TypeSystem, problem: &Problem, level: usize, out: &mut String) {
    if level > 0 {
        out.push('\n');
        for _ in 0..(level - 1) {
            out.push_str("    ");
        }
        out.push_str("-> ");
    }
    out.push_str(&headline(printer, ts, problem));
    for sub in problem.sub_problems() {
        render(printer, ts, sub, level + 1, out);
    }
}

fn headline(printer: &dyn PrinterApi, ts: &TypeSystem, problem: &Problem) -> String {
    let name = |h: TypeHandle| printer.type_name(ts, h);
    match problem {
        Problem::ValueConflict(p) => {
            let first = p.first.as_deref().unwrap_or("<missing>");
            let second = p.second.as_deref().unwrap_or("<missing>");
            format!("conflicting {}: {first} vs {second}", p.location)
        }
        Problem::IndexedTypeConflict(p) => {
            let expected = p.expected.map_or_else(|| "<none>".to_string(), name);
            let actual = p.actual.map_or_else(|| "<none>".to_string(), name);
            match &p.index {
                ConflictIndex::Position(i) => {
                    format!("at index {i}: expected '{expected}', found '{actual}'")
                }
                ConflictIndex::Property(key) => {
                    format!("at property '{key}': expected '{expected}', found '{actual}'")
                }
            }
        }
        Problem::TypeEquality(p) => format!(
            "types '{}' and '{}' are not equal",
            name(p.first),
            name(p.second)
        ),
        Problem::SubType(p) => format!(
            "type '{}' is not a subtype of '{}'",
            name(p.sub),
            name(p.sup)
        ),
        Problem::Conversion(p) => {
            let how = match p.required {
                ConversionMode::ImplicitExplicit => "implicitly convertible",
                _ => "convertible",
            };
            format!(
                "type '{}' is not {how} to type '{}'",
                name(p.from),
                name(p.to)
            )
        }
        Problem::Assignability(p) => format!(
            "type '{}' is not assignable to type '{}'",
            name(p.source),
            name(p.target)
        ),
        Problem::Inference(p) => match p.kind {
            InferenceProblemKind::NoRuleApplicable => {
                format!("no inference rule applies at {}", p.location)
            }
            InferenceProblemKind::ChildInferenceFailed => {
                format!("a nested node could not be inferred ({})", p.location)
            }
            InferenceProblemKind::AmbiguousOverload => {
                format!("the call of '{}' is ambiguous", p.location)
            }
            InferenceProblemKind::NoMatchingOverload => {
                format!("no applicable overload of '{}'", p.location)
            }
            InferenceProblemKind::PendingCycle => {
                format!("inference did not terminate with a type ({})", p.location)
            }
        },
        Problem::Validation(p) => format!("{}: {}", severity_text(p.severity), p.message),
    }
}

fn severity_text(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
        Severity::Hint => "hint",
    }
}

/// Render a validation problem directly (outside a `Problem` wrapper).
#[must_use]
pub fn print_validation_problem(
    printer: &dyn PrinterApi,
    ts: &TypeSystem,
    problem: &ValidationProblem,
) -> String {
    printer.print_problem(ts, &Problem::Validation(problem.clone()))
}
