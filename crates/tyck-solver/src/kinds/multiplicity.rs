//! The multiplicity kind (`inner[lower..upper]`).
//!
//! Bounds are `i64` with `UNLIMITED` (-1) standing for no upper bound.
//! `sub[a..b] <: sup[c..d]` iff `a >= c`, `b <= d` (unlimited compares as
//! +infinity), and the inner types are subtypes.

use std::rc::Rc;

use tyck_common::{Problem, TypeHandle, ValueConflict};
use tyck_graph::{
    MultiplicityTypeData, TypeData, TypePayload, TypeRef, TypeReference, TypeSelector, UNLIMITED,
};

use crate::initializer::TypeInitializer;
use crate::kind::Kind;
use crate::system::TypeSystem;

pub const MULTIPLICITY_KIND_NAME: &str = "multiplicity";

#[derive(Clone, Debug)]
pub struct MultiplicityKindConfig {
    /// Symbol rendered for an unlimited upper bound.
    pub symbol_for_unlimited: String,
}

impl Default for MultiplicityKindConfig {
    fn default() -> Self {
        Self {
            symbol_for_unlimited: "*".to_string(),
        }
    }
}

pub struct MultiplicityKind {
    pub config: MultiplicityKindConfig,
}

impl MultiplicityKind {
    #[must_use]
    pub fn new(config: MultiplicityKindConfig) -> Self {
        Self { config }
    }

    /// Create `inner[lower..upper]`; the inner type may not exist yet.
    pub fn create(
        self: &Rc<Self>,
        ts: &TypeSystem,
        inner: TypeSelector,
        lower: i64,
        upper: i64,
    ) -> Rc<TypeInitializer> {
        assert!(lower >= 0, "lower bound must be non-negative");
        assert!(
            upper >= 0 || upper == UNLIMITED,
            "upper bound must be non-negative or UNLIMITED"
        );
        let data = TypeData::new(TypePayload::Multiplicity(MultiplicityTypeData {
            inner: TypeReference::new(inner),
            lower,
            upper,
        }));
        ts.submit_initializer(Rc::clone(self) as Rc<dyn Kind>, data)
    }

    /// The existing multiplicity type for these parts, if any.
    #[must_use]
    pub fn get(
        &self,
        ts: &TypeSystem,
        inner: &TypeSelector,
        lower: i64,
        upper: i64,
    ) -> Option<TypeHandle> {
        use crate::kind::clone_selector;
        let data = TypeData::new(TypePayload::Multiplicity(MultiplicityTypeData {
            inner: TypeReference::new(clone_selector(inner)),
            lower,
            upper,
        }));
        for reference in data.all_refs() {
            let _ = reference.try_resolve(ts);
        }
        let identifier = self.calculate_identifier(ts, &data)?;
        ts.graph().get_type(&identifier)
    }

    fn bound_text(&self, bound: i64) -> String {
        if bound == UNLIMITED {
            self.config.symbol_for_unlimited.clone()
        } else {
            bound.to_string()
        }
    }
}

/// `value <= bound` where `UNLIMITED` is +infinity.
fn within(value: i64, bound: i64) -> bool {
    bound == UNLIMITED || (value != UNLIMITED && value <= bound)
}

fn payload(ts: &TypeSystem, handle: TypeHandle) -> Option<(TypeHandle, i64, i64)> {
    let data = ts.graph().node(handle)?;
    match data.payload() {
        TypePayload::Multiplicity(m) => Some((m.inner.resolved()?, m.lower, m.upper)),
        _ => None,
    }
}

impl Kind for MultiplicityKind {
    fn name(&self) -> &str {
        MULTIPLICITY_KIND_NAME
    }

    fn calculate_identifier(&self, ts: &TypeSystem, data: &TypeData) -> Option<String> {
        match data.payload() {
            TypePayload::Multiplicity(m) => {
                let inner = m.inner.resolved()?;
                let inner_id = ts.graph().node(inner)?.identifier()?;
                Some(format!(
                    "{inner_id}[{}..{}]",
                    m.lower,
                    self.bound_text(m.upper)
                ))
            }
            _ => None,
        }
    }

    fn identifiability_refs(&self, data: &TypeData) -> Vec<TypeRef> {
        data.all_refs()
    }

    fn analyze_equality(&self, ts: &TypeSystem, a: TypeHandle, b: TypeHandle) -> Vec<Problem> {
        let mut problems = Vec::new();
        let (Some((inner_a, lo_a, hi_a)), Some((inner_b, lo_b, hi_b))) =
            (payload(ts, a), payload(ts, b))
        else {
            return vec![Problem::ValueConflict(ValueConflict {
                first: None,
                second: None,
                location: "multiplicity payload".to_string(),
            })];
        };
        if lo_a != lo_b {
            problems.push(Problem::ValueConflict(ValueConflict {
                first: Some(lo_a.to_string()),
                second: Some(lo_b.to_string()),
                location: "lower bound".to_string(),
            }));
        }
        if hi_a != hi_b {
            problems.push(Problem::ValueConflict(ValueConflict {
                first: Some(self.bound_text(hi_a)),
                second: Some(self.bound_text(hi_b)),
                location: "upper bound".to_string(),
            }));
        }
        if let Some(problem) = ts.equality_problem(inner_a, inner_b) {
            problems.push(problem);
        }
        problems
    }

    fn analyze_sub_type(&self, ts: &TypeSystem, sub: TypeHandle, sup: TypeHandle) -> Vec<Problem> {
        let mut problems = Vec::new();
        let (Some((inner_sub, lo_sub, hi_sub)), Some((inner_sup, lo_sup, hi_sup))) =
            (payload(ts, sub), payload(ts, sup))
        else {
            return vec![Problem::ValueConflict(ValueConflict {
                first: None,
                second: None,
                location: "multiplicity payload".to_string(),
            })];
        };
        // The sub range must lie inside the super range.
        if lo_sub < lo_sup {
            problems.push(Problem::ValueConflict(ValueConflict {
                first: Some(lo_sub.to_string()),
                second: Some(lo_sup.to_string()),
                location: "lower bound".to_string(),
            }));
        }
        if !within(hi_sub, hi_sup) {
            problems.push(Problem::ValueConflict(ValueConflict {
                first: Some(self.bound_text(hi_sub)),
                second: Some(self.bound_text(hi_sup)),
                location: "upper bound".to_string(),
            }));
        }
        if let Some(problem) = ts.sub_type_problem(inner_sub, inner_sup) {
            problems.push(problem);
        }
        problems
    }

    fn user_name(&self, ts: &TypeSystem, handle: TypeHandle) -> String {
        match payload(ts, handle) {
            Some((inner, lower, upper)) => format!(
                "{}[{}..{}]",
                ts.type_name(inner),
                lower,
                self.bound_text(upper)
            ),
            None => "<multiplicity>".to_string(),
        }
    }
}
