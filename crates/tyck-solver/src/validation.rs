//! The validation collector.
//!
//! Rules register under an optional language key and may carry `before` /
//! `after` hooks. The host drives the tree visit and calls `validate` per
//! node; `validate_before` and `validate_after` frame the visit for
//! aggregate checks.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;
use tyck_common::{LanguageKey, NodeHandle, TypeHandle, ValidationProblem};

use crate::kinds::function::FunctionKind;
use crate::system::TypeSystem;

/// One validation rule.
pub trait ValidationRule {
    /// Inspect one node; emit problems through `accept`.
    fn validate(
        &self,
        ts: &TypeSystem,
        node: NodeHandle,
        accept: &mut dyn FnMut(ValidationProblem),
    );

    /// Hook run once before the tree visit.
    fn before(
        &self,
        _ts: &TypeSystem,
        _root: NodeHandle,
        _accept: &mut dyn FnMut(ValidationProblem),
    ) {
    }

    /// Hook run once after the tree visit; the place for aggregate checks.
    fn after(
        &self,
        _ts: &TypeSystem,
        _root: NodeHandle,
        _accept: &mut dyn FnMut(ValidationProblem),
    ) {
    }
}

/// Registration options of a validation rule.
#[derive(Clone, Default)]
pub struct ValidationRuleOptions {
    /// Restrict `validate` to nodes of this language key (and sub keys).
    pub language_key: Option<LanguageKey>,
    /// Remove the rule automatically when this type leaves the graph.
    pub bound_to_type: Option<TypeHandle>,
}

/// The validation collector surface.
pub trait ValidationApi {
    fn add_rule(&self, rule: Rc<dyn ValidationRule>, options: ValidationRuleOptions);

    /// Remove every rule bound to this type.
    fn remove_rules_bound_to(&self, ty: TypeHandle);

    /// Run all `before` hooks.
    fn validate_before(&self, ts: &TypeSystem, root: NodeHandle) -> Vec<ValidationProblem>;

    /// Run the rules matching this node's language key.
    fn validate(&self, ts: &TypeSystem, node: NodeHandle) -> Vec<ValidationProblem>;

    /// Run all `after` hooks.
    fn validate_after(&self, ts: &TypeSystem, root: NodeHandle) -> Vec<ValidationProblem>;
}

struct RegisteredRule {
    rule: Rc<dyn ValidationRule>,
    bound_to: Option<TypeHandle>,
}

/// Default validation collector.
pub struct DefaultValidation {
    rules: RefCell<IndexMap<LanguageKey, Vec<RegisteredRule>>>,
    catch_all: RefCell<Vec<RegisteredRule>>,
}

impl DefaultValidation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: RefCell::new(IndexMap::new()),
            catch_all: RefCell::new(Vec::new()),
        }
    }

    /// All rules, keyed buckets in registration order, catch-alls last.
    fn all_rules(&self) -> Vec<Rc<dyn ValidationRule>> {
        let mut result = Vec::new();
        for bucket in self.rules.borrow().values() {
            result.extend(bucket.iter().map(|r| Rc::clone(&r.rule)));
        }
        result.extend(self.catch_all.borrow().iter().map(|r| Rc::clone(&r.rule)));
        result
    }

    fn rules_for(&self, ts: &TypeSystem, node: NodeHandle) -> Vec<Rc<dyn ValidationRule>> {
        let mut result = Vec::new();
        if let Some(key) = ts.language().node_key(node) {
            let rules = self.rules.borrow();
            let mut buckets = vec![key.clone()];
            buckets.extend(ts.language().all_super_keys(&key));
            for bucket in buckets {
                if let Some(registered) = rules.get(&bucket) {
                    result.extend(registered.iter().map(|r| Rc::clone(&r.rule)));
                }
            }
        }
        result.extend(self.catch_all.borrow().iter().map(|r| Rc::clone(&r.rule)));
        result
    }
}

impl Default for DefaultValidation {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationApi for DefaultValidation {
    fn add_rule(&self, rule: Rc<dyn ValidationRule>, options: ValidationRuleOptions) {
        let registered = RegisteredRule {
            rule,
            bound_to: options.bound_to_type,
        };
        match options.language_key {
            Some(key) => self
                .rules
                .borrow_mut()
                .entry(key)
                .or_default()
                .push(registered),
            None => self.catch_all.borrow_mut().push(registered),
        }
    }

    fn remove_rules_bound_to(&self, ty: TypeHandle) {
        for bucket in self.rules.borrow_mut().values_mut() {
            bucket.retain(|r| r.bound_to != Some(ty));
        }
        self.catch_all.borrow_mut().retain(|r| r.bound_to != Some(ty));
    }

    fn validate_before(&self, ts: &TypeSystem, root: NodeHandle) -> Vec<ValidationProblem> {
        let mut problems = Vec::new();
        for rule in self.all_rules() {
            rule.before(ts, root, &mut |p| problems.push(p));
        }
        problems
    }

    fn validate(&self, ts: &TypeSystem, node: NodeHandle) -> Vec<ValidationProblem> {
        let mut problems = Vec::new();
        for rule in self.rules_for(ts, node) {
            rule.validate(ts, node, &mut |p| problems.push(p));
        }
        trace!(?node, count = problems.len(), "validated node");
        problems
    }

    fn validate_after(&self, ts: &TypeSystem, root: NodeHandle) -> Vec<ValidationProblem> {
        let mut problems = Vec::new();
        for rule in self.all_rules() {
            rule.after(ts, root, &mut |p| problems.push(p));
        }
        problems
    }
}

/// Report when an inferred source type may not flow into a target slot.
///
/// Convenience for host rules checking declarations with initial values.
#[must_use]
pub fn check_assignable(
    ts: &TypeSystem,
    node: NodeHandle,
    source: TypeHandle,
    target: TypeHandle,
) -> Option<ValidationProblem> {
    let problem = ts.assignability_problem(source, target)?;
    Some(
        ValidationProblem::error(
            node,
            format!(
                "type '{}' is not assignable to type '{}'",
                ts.type_name(source),
                ts.type_name(target)
            ),
        )
        .with_sub_problems(vec![problem]),
    )
}

/// Reports classes that dropped to `Invalid` because a declared super-class
/// was removed from the graph.
pub struct InvalidClassRule;

impl ValidationRule for InvalidClassRule {
    fn validate(
        &self,
        _ts: &TypeSystem,
        _node: NodeHandle,
        _accept: &mut dyn FnMut(ValidationProblem),
    ) {
    }

    fn after(&self, ts: &TypeSystem, root: NodeHandle, accept: &mut dyn FnMut(ValidationProblem)) {
        use tyck_graph::{TypeInitializationState, TypePayload};
        for handle in ts.graph().all_registered() {
            let Some(data) = ts.graph().node(handle) else {
                continue;
            };
            if data.state() != TypeInitializationState::Invalid {
                continue;
            }
            if let TypePayload::Class(class) = data.payload() {
                accept(ValidationProblem::error(
                    root,
                    format!(
                        "class '{}' is invalid: a type it depends on was removed",
                        class.name
                    ),
                ));
            }
        }
    }
}

/// Reports function signatures registered more than once under one name.
pub struct UniqueFunctionSignatureRule {
    pub functions: Rc<FunctionKind>,
}

impl ValidationRule for UniqueFunctionSignatureRule {
    fn validate(
        &self,
        _ts: &TypeSystem,
        _node: NodeHandle,
        _accept: &mut dyn FnMut(ValidationProblem),
    ) {
    }

    fn after(&self, ts: &TypeSystem, root: NodeHandle, accept: &mut dyn FnMut(ValidationProblem)) {
        for (name, handle) in self.functions.duplicate_signatures() {
            accept(ValidationProblem::error(
                root,
                format!(
                    "function '{name}' is declared multiple times with the signature '{}'",
                    ts.type_name(handle)
                ),
            ));
        }
    }
}
