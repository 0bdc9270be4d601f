//! The inference service.
//!
//! Rules are registered under an optional language key and tried in
//! declaration order; catch-all rules run last. A rule may produce a type
//! directly or request the inference of child nodes first. The pending
//! cache breaks cycles: re-entering a node already being inferred yields
//! nothing, and nothing is memoized for it.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::trace;
use tyck_common::{
    InferenceProblem, InferenceProblemKind, LanguageKey, NodeHandle, Problem, TypeHandle,
};

use crate::system::TypeSystem;

/// What one rule evaluation produced.
pub enum InferenceRuleOutcome {
    /// The rule does not apply to this node.
    NotApplicable,
    /// The type of the node.
    Inferred(TypeHandle),
    /// Infer these nodes first, then ask the rule again via
    /// `with_children`.
    InferChildren(Vec<NodeHandle>),
    /// The rule applies but the node is ill-typed.
    Failed(InferenceProblem),
}

/// One inference rule: a predicate plus a mapper from a language node to a
/// type.
pub trait InferenceRule {
    fn infer(&self, ts: &TypeSystem, node: NodeHandle) -> InferenceRuleOutcome;

    /// Second phase for rules that returned `InferChildren`; `children`
    /// holds the inferred child types in request order.
    fn with_children(
        &self,
        _ts: &TypeSystem,
        node: NodeHandle,
        _children: &[TypeHandle],
    ) -> Result<TypeHandle, InferenceProblem> {
        Err(InferenceProblem {
            node,
            kind: InferenceProblemKind::ChildInferenceFailed,
            location: "rule requested children but provides no second phase".to_string(),
            sub_problems: Vec::new(),
        })
    }
}

/// Registration options of an inference rule.
#[derive(Clone, Default)]
pub struct InferenceRuleOptions {
    /// Restrict the rule to nodes of this language key (and its sub keys).
    /// Without a key the rule is a catch-all and runs last.
    pub language_key: Option<LanguageKey>,
    /// Remove the rule automatically when this type leaves the graph.
    pub bound_to_type: Option<TypeHandle>,
}

/// Cache entry for one language node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InferenceCacheEntry {
    /// An inference for this node is in progress (cycle break marker).
    Pending,
    Inferred(TypeHandle),
}

/// Node cache of the inference service.
///
/// Swappable so a binding adapter can install a document-scoped store that
/// invalidates on re-index.
pub trait InferenceCache {
    fn get(&self, node: NodeHandle) -> Option<InferenceCacheEntry>;
    fn set(&self, node: NodeHandle, entry: InferenceCacheEntry);
    fn remove(&self, node: NodeHandle);
    fn clear(&self);
}

/// Default in-memory cache.
#[derive(Default)]
pub struct MapInferenceCache {
    entries: RefCell<FxHashMap<NodeHandle, InferenceCacheEntry>>,
}

impl InferenceCache for MapInferenceCache {
    fn get(&self, node: NodeHandle) -> Option<InferenceCacheEntry> {
        self.entries.borrow().get(&node).copied()
    }

    fn set(&self, node: NodeHandle, entry: InferenceCacheEntry) {
        self.entries.borrow_mut().insert(node, entry);
    }

    fn remove(&self, node: NodeHandle) {
        self.entries.borrow_mut().remove(&node);
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// The inference service surface.
pub trait InferenceApi {
    /// The type of `node`, or the problems explaining why there is none.
    fn infer_type(&self, ts: &TypeSystem, node: NodeHandle) -> Result<TypeHandle, Vec<Problem>>;

    /// Like `infer_type` but silent: `None` when the node is not (yet)
    /// inferable, including the cycle-break case.
    fn try_infer(&self, ts: &TypeSystem, node: NodeHandle) -> Option<TypeHandle>;

    fn add_rule(&self, rule: Rc<dyn InferenceRule>, options: InferenceRuleOptions);

    /// Remove every rule bound to this type.
    fn remove_rules_bound_to(&self, ty: TypeHandle);

    fn clear_cache(&self);
}

struct RegisteredRule {
    rule: Rc<dyn InferenceRule>,
    bound_to: Option<TypeHandle>,
}

enum InferOutcome {
    Type(TypeHandle),
    /// The query re-entered a pending node; the caller must not commit.
    Pending,
    Problems(Vec<Problem>),
}

/// Default inference service.
pub struct DefaultInference {
    rules: RefCell<IndexMap<LanguageKey, Vec<RegisteredRule>>>,
    catch_all: RefCell<Vec<RegisteredRule>>,
    cache: Box<dyn InferenceCache>,
}

impl DefaultInference {
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache(Box::new(MapInferenceCache::default()))
    }

    #[must_use]
    pub fn with_cache(cache: Box<dyn InferenceCache>) -> Self {
        Self {
            rules: RefCell::new(IndexMap::new()),
            catch_all: RefCell::new(Vec::new()),
            cache,
        }
    }

    /// Rules applicable to `node`: its own key bucket first, then the
    /// buckets of its super keys, catch-all rules last.
    fn applicable_rules(&self, ts: &TypeSystem, node: NodeHandle) -> Vec<Rc<dyn InferenceRule>> {
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

    fn infer_internal(&self, ts: &TypeSystem, node: NodeHandle) -> InferOutcome {
        match self.cache.get(node) {
            Some(InferenceCacheEntry::Inferred(ty)) => return InferOutcome::Type(ty),
            Some(InferenceCacheEntry::Pending) => {
                trace!(?node, "inference re-entered a pending node");
                return InferOutcome::Pending;
            }
            None => {}
        }
        self.cache.set(node, InferenceCacheEntry::Pending);

        let mut problems: Vec<Problem> = Vec::new();
        for rule in self.applicable_rules(ts, node) {
            match rule.infer(ts, node) {
                InferenceRuleOutcome::NotApplicable => {}
                InferenceRuleOutcome::Inferred(ty) => {
                    self.cache.set(node, InferenceCacheEntry::Inferred(ty));
                    return InferOutcome::Type(ty);
                }
                InferenceRuleOutcome::Failed(problem) => {
                    problems.push(Problem::Inference(problem));
                }
                InferenceRuleOutcome::InferChildren(children) => {
                    let mut child_types = Vec::with_capacity(children.len());
                    let mut child_problems = None;
                    let mut pending = false;
                    for child in children {
                        match self.infer_internal(ts, child) {
                            InferOutcome::Type(ty) => child_types.push(ty),
                            InferOutcome::Pending => {
                                pending = true;
                                break;
                            }
                            InferOutcome::Problems(ps) => {
                                child_problems = Some((child, ps));
                                break;
                            }
                        }
                    }
                    if pending {
                        // A cycle reached back into this node; do not
                        // commit any result for it.
                        self.cache.remove(node);
                        return InferOutcome::Pending;
                    }
                    if let Some((child, ps)) = child_problems {
                        problems.push(Problem::Inference(InferenceProblem {
                            node: child,
                            kind: InferenceProblemKind::ChildInferenceFailed,
                            location: format!("child of {node:?}"),
                            sub_problems: ps,
                        }));
                        continue;
                    }
                    match rule.with_children(ts, node, &child_types) {
                        Ok(ty) => {
                            self.cache.set(node, InferenceCacheEntry::Inferred(ty));
                            return InferOutcome::Type(ty);
                        }
                        Err(problem) => problems.push(Problem::Inference(problem)),
                    }
                }
            }
        }

        // Failures are not memoized: a rule registered later may succeed.
        self.cache.remove(node);
        if problems.is_empty() {
            problems.push(Problem::Inference(InferenceProblem {
                node,
                kind: InferenceProblemKind::NoRuleApplicable,
                location: ts
                    .language()
                    .node_key(node)
                    .unwrap_or_else(|| "<unknown node>".to_string()),
                sub_problems: Vec::new(),
            }));
        }
        InferOutcome::Problems(problems)
    }
}

impl Default for DefaultInference {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceApi for DefaultInference {
    fn infer_type(&self, ts: &TypeSystem, node: NodeHandle) -> Result<TypeHandle, Vec<Problem>> {
        match self.infer_internal(ts, node) {
            InferOutcome::Type(ty) => Ok(ty),
            InferOutcome::Pending => Err(vec![Problem::Inference(InferenceProblem {
                node,
                kind: InferenceProblemKind::PendingCycle,
                location: "inference cycle".to_string(),
                sub_problems: Vec::new(),
            })]),
            InferOutcome::Problems(problems) => Err(problems),
        }
    }

    fn try_infer(&self, ts: &TypeSystem, node: NodeHandle) -> Option<TypeHandle> {
        match self.infer_internal(ts, node) {
            InferOutcome::Type(ty) => Some(ty),
            InferOutcome::Pending | InferOutcome::Problems(_) => None,
        }
    }

    fn add_rule(&self, rule: Rc<dyn InferenceRule>, options: InferenceRuleOptions) {
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

    fn clear_cache(&self) {
        self.cache.clear();
    }
}
