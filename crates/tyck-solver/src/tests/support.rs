//! Shared test fixtures: a tiny expression language driving the engine the
//! way a host binding would.

use std::cell::RefCell;
use std::rc::Rc;

use tyck_common::{LanguageAdapter, LanguageKey, NodeHandle};

use crate::infer::{InferenceRule, InferenceRuleOutcome};
use crate::system::TypeSystem;
use tyck_common::TypeHandle;

/// Install a subscriber once so `TYCK_LOG=trace cargo test` shows spans.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("TYCK_LOG"))
        .with_test_writer()
        .try_init();
}

/// One node of the test language.
#[derive(Clone, Debug)]
pub enum TestNode {
    IntLiteral,
    StringLiteral,
    Binary {
        op: char,
        left: NodeHandle,
        right: NodeHandle,
    },
}

/// Arena-backed test language.
#[derive(Clone, Default)]
pub struct TestLanguage {
    nodes: Rc<RefCell<Vec<TestNode>>>,
}

impl TestLanguage {
    pub fn add(&self, node: TestNode) -> NodeHandle {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        NodeHandle((nodes.len() - 1) as u64)
    }

    pub fn get(&self, node: NodeHandle) -> Option<TestNode> {
        self.nodes.borrow().get(node.0 as usize).cloned()
    }

    pub fn int(&self) -> NodeHandle {
        self.add(TestNode::IntLiteral)
    }

    pub fn string(&self) -> NodeHandle {
        self.add(TestNode::StringLiteral)
    }

    pub fn binary(&self, op: char, left: NodeHandle, right: NodeHandle) -> NodeHandle {
        self.add(TestNode::Binary { op, left, right })
    }
}

impl LanguageAdapter for TestLanguage {
    fn node_key(&self, node: NodeHandle) -> Option<LanguageKey> {
        Some(
            match self.get(node)? {
                TestNode::IntLiteral => "IntLiteral",
                TestNode::StringLiteral => "StringLiteral",
                TestNode::Binary { .. } => "BinaryExpression",
            }
            .to_string(),
        )
    }

    fn all_sub_keys(&self, _key: &str) -> Vec<LanguageKey> {
        Vec::new()
    }

    fn all_super_keys(&self, key: &str) -> Vec<LanguageKey> {
        // Literals sit below a common Expression key.
        match key {
            "IntLiteral" | "StringLiteral" | "BinaryExpression" => {
                vec!["Expression".to_string()]
            }
            _ => Vec::new(),
        }
    }

    fn is_node(&self, node: NodeHandle) -> bool {
        (node.0 as usize) < self.nodes.borrow().len()
    }
}

/// Inference rule from a plain function.
pub struct FnRule<F>(pub F);

impl<F> InferenceRule for FnRule<F>
where
    F: Fn(&TypeSystem, NodeHandle) -> InferenceRuleOutcome,
{
    fn infer(&self, ts: &TypeSystem, node: NodeHandle) -> InferenceRuleOutcome {
        (self.0)(ts, node)
    }
}

/// Rule mapping literal nodes of one language key to a fixed type.
pub struct LiteralRule {
    pub language: TestLanguage,
    pub matches_int: bool,
    pub ty: TypeHandle,
}

impl InferenceRule for LiteralRule {
    fn infer(&self, _ts: &TypeSystem, node: NodeHandle) -> InferenceRuleOutcome {
        match (self.language.get(node), self.matches_int) {
            (Some(TestNode::IntLiteral), true) | (Some(TestNode::StringLiteral), false) => {
                InferenceRuleOutcome::Inferred(self.ty)
            }
            _ => InferenceRuleOutcome::NotApplicable,
        }
    }
}
