//! Common test utilities and harness for Bookgraph refinement tests.

#![allow(dead_code)]

use bookgraph_core::llm::MockGateway;
use bookgraph_refine::RefinementController;
use serde_json::{json, Value};
use std::sync::Arc;

/// Test harness for integration tests.
///
/// Owns a scripted gateway and hands out controllers bound to it, so tests
/// can inspect every request the controller sent.
pub struct TestHarness {
    /// Scripted gateway shared with every controller built by the harness
    pub gateway: Arc<MockGateway>,
}

impl TestHarness {
    /// Creates a harness with an empty script.
    pub fn new() -> Self {
        Self {
            gateway: Arc::new(MockGateway::default()),
        }
    }

    /// Creates a harness replaying `responses` in order.
    pub fn with_responses(responses: Vec<Value>) -> Self {
        Self {
            gateway: Arc::new(MockGateway::new(responses)),
        }
    }

    /// Creates a controller for `book_title` bound to the harness gateway.
    pub fn controller(&self, book_title: &str) -> RefinementController {
        RefinementController::new(book_title, self.gateway.clone())
    }

    /// User prompt of the `n`-th request.
    pub fn user_prompt(&self, n: usize) -> String {
        self.gateway.requests()[n]
            .user_prompt()
            .unwrap_or_default()
            .to_string()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A well-formed four-concept graph for Dune.
pub fn dune_graph(name: &str) -> Value {
    json!({
        "name": name,
        "reasoning": "Start from the spice, then the powers that fight over it.",
        "nodes": [
            {"id": 1, "name": "Spice", "description": "The melange, most valuable substance"},
            {"id": 2, "name": "Arrakis", "description": "The only source of spice"},
            {"id": 3, "name": "Spacing Guild", "description": "Navigators who need spice"},
            {"id": 4, "name": "Fremen", "description": "Native people of Arrakis"}
        ],
        "links": [
            {"id": 1, "name": "found on", "from_id": 1, "to_id": 2, "description": "spice represents Arrakis' value"},
            {"id": 2, "name": "depends on", "from_id": 3, "to_id": 1, "description": "navigation represents spice addiction"},
            {"id": 3, "name": "inhabit", "from_id": 4, "to_id": 2, "description": "desert life represents adaptation"}
        ]
    })
}

/// A graph that breaks several structural rules.
pub fn broken_graph(name: &str) -> Value {
    json!({
        "name": name,
        "reasoning": "",
        "nodes": [
            {"id": 1, "name": "A", "description": ""},
            {"id": 2, "name": "B", "description": ""},
            {"id": 3, "name": "C", "description": ""}
        ],
        "links": [
            {"id": 1, "name": "ab", "from_id": 1, "to_id": 2, "description": ""},
            {"id": 2, "name": "ba", "from_id": 2, "to_id": 1, "description": ""}
        ]
    })
}

/// A feedback value.
pub fn feedback(rating: u8, opinion: &str) -> Value {
    json!({"rating": rating, "opinion": opinion})
}

/// Script for one seed, one rating and one improvement.
pub fn script_single_cycle() -> Vec<Value> {
    vec![
        dune_graph("Dune v1"),
        feedback(6, "needs more detail"),
        dune_graph("Dune v2"),
    ]
}
