//! Integration tests for policy-driven refinement runs.

use bookgraph_core::{CompletionError, Error};
use bookgraph_core::llm::MockGateway;
use bookgraph_refine::{refine, ModelSelection, RefinementController, RefinementPolicy};
use std::sync::Arc;

use crate::common::{dune_graph, feedback, TestHarness};

#[tokio::test]
async fn test_refine_reaches_target() {
    let harness = TestHarness::with_responses(vec![
        dune_graph("v1"),
        feedback(4, "too sparse"),
        dune_graph("v2"),
        feedback(6, "better"),
        dune_graph("v3"),
        feedback(9, "excellent"),
    ]);
    let mut controller = harness.controller("Dune");
    let policy = RefinementPolicy::new(5).with_target_rating(8);

    let outcome = refine(&mut controller, &policy, &ModelSelection::default())
        .await
        .expect("Run should reach the target");

    assert!(outcome.reached_target);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.final_rating, 9);
    assert_eq!(controller.len(), 3);

    let (index, best) = controller.best_rated().unwrap();
    assert_eq!(index, -1);
    assert_eq!(best.graph.name, "v3");
}

#[tokio::test]
async fn test_refine_continues_existing_session() {
    let harness = TestHarness::with_responses(vec![
        dune_graph("seed"),
        feedback(3, "weak"),
        dune_graph("next"),
        feedback(5, "okay"),
    ]);
    let mut controller = harness.controller("Dune");
    controller.generate_initial_graph("gpt-4o").await.unwrap();

    let outcome = refine(&mut controller, &RefinementPolicy::new(1), &ModelSelection::default())
        .await
        .unwrap();

    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.history_len, 2);
    assert_eq!(controller.get_graph(-2).unwrap().name, "seed");
}

#[tokio::test]
async fn test_refine_failure_keeps_completed_steps() {
    let gateway = Arc::new(MockGateway::from_script(vec![
        Ok(dune_graph("v1")),
        Ok(feedback(5, "fine")),
        Err(CompletionError::provider(503, "overloaded")),
    ]));
    let mut controller = RefinementController::new("Dune", gateway);

    let err = refine(&mut controller, &RefinementPolicy::new(3), &ModelSelection::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Generation { .. }));
    assert_eq!(controller.len(), 1);
    assert_eq!(controller.get_feedback(-1).unwrap().unwrap().rating, 5);
}

#[tokio::test]
async fn test_refine_rejects_multi_rating_before_any_call() {
    let harness = TestHarness::new();
    let mut controller = harness.controller("Dune");
    let policy = RefinementPolicy::new(2).with_num_ratings(3);

    let err = refine(&mut controller, &policy, &ModelSelection::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("only one rating per cycle"));
    assert_eq!(harness.gateway.call_count(), 0);
    assert!(controller.is_empty());
}
