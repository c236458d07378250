//! Integration tests for a refinement session driven step by step.

use bookgraph_core::{CompletionError, Error, RefinementPhase};
use bookgraph_core::llm::MockGateway;
use bookgraph_refine::RefinementController;
use std::sync::Arc;

use crate::common::{broken_graph, dune_graph, feedback, script_single_cycle, TestHarness};

#[tokio::test]
async fn test_dune_initial_graph() {
    let harness = TestHarness::with_responses(vec![dune_graph("Dune")]);
    let mut controller = harness.controller("Dune");

    let graph = controller
        .generate_initial_graph("gpt-4o")
        .await
        .expect("Seed generation should succeed");

    assert!(!graph.name.is_empty(), "Graph should be named");
    assert_eq!(controller.get_graph(-1).unwrap(), &graph);
    assert!(matches!(
        controller.get_graph(1),
        Err(Error::InvalidIndex { .. })
    ));
    assert!(graph.is_well_formed());

    let prompt = harness.user_prompt(0);
    assert!(prompt.contains("the structure of the book Dune"));
}

#[tokio::test]
async fn test_rate_attaches_feedback_in_range() {
    let harness = TestHarness::with_responses(vec![dune_graph("Dune"), feedback(7, "solid")]);
    let mut controller = harness.controller("Dune");
    controller.generate_initial_graph("gpt-4o").await.unwrap();

    let rating = controller
        .rate_latest("gpt-3.5-turbo")
        .await
        .expect("Rating should succeed");

    assert!(rating.rating <= 10);
    assert_eq!(controller.get_feedback(-1).unwrap(), Some(&rating));
    assert_eq!(harness.gateway.requests()[1].model, "gpt-3.5-turbo");
}

#[tokio::test]
async fn test_full_cycle_prompts() {
    let harness = TestHarness::with_responses(script_single_cycle());
    let mut controller = harness.controller("Dune");

    controller.generate_initial_graph("gpt-4o").await.unwrap();
    let first_json = controller.get_graph(-1).unwrap().canonical_json();
    let improved = controller
        .rate_and_advance("gpt-3.5-turbo", "gpt-4o")
        .await
        .expect("Cycle should complete");

    assert_eq!(improved.name, "Dune v2");
    assert_eq!(controller.len(), 2);
    assert_eq!(controller.phase(), RefinementPhase::Unrated);

    let rating_prompt = harness.user_prompt(1);
    assert!(rating_prompt.contains("Please rate the graph above from 0 to 10"));
    assert!(rating_prompt.contains(&first_json));

    let improvement_prompt = harness.user_prompt(2);
    assert!(improvement_prompt.contains("6/10"));
    assert!(improvement_prompt.contains("needs more detail"));
    assert!(improvement_prompt.contains(&first_json));
}

#[tokio::test]
async fn test_rate_and_advance_grows_history_by_one() {
    let harness = TestHarness::with_responses(script_single_cycle());
    let mut controller = harness.controller("Dune");
    controller.generate_initial_graph("gpt-4o").await.unwrap();
    let before = controller.len();

    controller.rate_and_advance("m", "m").await.unwrap();

    assert_eq!(controller.len(), before + 1);
    let rated = controller.get_feedback(-2).unwrap().expect("Rating kept");
    assert_eq!(rated.rating, 6);
}

#[tokio::test]
async fn test_advance_without_rating_is_rejected() {
    let harness = TestHarness::with_responses(vec![dune_graph("Dune"), dune_graph("Never")]);
    let mut controller = harness.controller("Dune");
    controller.generate_initial_graph("gpt-4o").await.unwrap();
    let snapshot = controller.snapshot();

    let result = controller.advance_from_feedback("gpt-4o").await;

    assert!(matches!(result, Err(Error::MissingFeedback)));
    assert_eq!(controller.snapshot().entries, snapshot.entries);
    assert_eq!(harness.gateway.call_count(), 1);
}

#[tokio::test]
async fn test_malformed_graph_is_kept() {
    let harness = TestHarness::with_responses(vec![broken_graph("Loopy")]);
    let mut controller = harness.controller("Dune");

    let graph = controller.generate_initial_graph("gpt-4o").await.unwrap();

    assert!(!graph.is_well_formed());
    assert_eq!(controller.len(), 1);
}

#[tokio::test]
async fn test_independent_sessions_share_gateway() {
    let gateway = Arc::new(MockGateway::new(vec![
        dune_graph("Dune"),
        dune_graph("Emma"),
    ]));
    let mut dune = RefinementController::new("Dune", gateway.clone());
    let mut emma = RefinementController::new("Emma", gateway.clone());

    dune.generate_initial_graph("gpt-4o").await.unwrap();
    emma.generate_initial_graph("gpt-4o").await.unwrap();

    assert_ne!(dune.session_id(), emma.session_id());
    assert_eq!(dune.len(), 1);
    assert_eq!(emma.len(), 1);
    assert_eq!(emma.get_graph(-1).unwrap().name, "Emma");
}

#[tokio::test]
async fn test_rating_failure_keeps_unrated_state() {
    let gateway = Arc::new(MockGateway::from_script(vec![
        Ok(dune_graph("Dune")),
        Err(CompletionError::rate_limited("slow down")),
    ]));
    let mut controller = RefinementController::new("Dune", gateway);
    controller.generate_initial_graph("gpt-4o").await.unwrap();

    let err = controller.rate_latest("gpt-3.5-turbo").await.unwrap_err();

    assert!(matches!(err, Error::Rating { .. }));
    assert!(err.is_retryable());
    assert_eq!(controller.phase(), RefinementPhase::Unrated);
    assert_eq!(controller.get_feedback(-1).unwrap(), None);
}
