//! Error classification for failures surfaced by the controller.

use bookgraph_core::llm::MockGateway;
use bookgraph_core::{CompletionError, CompletionErrorKind, Error, RefinementPhase};
use bookgraph_refine::RefinementController;
use serde_json::json;
use std::sync::Arc;

use crate::common::{dune_graph, feedback};

fn controller(script: Vec<Result<serde_json::Value, CompletionError>>) -> RefinementController {
    RefinementController::new("Dune", Arc::new(MockGateway::from_script(script)))
}

fn source_kind(err: &Error) -> CompletionErrorKind {
    match err {
        Error::Generation { source } | Error::Rating { source } => source.kind,
        other => panic!("Expected a gateway failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_graph_is_schema_error() {
    let mut controller = controller(vec![Ok(json!({"name": "Dune", "nodes": "none"}))]);

    let err = controller.generate_initial_graph("gpt-4o").await.unwrap_err();

    assert_eq!(source_kind(&err), CompletionErrorKind::Schema);
    assert!(!err.is_retryable());
    assert!(controller.is_empty());
}

#[tokio::test]
async fn test_out_of_range_rating_is_schema_error() {
    let mut controller = controller(vec![Ok(dune_graph("Dune")), Ok(feedback(11, "too generous"))]);
    controller.generate_initial_graph("gpt-4o").await.unwrap();

    let err = controller.rate_latest("gpt-3.5-turbo").await.unwrap_err();

    assert!(matches!(err, Error::Rating { .. }));
    assert_eq!(source_kind(&err), CompletionErrorKind::Schema);
    assert_eq!(controller.phase(), RefinementPhase::Unrated);
}

#[tokio::test]
async fn test_negative_rating_is_schema_error() {
    let mut controller = controller(vec![
        Ok(dune_graph("Dune")),
        Ok(json!({"rating": -1, "opinion": "awful"})),
    ]);
    controller.generate_initial_graph("gpt-4o").await.unwrap();

    let err = controller.rate_latest("gpt-3.5-turbo").await.unwrap_err();

    assert_eq!(source_kind(&err), CompletionErrorKind::Schema);
}

#[tokio::test]
async fn test_provider_errors_classified_by_status() {
    let mut controller = controller(vec![
        Err(CompletionError::provider(400, "bad request")),
        Err(CompletionError::provider(502, "bad gateway")),
    ]);

    let client = controller.generate_initial_graph("gpt-4o").await.unwrap_err();
    let server = controller.generate_initial_graph("gpt-4o").await.unwrap_err();

    assert!(!client.is_retryable());
    assert!(server.is_retryable());
    assert_eq!(
        source_kind(&server),
        CompletionErrorKind::Provider { status: 502 }
    );
    assert!(controller.is_empty());
}

#[tokio::test]
async fn test_unsupported_model_propagates() {
    let mut controller = controller(vec![Err(CompletionError::unsupported_model("gpt-9"))]);

    let err = controller.generate_initial_graph("gpt-9").await.unwrap_err();

    assert_eq!(source_kind(&err), CompletionErrorKind::UnsupportedModel);
    assert!(err.to_string().contains("gpt-9"));
}

#[tokio::test]
async fn test_rate_on_empty_history_makes_no_call() {
    let gateway = Arc::new(MockGateway::new(vec![feedback(5, "never sent")]));
    let mut controller = RefinementController::new("Dune", gateway.clone());

    let err = controller.rate_latest("gpt-3.5-turbo").await.unwrap_err();

    assert!(matches!(err, Error::InvalidIndex { .. }));
    assert!(!err.is_retryable());
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_timeout_is_retryable() {
    let mut controller = controller(vec![Err(CompletionError::timeout("deadline exceeded"))]);

    let err = controller.generate_initial_graph("gpt-4o").await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(source_kind(&err), CompletionErrorKind::Timeout);
}
