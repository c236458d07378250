//! Relative history index resolution.

use bookgraph_core::{Error, IndexViolation};
use proptest::prelude::*;

use crate::common::{dune_graph, TestHarness};

async fn seeded_controller() -> bookgraph_refine::RefinementController {
    let harness = TestHarness::with_responses(vec![dune_graph("g0")]);
    let mut controller = harness.controller("Dune");
    controller.generate_initial_graph("m").await.unwrap();
    controller
}

#[tokio::test]
async fn test_empty_history_rejects_every_index() {
    let harness = TestHarness::new();
    let controller = harness.controller("Dune");

    for index in [-1, 0, 1] {
        match controller.get_graph(index) {
            Err(Error::InvalidIndex { reason, .. }) => {
                assert_eq!(reason, IndexViolation::EmptyHistory)
            }
            other => panic!("Expected empty-history error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_zero_and_minus_one_are_latest() {
    let controller = seeded_controller().await;
    assert_eq!(controller.get_graph(0).unwrap().name, "g0");
    assert_eq!(controller.get_graph(-1).unwrap().name, "g0");
}

#[tokio::test]
async fn test_positive_index_rejected() {
    let controller = seeded_controller().await;
    match controller.get_graph(1) {
        Err(Error::InvalidIndex { index, reason }) => {
            assert_eq!(index, 1);
            assert_eq!(reason, IndexViolation::Positive);
        }
        other => panic!("Expected positive-index error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_index_beyond_start_rejected() {
    let controller = seeded_controller().await;
    let err = controller.get_feedback(-2).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidIndex {
            reason: IndexViolation::OutOfRange { len: 1 },
            ..
        }
    ));
    assert!(err.to_string().contains("history only holds 1 entries"));
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_negative_index_resolves_from_end(cycles in 1usize..5, back in 1i64..8) {
        let rt = runtime();
        let (controller, len) = rt.block_on(async {
            let mut script = vec![dune_graph("g0")];
            for i in 1..cycles {
                script.push(serde_json::json!({"rating": 5, "opinion": "ok"}));
                script.push(dune_graph(&format!("g{i}")));
            }
            let harness = TestHarness::with_responses(script);
            let mut controller = harness.controller("Dune");
            controller.generate_initial_graph("m").await.unwrap();
            for _ in 1..cycles {
                controller.rate_and_advance("m", "m").await.unwrap();
            }
            let len = controller.len();
            (controller, len)
        });

        prop_assert_eq!(len, cycles);
        let result = controller.get_graph(-back);
        if back as usize <= len {
            let expected = format!("g{}", len - back as usize);
            prop_assert_eq!(&result.unwrap().name, &expected);
        } else {
            let out_of_range = matches!(
                result,
                Err(Error::InvalidIndex { reason: IndexViolation::OutOfRange { .. }, .. })
            );
            prop_assert!(out_of_range);
        }
    }
}
