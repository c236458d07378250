//! Property-based tests for core types.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::types::{Feedback, KnowledgeGraph, Link, Node, MAX_RATING};
    use proptest::prelude::*;

    fn arb_graph() -> impl Strategy<Value = KnowledgeGraph> {
        (
            "\\PC{0,16}",
            "\\PC{0,32}",
            prop::collection::vec((any::<i64>(), "\\PC{0,8}", "\\PC{0,16}"), 0..6),
            prop::collection::vec(
                (any::<i64>(), "\\PC{0,8}", any::<i64>(), any::<i64>(), "\\PC{0,16}"),
                0..6,
            ),
        )
            .prop_map(|(name, reasoning, nodes, links)| KnowledgeGraph {
                name,
                reasoning,
                nodes: nodes
                    .into_iter()
                    .map(|(id, n, d)| Node::new(id, n, d))
                    .collect(),
                links: links
                    .into_iter()
                    .map(|(id, n, from, to, d)| Link::new(id, n, from, to, d))
                    .collect(),
            })
    }

    proptest! {
        #[test]
        fn test_canonical_json_deterministic(graph in arb_graph()) {
            let first = graph.canonical_json();
            let second = graph.clone().canonical_json();
            prop_assert_eq!(&first, &second);
            let reparsed: KnowledgeGraph = serde_json::from_str(&first).unwrap();
            prop_assert_eq!(reparsed.canonical_json(), first);
        }

        #[test]
        fn test_feedback_range(rating in -50i64..50) {
            let result = Feedback::new(rating, "opinion");
            let in_range = (0..=i64::from(MAX_RATING)).contains(&rating);
            prop_assert_eq!(result.is_ok(), in_range);
        }
    }
}
