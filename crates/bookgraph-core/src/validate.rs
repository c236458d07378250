//! Best-effort structural checks for generated graphs.
//!
//! Generation prompts ask the model to keep graphs well formed, but nothing
//! forces it to. These checks report what went wrong so callers can log or
//! display it. A graph with issues is still a valid history entry.

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::types::KnowledgeGraph;

/// One violated structural rule.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StructuralIssue {
    /// Two nodes share an id
    DuplicateNodeId {
        /// The repeated id
        id: i64,
    },

    /// A link endpoint refers to a node that does not exist
    DanglingLink {
        /// Offending link
        link_id: i64,
        /// The missing node id
        missing_node: i64,
    },

    /// A link starts and ends on the same node
    SelfLoop {
        /// Offending link
        link_id: i64,
        /// Node the loop sits on
        node_id: i64,
    },

    /// Two nodes are linked in both directions
    TwoCycle {
        /// Lower of the two node ids
        a: i64,
        /// Higher of the two node ids
        b: i64,
    },

    /// A node touches no link
    IsolatedNode {
        /// The isolated node
        node_id: i64,
    },

    /// The graph splits into several components
    Disconnected {
        /// Number of connected components
        components: usize,
    },
}

impl fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralIssue::DuplicateNodeId { id } => write!(f, "duplicate node id {id}"),
            StructuralIssue::DanglingLink {
                link_id,
                missing_node,
            } => write!(f, "link {link_id} refers to missing node {missing_node}"),
            StructuralIssue::SelfLoop { link_id, node_id } => {
                write!(f, "link {link_id} loops on node {node_id}")
            }
            StructuralIssue::TwoCycle { a, b } => {
                write!(f, "nodes {a} and {b} are linked in both directions")
            }
            StructuralIssue::IsolatedNode { node_id } => write!(f, "node {node_id} is isolated"),
            StructuralIssue::Disconnected { components } => {
                write!(f, "graph has {components} disconnected components")
            }
        }
    }
}

impl KnowledgeGraph {
    /// Returns every structural rule this graph violates.
    ///
    /// Issues are reported in a fixed order: duplicate ids, dangling links,
    /// self-loops, two-cycles, isolated nodes, then disconnection.
    pub fn structural_issues(&self) -> Vec<StructuralIssue> {
        let mut issues = Vec::new();

        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id) {
                issues.push(StructuralIssue::DuplicateNodeId { id: node.id });
            }
        }

        let mut graph = UnGraph::<i64, ()>::new_undirected();
        let mut index: HashMap<i64, NodeIndex> = HashMap::new();
        for id in &ids {
            index.insert(*id, graph.add_node(*id));
        }

        let mut directed = HashSet::new();
        let mut touched = HashSet::new();
        for link in &self.links {
            let mut dangling = false;
            for endpoint in [link.from_id, link.to_id] {
                if !ids.contains(&endpoint) {
                    issues.push(StructuralIssue::DanglingLink {
                        link_id: link.id,
                        missing_node: endpoint,
                    });
                    dangling = true;
                }
            }
            if dangling {
                continue;
            }

            if link.from_id == link.to_id {
                issues.push(StructuralIssue::SelfLoop {
                    link_id: link.id,
                    node_id: link.from_id,
                });
            }

            touched.insert(link.from_id);
            touched.insert(link.to_id);
            directed.insert((link.from_id, link.to_id));
            if let (Some(from), Some(to)) = (index.get(&link.from_id), index.get(&link.to_id)) {
                graph.add_edge(*from, *to, ());
            }
        }

        let mut cycles: Vec<(i64, i64)> = directed
            .iter()
            .filter(|(from, to)| from < to && directed.contains(&(*to, *from)))
            .copied()
            .collect();
        cycles.sort_unstable();
        issues.extend(
            cycles
                .into_iter()
                .map(|(a, b)| StructuralIssue::TwoCycle { a, b }),
        );

        let mut isolated: Vec<i64> = ids.difference(&touched).copied().collect();
        isolated.sort_unstable();
        issues.extend(
            isolated
                .into_iter()
                .map(|node_id| StructuralIssue::IsolatedNode { node_id }),
        );

        let components = connected_components(&graph);
        if components > 1 {
            issues.push(StructuralIssue::Disconnected { components });
        }

        issues
    }

    /// Returns `true` if no structural rule is violated.
    pub fn is_well_formed(&self) -> bool {
        self.structural_issues().is_empty()
    }
}
