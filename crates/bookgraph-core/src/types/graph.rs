//! Knowledge graph schema.
//!
//! The JSON form of these types is embedded verbatim into prompts, so field
//! order follows declaration order and must stay stable.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One concept extracted from the book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    /// Identifier, unique within its graph
    pub id: i64,
    /// Short concept name
    pub name: String,
    /// What the concept means in the book
    pub description: String,
}

impl Node {
    /// Creates a node.
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Directed, labeled relation between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Link {
    /// Identifier, unique within its graph
    pub id: i64,
    /// Relation label
    pub name: String,
    /// Id of the node the link starts from
    pub from_id: i64,
    /// Id of the node the link points to
    pub to_id: i64,
    /// Why the two concepts are related
    pub description: String,
}

impl Link {
    /// Creates a link from `from_id` to `to_id`.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        from_id: i64,
        to_id: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from_id,
            to_id,
            description: description.into(),
        }
    }
}

/// A named knowledge graph summarizing a book.
///
/// `reasoning` holds the model's narrated rationale. It is kept for display
/// and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeGraph {
    /// Graph title
    pub name: String,
    /// Free-text rationale written before the graph itself
    pub reasoning: String,
    /// Concepts, in generation order
    pub nodes: Vec<Node>,
    /// Relations, in generation order
    pub links: Vec<Link>,
}

impl KnowledgeGraph {
    /// Creates an empty graph.
    pub fn new(name: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reasoning: reasoning.into(),
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Appends a node.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends a link.
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Looks up a node by id.
    pub fn node(&self, id: i64) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Returns the canonical compact JSON form used inside prompts.
    ///
    /// Equal graphs always produce identical text.
    pub fn canonical_json(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KnowledgeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
