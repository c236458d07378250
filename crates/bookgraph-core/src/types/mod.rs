//! Core types for knowledge-graph refinement sessions.

mod feedback;
mod graph;
mod history;
mod ids;
mod phase;
mod proptests;

pub use feedback::{Feedback, MAX_RATING};
pub use graph::{KnowledgeGraph, Link, Node};
pub use history::{HistoryEntry, SessionSnapshot};
pub use ids::SessionId;
pub use phase::RefinementPhase;
