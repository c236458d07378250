//! Refinement history entries and session snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Feedback, KnowledgeGraph, SessionId};

/// One step of a refinement timeline: a graph and, once rated, its critique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The generated graph
    pub graph: KnowledgeGraph,

    /// Critique of `graph`, absent until rated
    pub feedback: Option<Feedback>,

    /// Model that produced `graph`
    pub generated_by: String,

    /// When the graph was appended
    pub generated_at: DateTime<Utc>,

    /// When the current feedback was attached
    pub rated_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    /// Creates an unrated entry.
    pub fn new(graph: KnowledgeGraph, generated_by: impl Into<String>) -> Self {
        Self {
            graph,
            feedback: None,
            generated_by: generated_by.into(),
            generated_at: Utc::now(),
            rated_at: None,
        }
    }

    /// Attaches feedback, replacing any earlier rating of this entry.
    pub fn attach_feedback(&mut self, feedback: Feedback) {
        self.feedback = Some(feedback);
        self.rated_at = Some(Utc::now());
    }

    /// Returns `true` if feedback is attached.
    pub fn is_rated(&self) -> bool {
        self.feedback.is_some()
    }

    /// Returns the rating, if rated.
    pub fn rating(&self) -> Option<u8> {
        self.feedback.as_ref().map(|f| f.rating)
    }
}

/// Serializable export of a whole refinement session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session the entries belong to
    pub session_id: SessionId,

    /// Book being summarized
    pub book_title: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// Entries, oldest first
    pub entries: Vec<HistoryEntry>,
}

impl SessionSnapshot {
    /// Returns the most recent entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Returns the highest-rated entry; ties resolve to the most recent.
    pub fn best_rated(&self) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.is_rated())
            .max_by_key(|entry| entry.rating())
    }

    /// Renders the snapshot as pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
