//! Stateful generate / rate / regenerate controller for one book.

use bookgraph_core::llm::{self, CompletionGateway};
use bookgraph_core::{
    Error, Feedback, HistoryEntry, IndexViolation, KnowledgeGraph, RefinementPhase, Result,
    SessionId, SessionSnapshot,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::prompts::{self, Criteria};

/// Drives an LLM through repeated graph generations and critiques for one
/// book, keeping every version in an append-only history.
///
/// History is indexed backwards: `0` and `-1` address the latest entry,
/// `-2` the one before it, and so on down to `-len`. Positive indices are
/// rejected.
///
/// Every operation makes at most one gateway call and changes history only
/// after that call succeeds. Mutating operations take `&mut self`; share a
/// controller across tasks only behind your own lock.
pub struct RefinementController {
    session_id: SessionId,
    book_title: String,
    criteria: Criteria,
    gateway: Arc<dyn CompletionGateway>,
    history: Vec<HistoryEntry>,
    created_at: DateTime<Utc>,
}

impl RefinementController {
    /// Creates an empty session for `book_title` with the default criteria.
    pub fn new(book_title: impl Into<String>, gateway: Arc<dyn CompletionGateway>) -> Self {
        let book_title = book_title.into();
        Self {
            session_id: SessionId::new(),
            criteria: Criteria::for_book(&book_title),
            book_title,
            gateway,
            history: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Replaces the goal and meaning used in every prompt.
    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Session identifier used in log events.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Book being summarized.
    pub fn book_title(&self) -> &str {
        &self.book_title
    }

    /// Criteria embedded in prompts.
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Number of graph versions generated so far.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns `true` if no graph has been generated.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// All entries, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Current phase of the loop.
    pub fn phase(&self) -> RefinementPhase {
        match self.history.last() {
            None => RefinementPhase::Empty,
            Some(entry) if entry.is_rated() => RefinementPhase::Rated,
            Some(_) => RefinementPhase::Unrated,
        }
    }

    /// Generates a fresh graph and appends it unrated.
    ///
    /// Calling this on a non-empty session appends another independent seed.
    pub async fn generate_initial_graph(&mut self, model: &str) -> Result<KnowledgeGraph> {
        tracing::info!(
            session_id = %self.session_id,
            book = %self.book_title,
            model = %model,
            "Generating initial graph"
        );

        let messages = prompts::seed_messages(&self.criteria);
        let graph: KnowledgeGraph = llm::complete(self.gateway.as_ref(), model, messages)
            .await
            .map_err(|e| {
                tracing::error!(session_id = %self.session_id, error = %e, "Seed generation failed");
                Error::generation(e)
            })?;

        Ok(self.append(graph, model))
    }

    /// Returns the graph at a relative index.
    pub fn get_graph(&self, index: i64) -> Result<&KnowledgeGraph> {
        Ok(&self.entry(index)?.graph)
    }

    /// Returns the feedback at a relative index, `None` if not rated yet.
    pub fn get_feedback(&self, index: i64) -> Result<Option<&Feedback>> {
        Ok(self.entry(index)?.feedback.as_ref())
    }

    /// Returns the whole entry at a relative index.
    pub fn entry(&self, index: i64) -> Result<&HistoryEntry> {
        let position = self.resolve(index)?;
        self.history
            .get(position)
            .ok_or(Error::invalid_index(index, IndexViolation::OutOfRange {
                len: self.history.len(),
            }))
    }

    /// Rates the latest graph and attaches the feedback to it.
    ///
    /// Rating an already rated entry replaces its feedback.
    pub async fn rate_latest(&mut self, model: &str) -> Result<Feedback> {
        let graph = self.get_graph(-1)?;

        tracing::info!(
            session_id = %self.session_id,
            version = self.history.len(),
            model = %model,
            "Rating latest graph"
        );

        let messages = prompts::rating_messages(&self.criteria, graph);
        let feedback: Feedback = llm::complete(self.gateway.as_ref(), model, messages)
            .await
            .map_err(|e| {
                tracing::error!(session_id = %self.session_id, error = %e, "Rating failed");
                Error::rating(e)
            })?;

        let version = self.history.len();
        let latest = self
            .history
            .last_mut()
            .ok_or(Error::invalid_index(-1, IndexViolation::EmptyHistory))?;
        if let Some(previous) = &latest.feedback {
            tracing::debug!(
                session_id = %self.session_id,
                previous_rating = previous.rating,
                "Replacing earlier rating"
            );
        }
        latest.attach_feedback(feedback.clone());

        tracing::info!(
            session_id = %self.session_id,
            version,
            rating = feedback.rating,
            "Graph rated"
        );

        Ok(feedback)
    }

    /// Generates an improved graph from the latest graph and its feedback.
    ///
    /// Fails with [`Error::MissingFeedback`] if the latest graph is unrated.
    pub async fn advance_from_feedback(&mut self, model: &str) -> Result<KnowledgeGraph> {
        let latest = self.entry(-1)?;
        let feedback = latest.feedback.as_ref().ok_or(Error::MissingFeedback)?;

        tracing::info!(
            session_id = %self.session_id,
            version = self.history.len(),
            rating = feedback.rating,
            model = %model,
            "Generating improved graph from feedback"
        );

        let messages = prompts::improvement_messages(&self.criteria, &latest.graph, feedback);
        let graph: KnowledgeGraph = llm::complete(self.gateway.as_ref(), model, messages)
            .await
            .map_err(|e| {
                tracing::error!(session_id = %self.session_id, error = %e, "Improvement failed");
                Error::generation(e)
            })?;

        Ok(self.append(graph, model))
    }

    /// Rates the latest graph, then generates an improved one.
    ///
    /// If generation fails the rating stays attached.
    pub async fn rate_and_advance(
        &mut self,
        rating_model: &str,
        generation_model: &str,
    ) -> Result<KnowledgeGraph> {
        self.rate_latest(rating_model).await?;
        self.advance_from_feedback(generation_model).await
    }

    /// Relative index and entry of the highest-rated graph.
    ///
    /// Ties resolve to the most recent entry.
    pub fn best_rated(&self) -> Option<(i64, &HistoryEntry)> {
        let len = self.history.len() as i64;
        self.history
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_rated())
            .max_by_key(|(_, entry)| entry.rating())
            .map(|(position, entry)| (position as i64 - len, entry))
    }

    /// Serializable copy of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            book_title: self.book_title.clone(),
            created_at: self.created_at,
            entries: self.history.clone(),
        }
    }

    fn resolve(&self, index: i64) -> Result<usize> {
        if self.history.is_empty() {
            return Err(Error::invalid_index(index, IndexViolation::EmptyHistory));
        }
        if index > 0 {
            return Err(Error::invalid_index(index, IndexViolation::Positive));
        }
        let len = self.history.len();
        let offset = if index == 0 { -1 } else { index };
        i64::try_from(len)
            .ok()
            .and_then(|len| usize::try_from(len + offset).ok())
            .ok_or(Error::invalid_index(index, IndexViolation::OutOfRange { len }))
    }

    fn append(&mut self, graph: KnowledgeGraph, model: &str) -> KnowledgeGraph {
        let issues = graph.structural_issues();
        if !issues.is_empty() {
            let summary: Vec<String> = issues.iter().map(ToString::to_string).collect();
            tracing::warn!(
                session_id = %self.session_id,
                graph = %graph.name,
                issues = ?summary,
                "Generated graph violates structural rules"
            );
        }

        self.history.push(HistoryEntry::new(graph.clone(), model));

        tracing::info!(
            session_id = %self.session_id,
            version = self.history.len(),
            graph = %graph.name,
            nodes = graph.node_count(),
            links = graph.link_count(),
            "Graph appended to history"
        );

        graph
    }
}

impl std::fmt::Debug for RefinementController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefinementController")
            .field("session_id", &self.session_id)
            .field("book_title", &self.book_title)
            .field("gateway", &self.gateway.name())
            .field("history_len", &self.history.len())
            .finish()
    }
}
