//! Bounded refinement runs under a caller-chosen stopping rule.

use bookgraph_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::controller::RefinementController;

/// Default number of improvement rounds.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// When to stop refining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementPolicy {
    /// Maximum number of improved graphs to generate
    pub max_iterations: u32,

    /// Stop early once a graph is rated at least this high
    pub target_rating: Option<u8>,

    /// Ratings gathered per cycle; only 1 is supported
    pub num_ratings: u32,
}

impl Default for RefinementPolicy {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            target_rating: None,
            num_ratings: 1,
        }
    }
}

impl RefinementPolicy {
    /// Creates a policy running at most `max_iterations` improvement rounds.
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            ..Self::default()
        }
    }

    /// Stops early once a rating reaches `rating`.
    pub fn with_target_rating(mut self, rating: u8) -> Self {
        self.target_rating = Some(rating);
        self
    }

    /// Sets the number of ratings per cycle.
    pub fn with_num_ratings(mut self, num_ratings: u32) -> Self {
        self.num_ratings = num_ratings;
        self
    }
}

/// Models used for each kind of call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    /// Model generating seed and improved graphs
    pub generation: String,
    /// Model rating graphs
    pub rating: String,
}

impl ModelSelection {
    /// Creates a model selection.
    pub fn new(generation: impl Into<String>, rating: impl Into<String>) -> Self {
        Self {
            generation: generation.into(),
            rating: rating.into(),
        }
    }
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self::new("gpt-4o", "gpt-3.5-turbo")
    }
}

/// Summary of a refinement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementOutcome {
    /// Improved graphs generated during this run
    pub iterations: u32,

    /// Rating of the latest graph when the run stopped
    pub final_rating: u8,

    /// Whether the target rating was met
    pub reached_target: bool,

    /// History length when the run stopped
    pub history_len: usize,
}

/// Runs the generate / rate / improve loop until the policy says stop.
///
/// Seeds the session first if it is empty. Every graph produced, including
/// the last one, is rated before the run returns. Failures propagate as-is
/// and whatever completed stays in the controller's history.
pub async fn refine(
    controller: &mut RefinementController,
    policy: &RefinementPolicy,
    models: &ModelSelection,
) -> Result<RefinementOutcome> {
    if policy.num_ratings != 1 {
        return Err(Error::NotImplemented(format!(
            "only one rating per cycle is supported (requested {})",
            policy.num_ratings
        )));
    }

    tracing::info!(
        session_id = %controller.session_id(),
        book = %controller.book_title(),
        max_iterations = policy.max_iterations,
        target_rating = ?policy.target_rating,
        "Starting refinement run"
    );

    if controller.is_empty() {
        controller.generate_initial_graph(&models.generation).await?;
    }

    let mut iterations = 0u32;
    loop {
        let feedback = controller.rate_latest(&models.rating).await?;

        if let Some(target) = policy.target_rating
            && feedback.meets(target)
        {
            tracing::info!(
                session_id = %controller.session_id(),
                iterations,
                rating = feedback.rating,
                "Target rating reached"
            );
            return Ok(outcome(controller, iterations, feedback.rating, true));
        }

        if iterations >= policy.max_iterations {
            tracing::info!(
                session_id = %controller.session_id(),
                iterations,
                rating = feedback.rating,
                "Iteration budget spent"
            );
            return Ok(outcome(controller, iterations, feedback.rating, false));
        }

        controller.advance_from_feedback(&models.generation).await?;
        iterations += 1;
    }
}

fn outcome(
    controller: &RefinementController,
    iterations: u32,
    final_rating: u8,
    reached_target: bool,
) -> RefinementOutcome {
    RefinementOutcome {
        iterations,
        final_rating,
        reached_target,
        history_len: controller.len(),
    }
}
