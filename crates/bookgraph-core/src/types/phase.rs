//! Refinement loop phases.

use serde::{Deserialize, Serialize};

/// Where a refinement session stands in the generate / rate / regenerate cycle.
///
/// There is no terminal phase. When to stop is decided by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RefinementPhase {
    /// No graph generated yet.
    Empty,

    /// The latest graph has no feedback.
    Unrated,

    /// The latest graph has feedback and can be improved upon.
    Rated,
}

impl RefinementPhase {
    /// Returns `true` if the latest graph can be rated (or re-rated).
    pub fn can_rate(&self) -> bool {
        matches!(self, RefinementPhase::Unrated | RefinementPhase::Rated)
    }

    /// Returns `true` if an improved graph can be generated.
    pub fn can_advance(&self) -> bool {
        matches!(self, RefinementPhase::Rated)
    }
}

impl std::fmt::Display for RefinementPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefinementPhase::Empty => write!(f, "empty"),
            RefinementPhase::Unrated => write!(f, "unrated"),
            RefinementPhase::Rated => write!(f, "rated"),
        }
    }
}
