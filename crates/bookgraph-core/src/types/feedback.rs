//! Critique of a single graph version.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Highest rating a graph can receive.
pub const MAX_RATING: u8 = 10;

/// A rating plus improvement opinion for exactly one graph version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Feedback {
    /// Score from 0 to 10
    #[schemars(range(min = 0, max = 10))]
    pub rating: u8,
    /// How the graph could be improved
    pub opinion: String,
}

impl Feedback {
    /// Creates feedback, rejecting ratings outside `0..=10`.
    pub fn new(rating: i64, opinion: impl Into<String>) -> Result<Self> {
        let checked = u8::try_from(rating)
            .ok()
            .filter(|r| *r <= MAX_RATING)
            .ok_or(Error::InvalidRating {
                rating,
                max: MAX_RATING,
            })?;
        Ok(Self {
            rating: checked,
            opinion: opinion.into(),
        })
    }

    /// Checks the rating range of a deserialized value.
    pub fn validate(&self) -> Result<()> {
        if self.rating > MAX_RATING {
            return Err(Error::InvalidRating {
                rating: i64::from(self.rating),
                max: MAX_RATING,
            });
        }
        Ok(())
    }

    /// Returns `true` if the rating reaches `threshold`.
    pub fn meets(&self, threshold: u8) -> bool {
        self.rating >= threshold
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.rating, MAX_RATING, self.opinion)
    }
}
