#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Bookgraph Refinement Library
//!
//! Prompt construction and the stateful generate / rate / regenerate loop.

pub mod cache;
pub mod controller;
pub mod policy;
pub mod prompts;

pub use cache::{CacheStats, SummaryCache};
pub use controller::RefinementController;
pub use policy::{refine, ModelSelection, RefinementOutcome, RefinementPolicy};
pub use prompts::Criteria;

// Re-export core types
pub use bookgraph_core::{Error, Result};
