#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Bookgraph Core Library
//!
//! Core types, the structured-completion gateway and graph validation.

pub mod error;
pub mod llm;
pub mod types;
pub mod validate;

// Re-exports for convenience
pub use error::{CompletionError, CompletionErrorKind, Error, IndexViolation, Result};
pub use types::{
    Feedback, HistoryEntry, KnowledgeGraph, Link, Node, RefinementPhase, SessionId,
    SessionSnapshot,
};
pub use validate::StructuralIssue;
