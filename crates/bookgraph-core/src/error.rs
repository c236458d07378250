//! Error types for Bookgraph core library.

use std::fmt;

/// Category of a failed structured-completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompletionErrorKind {
    /// The request never produced an HTTP response (DNS, TLS, connection reset)
    Transport,

    /// The call exceeded its deadline
    Timeout,

    /// The provider answered with a non-success status
    Provider {
        /// HTTP status code returned by the provider
        status: u16,
    },

    /// The provider throttled the request
    RateLimited,

    /// The returned value could not be coerced to the target shape
    Schema,

    /// The requested model is not in the configured allowlist
    UnsupportedModel,
}

impl fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionErrorKind::Transport => write!(f, "transport"),
            CompletionErrorKind::Timeout => write!(f, "timeout"),
            CompletionErrorKind::Provider { status } => write!(f, "provider status {status}"),
            CompletionErrorKind::RateLimited => write!(f, "rate limited"),
            CompletionErrorKind::Schema => write!(f, "schema"),
            CompletionErrorKind::UnsupportedModel => write!(f, "unsupported model"),
        }
    }
}

/// A failed call to the structured-completion gateway.
///
/// This is the only error a [`CompletionGateway`](crate::llm::CompletionGateway)
/// produces. The refinement controller wraps it into [`Error::Generation`]
/// or [`Error::Rating`] depending on which phase of the loop was running.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CompletionError {
    /// What went wrong
    pub kind: CompletionErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Source error if available
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CompletionError {
    /// Creates a completion error of the given kind.
    pub fn new<S: Into<String>>(kind: CompletionErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a transport error.
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::new(CompletionErrorKind::Transport, message)
    }

    /// Creates a timeout error.
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::new(CompletionErrorKind::Timeout, message)
    }

    /// Creates a provider error for a non-success HTTP status.
    pub fn provider<S: Into<String>>(status: u16, message: S) -> Self {
        Self::new(CompletionErrorKind::Provider { status }, message)
    }

    /// Creates a rate-limit error.
    pub fn rate_limited<S: Into<String>>(message: S) -> Self {
        Self::new(CompletionErrorKind::RateLimited, message)
    }

    /// Creates a schema error (value does not conform to the target shape).
    pub fn schema<S: Into<String>>(message: S) -> Self {
        Self::new(CompletionErrorKind::Schema, message)
    }

    /// Creates an unsupported-model error.
    pub fn unsupported_model(model: &str) -> Self {
        Self::new(
            CompletionErrorKind::UnsupportedModel,
            format!("model '{model}' is not allowed"),
        )
    }

    /// Returns whether retrying the same request could succeed.
    ///
    /// Server-side failures, throttling, timeouts and transport errors are
    /// transient. Client errors and schema mismatches are not.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            CompletionErrorKind::Transport => true,
            CompletionErrorKind::Timeout => true,
            CompletionErrorKind::RateLimited => true,
            CompletionErrorKind::Provider { status } => status >= 500,
            CompletionErrorKind::Schema => false,
            CompletionErrorKind::UnsupportedModel => false,
        }
    }
}

/// Why a history index was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexViolation {
    /// No graph has been generated yet
    EmptyHistory,

    /// Indices count backwards from the latest entry and must be `<= 0`
    Positive,

    /// The index reaches further back than the history goes
    OutOfRange {
        /// Number of entries in the history
        len: usize,
    },
}

impl fmt::Display for IndexViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexViolation::EmptyHistory => {
                write!(f, "history is empty, generate an initial graph first")
            }
            IndexViolation::Positive => write!(
                f,
                "index must be 0 or negative (-1 for the latest graph, -2 for the previous one)"
            ),
            IndexViolation::OutOfRange { len } => {
                write!(f, "history only holds {len} entries")
            }
        }
    }
}

/// Errors that can occur while building and refining knowledge graphs.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A gateway call failed outside of a controller operation
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// Generating a seed or improved graph failed
    #[error("Graph generation failed: {source}")]
    Generation {
        /// The underlying gateway failure
        source: CompletionError,
    },

    /// Rating the latest graph failed
    #[error("Graph rating failed: {source}")]
    Rating {
        /// The underlying gateway failure
        source: CompletionError,
    },

    /// A history position that does not exist or has a disallowed sign
    #[error("Invalid history index {index}: {reason}")]
    InvalidIndex {
        /// The requested relative index
        index: i64,
        /// Why it was rejected
        reason: IndexViolation,
    },

    /// Advancement requested before the latest graph was rated
    #[error("Missing feedback: rate the latest graph before advancing")]
    MissingFeedback,

    /// Feedback value outside the accepted range
    #[error("Invalid rating {rating}: must be between 0 and {max}")]
    InvalidRating {
        /// The rejected rating
        rating: i64,
        /// Highest accepted rating
        max: u8,
    },

    /// A parameter combination that is recognised but not supported
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// I/O error (config files, exports)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },
}

/// Convenience `Result` type alias for Bookgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Only failures of the external completion call can be retried;
    /// precondition violations are permanent until the caller changes state.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Completion(source)
            | Error::Generation { source }
            | Error::Rating { source } => source.is_retryable(),
            Error::Io(_) => true,
            Error::InvalidIndex { .. } => false,
            Error::MissingFeedback => false,
            Error::InvalidRating { .. } => false,
            Error::NotImplemented(_) => false,
            Error::Serialization(_) => false,
            Error::Config { .. } => false,
        }
    }

    /// Wraps a gateway failure raised while generating a graph.
    pub fn generation(source: CompletionError) -> Self {
        Error::Generation { source }
    }

    /// Wraps a gateway failure raised while rating a graph.
    pub fn rating(source: CompletionError) -> Self {
        Error::Rating { source }
    }

    /// Creates an invalid-index error.
    pub fn invalid_index(index: i64, reason: IndexViolation) -> Self {
        Error::InvalidIndex { index, reason }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Returns the underlying completion error, if any.
    pub fn completion(&self) -> Option<&CompletionError> {
        match self {
            Error::Completion(source)
            | Error::Generation { source }
            | Error::Rating { source } => Some(source),
            _ => None,
        }
    }
}
