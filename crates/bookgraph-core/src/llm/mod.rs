//! Structured-completion gateway.
//!
//! A [`CompletionGateway`] performs one "prompt in, typed value out" call
//! against an LLM provider. It is the single point of external I/O for the
//! refinement loop and the single point of retryable failure. Gateways never
//! retry on their own; wrap one in [`RetryingGateway`] to opt in.

mod mock;
mod openai;
mod retry;

pub use mock::MockGateway;
pub use openai::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, OpenAiConfig, OpenAiGateway};
pub use retry::{RetryPolicy, RetryingGateway};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::types::{Feedback, KnowledgeGraph};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the whole conversation
    System,
    /// The request itself
    User,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who is speaking
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Name and JSON schema of the value a completion must produce.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetShape {
    /// Schema name, also used to route mock responses
    pub name: &'static str,
    /// JSON schema the provider is asked to conform to
    pub schema: serde_json::Value,
}

/// A type a structured completion can be coerced into.
pub trait Shape: DeserializeOwned + JsonSchema + Send {
    /// Schema name sent to the provider.
    const NAME: &'static str;

    /// Checks constraints the schema cannot express.
    fn check(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Builds the target shape for this type.
    fn target_shape() -> TargetShape {
        TargetShape {
            name: Self::NAME,
            schema: schemars::schema_for!(Self).to_value(),
        }
    }
}

impl Shape for KnowledgeGraph {
    const NAME: &'static str = "KnowledgeGraph";
}

impl Shape for Feedback {
    const NAME: &'static str = "Feedback";

    fn check(&self) -> std::result::Result<(), String> {
        self.validate().map_err(|e| e.to_string())
    }
}

/// Request for one structured completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Provider model name
    pub model: String,
    /// Conversation, system message first
    pub messages: Vec<Message>,
    /// Shape the answer must conform to
    pub shape: TargetShape,
}

impl CompletionRequest {
    /// Creates a request for the given model, messages and shape.
    pub fn new(model: impl Into<String>, messages: Vec<Message>, shape: TargetShape) -> Self {
        Self {
            model: model.into(),
            messages,
            shape,
        }
    }

    /// Returns the content of the last user message.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Trait for structured-completion providers.
///
/// Implementations return a JSON value the provider produced for the
/// request's target shape. Typed decoding happens in [`complete`].
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Performs one completion call.
    async fn complete_value(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<serde_json::Value, CompletionError>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Sends `messages` to `model` and decodes the answer into `T`.
///
/// Values that do not deserialize into `T`, or fail `T::check`, are reported
/// as [`CompletionErrorKind::Schema`](crate::CompletionErrorKind::Schema).
pub async fn complete<T: Shape>(
    gateway: &dyn CompletionGateway,
    model: &str,
    messages: Vec<Message>,
) -> std::result::Result<T, CompletionError> {
    let request = CompletionRequest::new(model, messages, T::target_shape());

    tracing::debug!(
        gateway = gateway.name(),
        model = %model,
        shape = T::NAME,
        "Requesting structured completion"
    );

    let value = gateway.complete_value(request).await?;

    let typed: T = serde_json::from_value(value).map_err(|e| {
        CompletionError::schema(format!("response is not a valid {}: {e}", T::NAME))
            .with_source(e)
    })?;
    typed
        .check()
        .map_err(|reason| CompletionError::schema(format!("invalid {}: {reason}", T::NAME)))?;

    Ok(typed)
}
