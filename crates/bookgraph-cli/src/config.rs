//! Layered configuration for the `bookgraph` binary.
//!
//! Values come from the TOML file first, then `BOOKGRAPH_*` environment
//! variables, then command-line flags (applied by the caller).

use bookgraph_core::llm::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, OpenAiConfig, RetryPolicy};
use bookgraph_core::types::MAX_RATING;
use bookgraph_core::{Error, Result};
use bookgraph_refine::{ModelSelection, RefinementPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project name used for the config directory.
pub const PROJECT_NAME: &str = "bookgraph";

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookgraphConfig {
    /// Completion provider settings
    pub llm: LlmSection,
    /// Refinement defaults
    pub refine: RefineSection,
    /// Summary cache settings
    pub cache: CacheSection,
}

/// `[llm]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// API root of an OpenAI-compatible provider
    pub base_url: String,
    /// Bearer token; usually supplied through the environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-call deadline in seconds
    pub timeout_secs: u64,
    /// Models the gateway may call; empty allows any
    pub allowed_models: Vec<String>,
    /// Answer every call from a canned offline gateway
    pub use_mock: bool,
    /// Backoff for transient failures
    pub retry: RetrySection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            allowed_models: vec![
                "gpt-4o".to_string(),
                "gpt-4".to_string(),
                "gpt-3.5-turbo".to_string(),
            ],
            use_mock: false,
            retry: RetrySection::default(),
        }
    }
}

/// `[llm.retry]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Total attempts per call, including the first; 1 disables retrying
    pub max_attempts: usize,
    /// First backoff delay in milliseconds
    pub min_delay_ms: u64,
    /// Longest backoff delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            min_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// `[refine]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineSection {
    /// Model generating seed and improved graphs
    pub generation_model: String,
    /// Model rating graphs
    pub rating_model: String,
    /// Improvement rounds per `refine` run
    pub max_iterations: u32,
    /// Stop early at this rating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_rating: Option<u8>,
}

impl Default for RefineSection {
    fn default() -> Self {
        let models = ModelSelection::default();
        let policy = RefinementPolicy::default();
        Self {
            generation_model: models.generation,
            rating_model: models.rating,
            max_iterations: policy.max_iterations,
            target_rating: policy.target_rating,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Cached seed graphs; 0 disables the cache
    pub capacity: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            capacity: bookgraph_refine::cache::DEFAULT_CAPACITY,
        }
    }
}

impl BookgraphConfig {
    /// Default config file location, `<config_dir>/bookgraph/config.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
    }

    /// The explicit path if given, else the default location.
    pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path)
    }

    /// Loads the file layer and the process environment layer.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_file(explicit)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reads only the file layer.
    pub fn from_file(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(Error::config(format!(
                    "Config file does not exist at {}",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => match Self::default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        tracing::debug!(path = %path.display(), "Loading config file");
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Overrides values from environment variables resolved by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("BOOKGRAPH_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("BOOKGRAPH_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("BOOKGRAPH_GENERATION_MODEL") {
            self.refine.generation_model = model;
        }
        if let Some(model) = lookup("BOOKGRAPH_RATING_MODEL") {
            self.refine.rating_model = model;
        }
        if let Some(flag) = lookup("BOOKGRAPH_USE_MOCK") {
            self.llm.use_mock = matches!(flag.as_str(), "1" | "true" | "yes");
        }
    }

    /// Rejects values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(Error::config("llm.timeout_secs must be greater than 0"));
        }
        if self.llm.retry.max_attempts == 0 {
            return Err(Error::config("llm.retry.max_attempts must be at least 1"));
        }
        if self.llm.retry.min_delay_ms > self.llm.retry.max_delay_ms {
            return Err(Error::config(
                "llm.retry.min_delay_ms must not exceed llm.retry.max_delay_ms",
            ));
        }
        if let Some(target) = self.refine.target_rating
            && target > MAX_RATING
        {
            return Err(Error::config(format!(
                "refine.target_rating must be between 0 and {MAX_RATING}, got {target}"
            )));
        }
        for model in [&self.refine.generation_model, &self.refine.rating_model] {
            if model.trim().is_empty() {
                return Err(Error::config("model names must not be empty"));
            }
        }
        Ok(())
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Copy with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.llm.api_key.is_some() {
            copy.llm.api_key = Some("********".to_string());
        }
        copy
    }

    /// Gateway connection settings.
    pub fn openai_config(&self) -> Result<OpenAiConfig> {
        let api_key = self.llm.api_key.clone().ok_or_else(|| {
            Error::config("BOOKGRAPH_API_KEY or OPENAI_API_KEY must be set unless --mock is used")
        })?;
        Ok(OpenAiConfig::new(api_key)
            .with_base_url(self.llm.base_url.clone())
            .with_timeout(Duration::from_secs(self.llm.timeout_secs))
            .with_allowed_models(self.llm.allowed_models.clone()))
    }

    /// Backoff settings for the retry decorator.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.llm.retry.max_attempts.saturating_sub(1),
            min_delay: Duration::from_millis(self.llm.retry.min_delay_ms),
            max_delay: Duration::from_millis(self.llm.retry.max_delay_ms),
        }
    }

    /// Default refinement policy.
    pub fn refinement_policy(&self) -> RefinementPolicy {
        let policy = RefinementPolicy::new(self.refine.max_iterations);
        match self.refine.target_rating {
            Some(target) => policy.with_target_rating(target),
            None => policy,
        }
    }

    /// Default model selection.
    pub fn models(&self) -> ModelSelection {
        ModelSelection::new(
            self.refine.generation_model.clone(),
            self.refine.rating_model.clone(),
        )
    }
}
