//! Scripted gateway for tests and offline runs.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{CompletionGateway, CompletionRequest};
use crate::error::CompletionError;

type Scripted = std::result::Result<serde_json::Value, CompletionError>;

#[derive(Default)]
struct MockState {
    script: VecDeque<Scripted>,
    defaults: HashMap<&'static str, serde_json::Value>,
    requests: Vec<CompletionRequest>,
}

/// Gateway that replays queued responses and records every request.
///
/// Scripted responses are consumed in order. Once the script is exhausted,
/// a per-shape default answers if one is registered; otherwise the call fails
/// with a transport error.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    /// Creates a mock that returns `values` in order.
    pub fn new(values: Vec<serde_json::Value>) -> Self {
        Self::from_script(values.into_iter().map(Ok).collect())
    }

    /// Creates a mock from a script mixing values and failures.
    pub fn from_script(script: Vec<Scripted>) -> Self {
        Self {
            state: Mutex::new(MockState {
                script: script.into(),
                ..MockState::default()
            }),
        }
    }

    /// Registers the answer used for `shape` once the script runs out.
    pub fn with_default(self, shape: &'static str, value: serde_json::Value) -> Self {
        self.lock().defaults.insert(shape, value);
        self
    }

    /// Queues a successful response.
    pub fn push_value(&self, value: serde_json::Value) {
        self.lock().script.push_back(Ok(value));
    }

    /// Queues a failure.
    pub fn push_error(&self, error: CompletionError) {
        self.lock().script.push_back(Err(error));
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Returns the number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock().script.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CompletionGateway for MockGateway {
    async fn complete_value(&self, request: CompletionRequest) -> Scripted {
        let mut state = self.lock();
        let shape = request.shape.name;
        state.requests.push(request);

        if let Some(next) = state.script.pop_front() {
            return next;
        }
        state.defaults.get(shape).cloned().ok_or_else(|| {
            CompletionError::transport(format!("mock script exhausted (shape {shape})"))
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
