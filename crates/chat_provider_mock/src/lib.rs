//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport logic and is intended for local runs and
//! contract-level testing of session behavior.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chat_provider::{
    Completion, CompletionGateway, CompletionRequest, GatewayError, GatewayProfile,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

const DEFAULT_REPLY: &str = "Mocked reply.";
const DEFAULT_TOKENS: u64 = 10;

/// Gateway that replays scripted outcomes and records every request it sees.
///
/// Once the script is exhausted it answers with the fallback reply.
#[derive(Debug)]
pub struct MockGateway {
    script: Mutex<VecDeque<Result<Completion, GatewayError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fallback: Completion,
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    /// Creates a mock that returns `outcomes` in order.
    #[must_use]
    pub fn with_script(outcomes: Vec<Result<Completion, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
            fallback: Completion {
                content: DEFAULT_REPLY.to_string(),
                tokens_used: DEFAULT_TOKENS,
            },
        }
    }

    /// Creates a mock that answers every call with `content` costing `tokens_used`.
    #[must_use]
    pub fn replying(content: impl Into<String>, tokens_used: u64) -> Self {
        let mut gateway = Self::new();
        gateway.fallback = Completion {
            content: content.into(),
            tokens_used,
        };
        gateway
    }

    /// Appends one successful reply to the script.
    pub fn push_reply(&self, content: impl Into<String>, tokens_used: u64) {
        lock_unpoisoned(&self.script).push_back(Ok(Completion {
            content: content.into(),
            tokens_used,
        }));
    }

    /// Appends one failure to the script.
    pub fn push_error(&self, error: GatewayError) {
        lock_unpoisoned(&self.script).push_back(Err(error));
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        lock_unpoisoned(&self.requests).len()
    }

    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    #[must_use]
    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock_unpoisoned(&self.requests).last().cloned()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionGateway for MockGateway {
    fn profile(&self) -> GatewayProfile {
        GatewayProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn complete(&self, request: CompletionRequest) -> Result<Completion, GatewayError> {
        lock_unpoisoned(&self.requests).push(request);

        lock_unpoisoned(&self.script)
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
