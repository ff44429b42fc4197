//! Orchestration and session configuration
//!
//! Plain immutable structs consumed at construction time. Defaults match the
//! service defaults; builder methods override individual knobs.

use std::time::Duration;

/// Instruction message prepended to every model call
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a concise, accurate AI assistant. \
    You can call functions to get weather or news. \
    Default to short, actionable answers. \
    If uncertain, say so and suggest next steps.";

/// Tuning for the turn state machine
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum tool-call rounds per user message before the turn fails
    pub turn_budget: u32,
    /// Upper bound on a single model call
    pub gateway_timeout: Duration,
    /// Total model-call attempts per request, including the first
    pub retry_attempts: u32,
    /// Backoff before the first retry; doubles per attempt
    pub retry_base_delay: Duration,
    /// Ceiling on the backoff delay
    pub retry_max_delay: Duration,
    /// Instruction message prepended to every model call
    pub system_prompt: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            turn_budget: 3,
            gateway_timeout: Duration::from_secs(60),
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(200),
            retry_max_delay: Duration::from_secs(5),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

impl OrchestratorConfig {
    /// Create a config with the default tuning
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum tool-call rounds per turn
    pub fn with_turn_budget(mut self, budget: u32) -> Self {
        self.turn_budget = budget;
        self
    }

    /// Set the model-call timeout
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    /// Set the total model-call attempts per request
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Set the retry backoff window
    pub fn with_retry_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max;
        self
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Send conversations without a system prompt
    pub fn without_system_prompt(mut self) -> Self {
        self.system_prompt = None;
        self
    }
}

/// Session lifecycle tuning
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Evict sessions idle longer than this
    pub ttl: Duration,
    /// Evict least-recently-active sessions beyond this count
    pub max_sessions: usize,
    /// How often the background eviction sweep runs
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_sessions: 1000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    /// Create a config with the default tuning
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the idle TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum live session count
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Set the sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}
