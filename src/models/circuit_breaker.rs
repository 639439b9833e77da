use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CircuitState {
    Closed,
    Open,
}

impl CircuitState {
    pub fn as_str(&self) -> &str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold_percentage: u32,
    pub reset_timeout_ms: u64,
}

impl CircuitBreakerConfig {
    pub fn reset_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.reset_timeout_ms)
    }
}
