use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Error;
use futures_util::{FutureExt, future::BoxFuture};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::circuit_breaker::{CircuitBreakerConfig, CircuitState};

/// Failure kinds surfaced by [`CircuitBreaker::run`].
#[derive(Debug, thiserror::Error)]
pub enum BreakerError {
    #[error("Circuit is open and no fallback provided")]
    CircuitOpen,

    #[error("Primary call failed: {0}")]
    Primary(Error),

    #[error("Fallback call failed: {0}")]
    Fallback(Error),
}

/// Optional secondary operation passed to [`CircuitBreaker::run`].
pub type FallbackFn<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<T, Error>> + Send + 'a>;

/// Boxes a closure for the fallback slot of [`CircuitBreaker::run`].
pub fn with_fallback<'a, T, F, Fut>(fallback: F) -> Option<FallbackFn<'a, T>>
where
    F: FnOnce() -> Fut + Send + 'a,
    Fut: Future<Output = Result<T, Error>> + Send + 'a,
{
    Some(Box::new(move || fallback().boxed()))
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    total_count: u64,
    failure_count: u64,
    pending_reset: Option<JoinHandle<()>>,
}

/// Two-state circuit breaker guarding calls to a primary upstream.
///
/// Tracks the cumulative failure ratio since the last reset. Once the ratio
/// exceeds the configured threshold the circuit opens, the primary is no
/// longer invoked, and a one-shot reset closes the circuit again after
/// `reset_timeout_ms`. One instance is shared by all in-flight requests;
/// cloning shares the same underlying state.
#[derive(Clone)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    shared: Arc<Mutex<BreakerState>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        info!(
            failure_threshold_percentage = config.failure_threshold_percentage,
            reset_timeout_ms = config.reset_timeout_ms,
            "Circuit breaker initialized"
        );

        Self {
            config,
            shared: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                total_count: 0,
                failure_count: 0,
                pending_reset: None,
            })),
        }
    }

    /// Runs `primary` through the breaker, falling back to `fallback` when
    /// the circuit is open or the primary fails.
    ///
    /// Fallback outcomes are returned as-is and never counted; only primary
    /// calls feed the failure ratio. With the circuit open and no fallback,
    /// fails with [`BreakerError::CircuitOpen`] without invoking `primary`.
    pub async fn run<'a, T, P, Fut>(
        &self,
        primary: P,
        fallback: Option<FallbackFn<'a, T>>,
    ) -> Result<T, BreakerError>
    where
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        if self.is_open() {
            return match fallback {
                Some(fb) => fb().await.map_err(BreakerError::Fallback),
                None => {
                    warn!("Circuit is open, rejecting call");
                    Err(BreakerError::CircuitOpen)
                }
            };
        }

        match primary().await {
            Ok(value) => {
                self.lock().total_count += 1;
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                match fallback {
                    Some(fb) => fb().await.map_err(BreakerError::Fallback),
                    None => Err(BreakerError::Primary(err)),
                }
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    pub fn total_count(&self) -> u64 {
        self.lock().total_count
    }

    pub fn failure_count(&self) -> u64 {
        self.lock().failure_count
    }

    /// Forces the circuit into `state` without touching the counters.
    ///
    /// Any pending reset is cancelled, so an overridden state sticks until
    /// the next threshold trip or the next override.
    pub fn override_state(&self, state: CircuitState) {
        let mut shared = self.lock();

        if let Some(handle) = shared.pending_reset.take() {
            handle.abort();
        }

        warn!(state = state.as_str(), "Circuit state forced by override");
        shared.state = state;
    }

    // Counter increments, the threshold check and the open transition form
    // one critical section; the CLOSED guard keeps concurrent failures from
    // scheduling a second reset.
    fn record_failure(&self) {
        let mut shared = self.lock();
        shared.total_count += 1;
        shared.failure_count += 1;

        debug!(
            failures = shared.failure_count,
            total = shared.total_count,
            "Recorded primary failure"
        );

        if shared.state == CircuitState::Closed && self.threshold_reached(&shared) {
            shared.state = CircuitState::Open;
            shared.pending_reset = Some(self.schedule_reset());

            warn!(
                failures = shared.failure_count,
                total = shared.total_count,
                reset_timeout_ms = self.config.reset_timeout_ms,
                "Failure threshold exceeded, circuit opened"
            );
        }
    }

    // Strict inequality on the cumulative ratio: failures/total > threshold/100.
    fn threshold_reached(&self, shared: &BreakerState) -> bool {
        shared.failure_count * 100
            > u64::from(self.config.failure_threshold_percentage) * shared.total_count
    }

    fn schedule_reset(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let timeout = self.config.reset_timeout();

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
            shared.state = CircuitState::Closed;
            shared.total_count = 0;
            shared.failure_count = 0;
            shared.pending_reset = None;

            info!("Reset timeout elapsed, circuit closed");
        })
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
