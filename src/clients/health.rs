use std::{collections::HashMap, time::Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    clients::{circuit_breaker::CircuitBreaker, database::ValuationStore},
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

pub struct HealthChecker {
    store: ValuationStore,
    circuit_breaker: CircuitBreaker,
}

impl HealthChecker {
    pub fn new(store: ValuationStore, circuit_breaker: CircuitBreaker) -> Self {
        Self {
            store,
            circuit_breaker,
        }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        checks.insert("database".to_string(), self.check_database().await);
        checks.insert(
            "valuation_providers".to_string(),
            self.check_circuit_breaker(),
        );

        let status = self.determine_overall_status(&checks);

        HealthCheckResponse {
            status,
            timestamp: Utc::now(),
            checks,
        }
    }

    async fn check_database(&self) -> ServiceHealth {
        let start = Instant::now();

        match self.store.health_check().await {
            Ok(_) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(response_time_ms = elapsed, "Database health check passed");
                ServiceHealth::healthy(elapsed)
            }
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                ServiceHealth::unhealthy(format!("Health check query failed: {}", e))
            }
        }
    }

    fn check_circuit_breaker(&self) -> ServiceHealth {
        let state = self.circuit_breaker.state();

        debug!(circuit_state = state.as_str(), "Circuit breaker state checked");

        ServiceHealth::circuit(state)
    }

    fn determine_overall_status(&self, checks: &HashMap<String, ServiceHealth>) -> HealthStatus {
        let has_unhealthy = checks
            .values()
            .any(|health| health.status == HealthStatus::Unhealthy);

        let has_degraded = checks
            .values()
            .any(|health| health.status == HealthStatus::Degraded);

        if has_unhealthy {
            HealthStatus::Unhealthy
        } else if has_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
