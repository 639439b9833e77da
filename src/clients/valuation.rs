use anyhow::{Error, Result, anyhow};
use tracing::{info, warn};

use crate::{
    clients::{
        circuit_breaker::{CircuitBreaker, with_fallback},
        premium_car::PremiumCarClient,
        super_car::SuperCarClient,
    },
    models::valuation::VehicleValuation,
};

/// Binds the two upstream providers to the circuit breaker: SuperCar is the
/// guarded primary, PremiumCar the fallback.
pub struct ValuationFetcher {
    circuit_breaker: CircuitBreaker,
    super_car: SuperCarClient,
    premium_car: PremiumCarClient,
}

impl ValuationFetcher {
    pub fn new(
        circuit_breaker: CircuitBreaker,
        super_car: SuperCarClient,
        premium_car: PremiumCarClient,
    ) -> Self {
        Self {
            circuit_breaker,
            super_car,
            premium_car,
        }
    }

    /// Fetches a valuation through the breaker. Every breaker failure kind is
    /// collapsed into one opaque error for the HTTP boundary; the underlying
    /// kind is logged here before it is discarded.
    pub async fn fetch_valuation(&self, vrm: &str, mileage: u32) -> Result<VehicleValuation, Error> {
        let result = self
            .circuit_breaker
            .run(
                || self.super_car.fetch_valuation(vrm, mileage),
                with_fallback(|| self.premium_car.fetch_valuation(vrm, mileage)),
            )
            .await;

        match result {
            Ok(valuation) => {
                info!(vrm, provider = ?valuation.provider_name, "Valuation fetched");
                Ok(valuation)
            }
            Err(err) => {
                warn!(vrm, error = %err, "Valuation fetch failed");
                Err(anyhow!("Unable to fetch valuation"))
            }
        }
    }
}
