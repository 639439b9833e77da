use std::sync::Arc;

use anyhow::{Error, Result, anyhow};
use tracing_subscriber::EnvFilter;
use valuation_service::{
    api::{AppState, run_api_server},
    clients::{
        circuit_breaker::CircuitBreaker, database::ValuationStore, health::HealthChecker,
        premium_car::PremiumCarClient, super_car::SuperCarClient, valuation::ValuationFetcher,
    },
    config::Config,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = ValuationStore::connect(&config.database_url).await?;
    let circuit_breaker = CircuitBreaker::new(config.circuit_breaker_config());
    let super_car = SuperCarClient::new(&config)?;
    let premium_car = PremiumCarClient::new(&config)?;

    let state = Arc::new(AppState {
        health_checker: HealthChecker::new(store.clone(), circuit_breaker.clone()),
        fetcher: ValuationFetcher::new(circuit_breaker, super_car, premium_car),
        store,
    });

    run_api_server(state, config.server_port)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))?;

    Ok(())
}
