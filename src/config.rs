use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::models::circuit_breaker::CircuitBreakerConfig;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_super_car_valuation_url")]
    pub super_car_valuation_url: String,

    #[serde(default = "default_premium_car_valuation_url")]
    pub premium_car_valuation_url: String,

    #[serde(default = "default_breaker_failure_threshold_percentage")]
    pub breaker_failure_threshold_percentage: u32,

    #[serde(default = "default_breaker_reset_timeout_ms")]
    pub breaker_reset_timeout_ms: u64,
}

fn default_server_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_super_car_valuation_url() -> String {
    "https://run.mocky.io/v3/9245229e-5c57-44e1-964b-36c7fb29168b".to_string()
}

fn default_premium_car_valuation_url() -> String {
    "https://run.mocky.io/v3/0dfda26a-3a5a-43e5-b68c-51f148eda473".to_string()
}

fn default_breaker_failure_threshold_percentage() -> u32 {
    50
}

fn default_breaker_reset_timeout_ms() -> u64 {
    60_000
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        Ok(config)
    }

    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold_percentage: self.breaker_failure_threshold_percentage,
            reset_timeout_ms: self.breaker_reset_timeout_ms,
        }
    }
}
