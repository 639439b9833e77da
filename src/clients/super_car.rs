use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use reqwest::Client;
use tracing::{debug, info};

use crate::{
    config::Config,
    models::{super_car::SuperCarValuationResponse, valuation::VehicleValuation},
};

pub const SUPER_CAR_PROVIDER_NAME: &str = "SuperCarValuation";

/// Client for the fast (primary) valuation provider.
#[derive(Clone)]
pub struct SuperCarClient {
    http_client: Client,
    base_url: String,
}

impl SuperCarClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url = %config.super_car_valuation_url, "SuperCar valuation client initialized");

        Ok(Self {
            http_client,
            base_url: config.super_car_valuation_url.clone(),
        })
    }

    pub async fn fetch_valuation(&self, vrm: &str, mileage: u32) -> Result<VehicleValuation, Error> {
        let url = format!("{}/valuations/{}?mileage={}", self.base_url, vrm, mileage);

        debug!(vrm, mileage, "Fetching valuation from SuperCar");

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("SuperCar valuation returned status {}", status));
        }

        let body: SuperCarValuationResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse SuperCar valuation JSON: {}", e))?;

        Ok(VehicleValuation {
            vrm: vrm.to_string(),
            lowest_value: body.valuation.lower_value,
            highest_value: body.valuation.upper_value,
            provider_name: Some(SUPER_CAR_PROVIDER_NAME.to_string()),
        })
    }
}
