use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use reqwest::Client;
use tracing::{debug, info};

use crate::{
    config::Config,
    models::{premium_car::PremiumCarValuationResponse, valuation::VehicleValuation},
};

pub const PREMIUM_CAR_PROVIDER_NAME: &str = "PremiumCarValuation";

/// Client for the second (fallback) valuation provider. Answers in XML.
#[derive(Clone)]
pub struct PremiumCarClient {
    http_client: Client,
    base_url: String,
}

impl PremiumCarClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(base_url = %config.premium_car_valuation_url, "PremiumCar valuation client initialized");

        Ok(Self {
            http_client,
            base_url: config.premium_car_valuation_url.clone(),
        })
    }

    pub async fn fetch_valuation(&self, vrm: &str, mileage: u32) -> Result<VehicleValuation, Error> {
        let url = format!("{}/valueCar?vrm={}&mileage={}", self.base_url, vrm, mileage);

        debug!(vrm, mileage, "Fetching valuation from PremiumCar");

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("PremiumCar valuation returned status {}", status));
        }

        let body = response.text().await?;

        let parsed: PremiumCarValuationResponse = quick_xml::de::from_str(&body)
            .map_err(|e| anyhow!("Failed to parse PremiumCar valuation XML: {}", e))?;

        Ok(VehicleValuation {
            vrm: vrm.to_string(),
            lowest_value: parsed.dealership_minimum,
            highest_value: parsed.dealership_maximum,
            provider_name: Some(PREMIUM_CAR_PROVIDER_NAME.to_string()),
        })
    }
}
