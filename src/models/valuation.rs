use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VehicleValuation {
    pub vrm: String,
    pub lowest_value: f64,
    pub highest_value: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
}

impl VehicleValuation {
    pub fn midpoint_value(&self) -> f64 {
        (self.highest_value + self.lowest_value) / 2.0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleValuationRequest {
    pub mileage: Option<i64>,
}
