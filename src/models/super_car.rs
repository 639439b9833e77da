use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperCarValuationResponse {
    pub valuation: ValuationRange,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRange {
    pub lower_value: f64,
    pub upper_value: f64,
}
