use serde::Deserialize;

/// Flat XML document under a `<root>` element; the provider exposes both a
/// private-sale and a dealership range, we persist the dealership one.
#[derive(Debug, Clone, Deserialize)]
pub struct PremiumCarValuationResponse {
    #[serde(rename = "RegistrationDate")]
    pub registration_date: String,

    #[serde(rename = "RegistrationMonth")]
    pub registration_month: u32,

    #[serde(rename = "RegistrationYear")]
    pub registration_year: u32,

    #[serde(rename = "ValuationPrivateSaleMinimum")]
    pub private_sale_minimum: f64,

    #[serde(rename = "ValuationPrivateSaleMaximum")]
    pub private_sale_maximum: f64,

    #[serde(rename = "ValuationDealershipMinimum")]
    pub dealership_minimum: f64,

    #[serde(rename = "ValuationDealershipMaximum")]
    pub dealership_maximum: f64,
}
