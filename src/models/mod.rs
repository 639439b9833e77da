pub mod circuit_breaker;
pub mod health;
pub mod premium_car;
pub mod response;
pub mod super_car;
pub mod validation;
pub mod valuation;
