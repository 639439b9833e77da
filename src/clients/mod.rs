pub mod circuit_breaker;
pub mod database;
pub mod health;
pub mod premium_car;
pub mod super_car;
pub mod valuation;
