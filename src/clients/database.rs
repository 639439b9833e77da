use anyhow::{Error, Result, anyhow};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tracing::{debug, error, info};

use crate::models::valuation::VehicleValuation;

#[derive(Clone)]
pub struct ValuationStore {
    pool: SqlitePool,
}

impl ValuationStore {
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        info!("Connecting to SQLite database");

        // One connection: in-memory databases are per-connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vehicle_valuations (
                vrm TEXT PRIMARY KEY,
                lowest_value REAL NOT NULL,
                highest_value REAL NOT NULL,
                provider_name TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| anyhow!("Failed to create valuations table: {}", e))?;

        info!("SQLite connection established");

        Ok(Self { pool })
    }

    pub async fn find_by_vrm(&self, vrm: &str) -> Result<Option<VehicleValuation>, Error> {
        let valuation = sqlx::query_as::<_, VehicleValuation>(
            "SELECT vrm, lowest_value, highest_value, provider_name \
             FROM vehicle_valuations WHERE vrm = ?",
        )
        .bind(vrm)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("Database read failed: {}", e))?;

        Ok(valuation)
    }

    /// Inserts a valuation; a concurrent writer winning the race on the same
    /// vrm is not an error.
    pub async fn insert(&self, valuation: &VehicleValuation) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO vehicle_valuations (vrm, lowest_value, highest_value, provider_name) \
             VALUES (?, ?, ?, ?) ON CONFLICT(vrm) DO NOTHING",
        )
        .bind(valuation.vrm.as_str())
        .bind(valuation.lowest_value)
        .bind(valuation.highest_value)
        .bind(valuation.provider_name.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, vrm = %valuation.vrm, "Failed to save valuation");
            anyhow!("Database write failed: {}", e)
        })?;

        debug!(vrm = %valuation.vrm, "Valuation written to database");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!("Database health check failed: {}", e))?;

        Ok(())
    }
}
