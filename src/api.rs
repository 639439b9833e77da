use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::{
    clients::{database::ValuationStore, health::HealthChecker, valuation::ValuationFetcher},
    models::{
        health::HealthStatus,
        response::ErrorResponse,
        validation::{validate_mileage, validate_vrm},
        valuation::VehicleValuationRequest,
    },
};

pub struct AppState {
    pub store: ValuationStore,
    pub fetcher: ValuationFetcher,
    pub health_checker: HealthChecker,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/valuations/{vrm}", get(get_valuation).put(put_valuation))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(
    state: Arc<AppState>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Valuation server started");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn get_valuation(
    State(state): State<Arc<AppState>>,
    Path(vrm): Path<String>,
) -> Response {
    if let Err(e) = validate_vrm(&vrm) {
        warn!(vrm = %vrm, "Invalid vrm");
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    match state.store.find_by_vrm(&vrm).await {
        Ok(Some(valuation)) => (StatusCode::OK, Json(valuation)).into_response(),
        Ok(None) => {
            warn!(vrm = %vrm, "Valuation not found");
            error_response(
                StatusCode::NOT_FOUND,
                format!("Valuation for VRM {} not found", vrm),
            )
        }
        Err(e) => {
            error!(error = %e, vrm = %vrm, "Failed to read valuation");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

async fn put_valuation(
    State(state): State<Arc<AppState>>,
    Path(vrm): Path<String>,
    body: Result<Json<VehicleValuationRequest>, JsonRejection>,
) -> Response {
    if let Err(e) = validate_vrm(&vrm) {
        warn!(vrm = %vrm, "Invalid vrm");
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(vrm = %vrm, error = %rejection, "Invalid valuation request body");
            return error_response(StatusCode::BAD_REQUEST, "mileage must be a positive number");
        }
    };

    let mileage = match validate_mileage(body.mileage) {
        Ok(mileage) => mileage,
        Err(e) => {
            warn!(vrm = %vrm, mileage = body.mileage, "Invalid mileage");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    match state.store.find_by_vrm(&vrm).await {
        Ok(Some(existing)) => {
            info!(vrm = %vrm, "Valuation already exists, skipping upstream call");
            return (StatusCode::OK, Json(existing)).into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, vrm = %vrm, "Failed to read valuation");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }

    let valuation = match state.fetcher.fetch_valuation(&vrm, mileage).await {
        Ok(valuation) => valuation,
        Err(e) => {
            error!(error = %e, vrm = %vrm, "Failed to fetch valuation");
            return error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string());
        }
    };

    if let Err(e) = state.store.insert(&valuation).await {
        error!(error = %e, vrm = %vrm, "Failed to save valuation");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    }

    info!(vrm = %vrm, provider = ?valuation.provider_name, "Valuation created");

    (StatusCode::OK, Json(valuation)).into_response()
}

async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health)).into_response()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(status.as_u16(), message))).into_response()
}
