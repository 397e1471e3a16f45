//! Health check endpoint.

use actix_web::{HttpResponse, web};

use tally_shared::dto::HealthResponse;

use crate::state::AppState;

/// Health check endpoint - reports live durable-store reachability.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let redis = if state.persistence.is_reachable().await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        redis: redis.to_string(),
    })
}
