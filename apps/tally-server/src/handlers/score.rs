//! Score submission - logged, not persisted.

use actix_web::{HttpResponse, web};

use tally_shared::StatusResponse;
use tally_shared::dto::ScoreRequest;

/// Scores above this are logged.
pub const HIGH_SCORE_THRESHOLD: i64 = 100;

/// POST /api/score
pub async fn submit_score(body: web::Json<ScoreRequest>) -> HttpResponse {
    let req = body.into_inner();

    if req.score > HIGH_SCORE_THRESHOLD {
        tracing::info!(score = req.score, country = %req.country, "High score");
    }

    HttpResponse::Ok().json(StatusResponse::ok())
}
