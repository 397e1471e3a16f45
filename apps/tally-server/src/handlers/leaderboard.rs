//! Leaderboard endpoint.

use actix_web::{HttpResponse, web};

use tally_core::domain::build_leaderboard;
use tally_shared::dto::LeaderboardEntry;

use crate::state::AppState;

/// GET /api/leaderboard
///
/// Rebuilt from a fresh snapshot on every call.
pub async fn leaderboard(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.counters.snapshot().await;

    let entries: Vec<LeaderboardEntry> = build_leaderboard(&snapshot, chrono::Utc::now())
        .into_iter()
        .map(|row| LeaderboardEntry {
            country: row.country,
            clicks: row.clicks,
            kps: row.kps,
        })
        .collect();

    HttpResponse::Ok().json(entries)
}
