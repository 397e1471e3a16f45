//! HTTP handlers and route configuration.

mod click;
mod health;
mod leaderboard;
mod score;

use actix_web::web;

use crate::middleware::error::json_error_handler;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(json_error_handler),
    )
    .service(
        web::scope("/api")
            .route("/click", web::post().to(click::submit_click))
            .route("/score", web::post().to(score::submit_score))
            .route("/leaderboard", web::get().to(leaderboard::leaderboard))
            .route("/health", web::get().to(health::health_check)),
    );
}
