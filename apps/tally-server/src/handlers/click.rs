//! Click submission.

use actix_web::{HttpResponse, web};

use tally_core::domain::Click;
use tally_shared::StatusResponse;
use tally_shared::dto::ClickRequest;

use crate::middleware::client_id::ClientId;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/click
///
/// The rate-limit gate runs before any counter mutation. A limiter backend
/// error fails open.
pub async fn submit_click(
    state: web::Data<AppState>,
    client: ClientId,
    body: web::Json<ClickRequest>,
) -> AppResult<HttpResponse> {
    match state.rate_limiter.check(client.as_str()).await {
        Ok(result) if !result.allowed => {
            return Err(AppError::RateLimited {
                retry_after: result.retry_after,
            });
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Rate limiter error, failing open"),
    }

    let req = body.into_inner();
    let click = Click::normalized(req.country, req.clicks);
    state.counters.increment(&click.country, click.clicks).await;

    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}
