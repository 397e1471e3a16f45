//! Error handling - RFC 7807 compliant responses.

use std::fmt;
use std::time::Duration;

use actix_web::{HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode};
use tally_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    RateLimited { retry_after: Duration },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::RateLimited { retry_after } => {
                write!(f, "Rate limit exceeded, retry after {:?}", retry_after)
            }
        }
    }
}

impl AppError {
    /// Whole seconds for the `Retry-After` header, never zero.
    fn retry_after_secs(retry_after: &Duration) -> u64 {
        let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        secs.max(1)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::BadRequest(detail) => {
                HttpResponse::build(self.status_code()).json(ErrorResponse::bad_request(detail))
            }
            AppError::RateLimited { retry_after } => {
                let secs = Self::retry_after_secs(retry_after);
                HttpResponse::build(self.status_code())
                    .insert_header(("Retry-After", secs.to_string()))
                    .json(ErrorResponse::too_many_requests("Rate limit exceeded"))
            }
        }
    }
}

/// Route JSON extractor failures through [`AppError`].
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(AppError::retry_after_secs(&Duration::from_millis(40)), 1);
        assert_eq!(AppError::retry_after_secs(&Duration::ZERO), 1);
        assert_eq!(AppError::retry_after_secs(&Duration::from_millis(2_500)), 3);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RateLimited {
                retry_after: Duration::from_millis(10)
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[actix_web::test]
    async fn test_rate_limited_response_is_problem_document() {
        let resp = AppError::RateLimited {
            retry_after: Duration::from_millis(40),
        }
        .error_response();

        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get("Retry-After").unwrap().to_str().unwrap(), "1");

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let problem: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(problem.status, 429);
        assert_eq!(problem.title, "Too Many Requests");
    }
}
