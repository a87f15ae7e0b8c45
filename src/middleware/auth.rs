use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{error::AppError, AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects the request unless `X-API-Key` matches the configured key exactly.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .is_some_and(|value| value.as_bytes() == state.api_key.as_bytes());

    if !authorized {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request with missing or invalid API key"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
