pub mod products;

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};
use tracing::error;

use crate::{error::AppError, AppState};

/// `Json` extractor whose rejections use the service's error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// A JSON body that must be an object; arrays and scalars are rejected
/// before any payload type sees them.
pub struct JsonObject(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(value) = AppJson::<Value>::from_request(req, state).await?;
        match value {
            Value::Object(map) => Ok(JsonObject(map)),
            _ => Err(AppError::BadRequest(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }
}

pub async fn index() -> Json<serde_json::Value> {
    Json(json!({ "message": "Product API is running successfully!" }))
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn db_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match state.store.check().await {
        Ok(info) => (
            StatusCode::OK,
            Json(json!({
                "status": "Connected",
                "database": info.database,
                "server_ip": info.server_addr,
            })),
        ),
        Err(e) => {
            error!(error = %e, "Database check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "Connection failed",
                    "error": "Database is unreachable",
                })),
            )
        }
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
