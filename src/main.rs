use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info};

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod observability;

use crate::config::Config;
use crate::db::{PgStore, ProductStore};
use crate::error::AppError;
use crate::observability::metrics::HttpMetrics;

/// Shared application state, cheap to clone (all heap behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub api_key: Arc<str>,
    pub metrics: Arc<HttpMetrics>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    observability::logging::init(config.log_level, config.log_format)?;

    info!(
        db_host = %config.database.host,
        db_port = config.database.port,
        db_name = %config.database.name,
        "Starting product service"
    );

    let pool = db::connect(&config.database);
    if config.init_db_on_start {
        info!("Bootstrapping schema...");
        db::bootstrap_schema(&pool).await?;
    }

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        api_key: config.api_key.as_str().into(),
        metrics: Arc::new(HttpMetrics::new()?),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped.");
    Ok(())
}

fn build_router(state: AppState) -> Router {
    let auth = axum::middleware::from_fn_with_state(state.clone(), middleware::auth::require_api_key);

    let routes = Router::new()
        // ── Service ─────────────────────────────────────────────────────────
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/db-check", get(handlers::db_check))
        .route("/metrics", get(handlers::metrics))

        // ── Products CRUD (mutations behind the API key) ────────────────────
        .route(
            "/products",
            get(handlers::products::list_products)
                .merge(post(handlers::products::create_product).route_layer(auth.clone())),
        )
        .route(
            "/products/:id",
            get(handlers::products::get_product).merge(
                put(handlers::products::update_product)
                    .delete(handlers::products::delete_product)
                    .route_layer(auth),
            ),
        )
        .fallback(handlers::not_found);

    apply_middleware(routes, state)
}

/// Outer layers shared by every route: panics become 500s, then every
/// response (panics included) is logged and counted.
fn apply_middleware(router: Router<AppState>, state: AppState) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_log::track_requests,
        ))
        .with_state(state)
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections...");
}
