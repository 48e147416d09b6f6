// Web server: Axum JSON API for game dislikes and emoji reactions.
//
// Every endpoint is guarded by its own sliding-window limiter keyed by
// client identifier. A rejected request gets a 429 with the standard
// X-RateLimit-* and Retry-After headers (see limit.rs).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::db::Database;
use crate::ratelimit::{spawn_sweeper, EndpointLimits};

pub mod handlers;
pub mod limit;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub limits: Arc<EndpointLimits>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, limits: EndpointLimits) -> Self {
        Self {
            db,
            limits: Arc::new(limits),
        }
    }
}

/// Start the API server and block until it exits.
pub async fn run_server(config: Config, db: Arc<dyn Database>, port: u16, bind: &str) -> Result<()> {
    let state = AppState::new(db, config.endpoint_limits());
    let sweeper = spawn_sweeper(state.limits.clone(), config.sweep_interval);

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("grudge API listening on http://{addr}");

    let result = serve(listener, state).await;
    sweeper.abort();
    result
}

/// Serve the API on an already-bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("API server exited with an error")?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/games/dislike", post(handlers::dislike::add_dislike))
        .route(
            "/api/games/reactions",
            post(handlers::reactions::add_reaction),
        )
        .route("/api/games/top", get(handlers::games::top_games))
        .route("/api/games/{game_id}", get(handlers::games::get_game))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// JSON error body in the shape the mutation batcher understands.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(serde_json::json!({ "success": false, "error": message })),
    )
        .into_response()
}
