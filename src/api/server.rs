//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::Config;
use crate::search::SceneSearcher;

use super::{handlers, models::ErrorBody, models::SearchInfo};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<SceneSearcher>,
    pub config: Arc<Config>,
}

/// Configure and start the HTTP server
pub async fn start_http_server(config: Arc<Config>) -> Result<()> {
    let searcher = Arc::new(SceneSearcher::from_config(&config.search));
    let app_state = AppState {
        searcher,
        config: Arc::clone(&config),
    };

    // The web client is served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/search-scene",
            get(search_info_handler).post(search_scene_handler),
        )
        .with_state(app_state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(handlers::health_check()))
}

/// Informational GET, mirroring the POST contract for quick probing
async fn search_info_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(SearchInfo::current()))
}

/// Scene search handler
///
/// The body is taken as raw JSON so field validation can produce a 400 with
/// a specific message instead of a generic deserialization rejection.
async fn search_scene_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let request = match handlers::validate_search_body(&body) {
        Ok(request) => request,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response();
        }
    };

    match handlers::search_scene(&state.searcher, request).await {
        Ok(matches) => (StatusCode::OK, Json(matches)).into_response(),
        Err(e) => {
            // Only reached when every tier, including the offline keyword
            // fallback, failed.
            error!("scene search exhausted all tiers: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::with_details("Failed to search scenes", e.to_string())),
            )
                .into_response()
        }
    }
}
