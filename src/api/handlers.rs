//! Request handling logic, separated from routing.

use anyhow::Result;
use serde_json::Value;

use crate::search::{SceneMatch, SceneSearcher, SearchRequest};

use super::models::HealthStatus;

/// Reject a search body before it reaches the cascade. Returns a
/// human-readable message suitable for a 400 response.
pub fn validate_search_body(body: &Value) -> Result<SearchRequest, String> {
    let missing = ["query", "subtitles", "video_duration"]
        .iter()
        .filter(|field| body.get(**field).is_none())
        .map(|field| field.to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(format!(
            "Missing required fields: {}",
            missing.join(", ")
        ));
    }

    let request: SearchRequest = serde_json::from_value(body.clone())
        .map_err(|e| format!("Malformed search request: {}", e))?;

    if request.query.trim().is_empty() {
        return Err("query must not be empty".to_string());
    }
    if request.video_duration <= 0.0 {
        return Err("video_duration must be positive".to_string());
    }

    Ok(request)
}

/// Run the search cascade. Errors here mean every tier failed.
pub async fn search_scene(
    searcher: &SceneSearcher,
    request: SearchRequest,
) -> Result<Vec<SceneMatch>> {
    searcher.search(&request).await
}

pub fn health_check() -> HealthStatus {
    HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}
