//! API data models

use serde::{Deserialize, Serialize};

/// Error body returned when an operation fails outright.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Health check payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Informational payload for `GET /api/search-scene`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchInfo {
    pub message: String,
    pub features: Vec<String>,
    pub usage: String,
}

impl SearchInfo {
    pub fn current() -> Self {
        Self {
            message: "Scene search API is running".to_string(),
            features: vec![
                "Semantic scenario understanding".to_string(),
                "Multi-tier fallback matching".to_string(),
                "Translated subtitle support".to_string(),
            ],
            usage: "POST /api/search-scene with JSON body containing query, subtitles, video_duration, and target_language".to_string(),
        }
    }
}
