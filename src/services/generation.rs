//! Client for the subtitle-generation backend.
//!
//! `POST {base}/generate-subtitles` with a multipart media file returns raw
//! SRT text. Generation can legitimately take minutes for long media, so the
//! client carries a long timeout; past it the operation is failed with a
//! distinct error so callers can report timeouts separately from other
//! upstream failures. A single failed attempt surfaces to the user — no
//! retries.

use reqwest::multipart;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::GenerationConfig;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Client-side timeout; reported distinctly from other HTTP failures.
    #[error("subtitle generation timed out after {0} seconds")]
    Timeout(u64),

    /// Non-2xx status from the backend, with its `detail` body when one was
    /// sent.
    #[error("subtitle backend returned {status}: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("could not read media file: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(reqwest::Error),
}

/// Subtitle-generation HTTP client.
pub struct SubtitleGenerator {
    client: reqwest::Client,
    base_url: String,
    timeout_seconds: u64,
}

impl SubtitleGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(GenerationError::Transport)?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Upload a media file and return the generated SRT text.
    pub async fn generate(
        &self,
        media_path: &Path,
        target_language: &str,
        translate_to: Option<&str>,
    ) -> Result<String, GenerationError> {
        let file_name = media_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let bytes = tokio::fs::read(media_path).await?;

        info!(
            "uploading {} ({} bytes) for subtitle generation, target language {}",
            file_name,
            bytes.len(),
            target_language
        );

        let mut form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("target_language", target_language.to_string());
        if let Some(translate_to) = translate_to {
            form = form.text("translate_to", translate_to.to_string());
        }

        let url = format!("{}/generate-subtitles", self.base_url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = extract_detail(&body);
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        let srt = response.text().await.map_err(|e| self.classify(e))?;
        debug!("received {} bytes of SRT text", srt.len());
        Ok(srt)
    }

    fn classify(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout_seconds)
        } else {
            GenerationError::Transport(e)
        }
    }
}

/// Pull the `detail` field out of a JSON error body; fall back to the raw
/// body text.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
