//! Client for the fingerprint (piracy detection / content ingestion)
//! service.
//!
//! `POST /query` checks an uploaded video against the reference fingerprint
//! database; `POST /ingest` registers a new reference title. Both endpoints
//! are restricted to production-role sessions — the role check happens here,
//! explicitly, rather than in whatever UI sits in front.

use anyhow::{anyhow, Result};
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::FingerprintConfig;
use crate::session::Session;

/// Result of a piracy check.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchReport {
    pub match_found: bool,
    pub message: String,
    pub matched_video_id: Option<String>,
    pub title: Option<String>,
    pub file_path: Option<String>,
    pub similarity_ratio: Option<f64>,
    pub audio_matches: Option<u32>,
    pub visual_matches: Option<u32>,
}

/// Receipt for an ingested reference title.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestReceipt {
    pub status: String,
    pub video_id: String,
    pub duration: f64,
    pub audio_hashes: u32,
    pub visual_hashes: u32,
}

pub struct FingerprintClient {
    client: reqwest::Client,
    base_url: String,
}

impl FingerprintClient {
    pub fn new(config: &FingerprintConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Check a video against the fingerprint database.
    pub async fn query(&self, session: &Session, media_path: &Path) -> Result<MatchReport> {
        self.authorize(session)?;

        let form = multipart::Form::new().part("file", file_part(media_path).await?);
        let url = format!("{}/query", self.base_url);

        info!("querying fingerprint database for {}", media_path.display());
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("fingerprint query failed ({}): {}", status, body));
        }

        Ok(response.json().await?)
    }

    /// Register a reference title in the fingerprint database.
    pub async fn ingest(
        &self,
        session: &Session,
        media_path: &Path,
        title: &str,
    ) -> Result<IngestReceipt> {
        self.authorize(session)?;

        let form = multipart::Form::new()
            .part("file", file_part(media_path).await?)
            .text("title", title.to_string());
        let url = format!("{}/ingest", self.base_url);

        info!("ingesting {:?} from {}", title, media_path.display());
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("fingerprint ingest failed ({}): {}", status, body));
        }

        Ok(response.json().await?)
    }

    fn authorize(&self, session: &Session) -> Result<()> {
        if !session.role.can_verify_content() {
            return Err(anyhow!(
                "content verification requires the production role (current role: {:?})",
                session.role
            ));
        }
        Ok(())
    }
}

async fn file_part(path: &Path) -> Result<multipart::Part> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let bytes = tokio::fs::read(path).await?;
    Ok(multipart::Part::bytes(bytes).file_name(file_name))
}
