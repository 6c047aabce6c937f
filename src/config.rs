use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::search::llm::LlmConfig;

/// Configuration for अनुवाद्य
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Scene search settings
    pub search: SearchConfig,

    /// Subtitle generation backend settings
    pub generation: GenerationConfig,

    /// Fingerprint (piracy detection) service settings
    pub fingerprint: FingerprintConfig,

    /// Auth session settings
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// LLM provider connection
    pub llm: LlmConfig,

    /// Cues included in the primary search context window
    pub context_cues: usize,

    /// Cues included in the fallback context window (also the keyword scan
    /// window)
    pub fallback_context_cues: usize,

    /// Result cap for the primary tier
    pub max_matches: usize,

    /// Result cap for the fallback tiers
    pub fallback_max_matches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the subtitle-generation backend
    pub endpoint: String,

    /// Client-side timeout; generation of long media is slow
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Base URL of the fingerprint service
    pub endpoint: String,

    /// Client-side timeout
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Auth cookie lifetime in days
    pub cookie_lifetime_days: i64,

    /// Identity token lifetime in minutes
    pub token_lifetime_minutes: i64,

    /// Refresh the token this many minutes before it expires
    pub refresh_margin_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            context_cues: 200,
            fallback_context_cues: 100,
            max_matches: 8,
            fallback_max_matches: 5,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            timeout_seconds: 300,
        }
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8001".to_string(),
            timeout_seconds: 300,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_lifetime_days: 7,
            token_lifetime_minutes: 60,
            refresh_margin_minutes: 5,
        }
    }
}

impl SearchConfig {
    /// Whether an LLM provider can actually be constructed: Groq needs a
    /// key, a local provider needs an endpoint.
    pub fn llm_configured(&self) -> bool {
        self.llm.api_key.is_some() || self.llm.endpoint.is_some()
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "anuvadya.toml",
            "config/anuvadya.toml",
            "/etc/anuvadya/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("Loaded configuration from: {}", path);
                        config.apply_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    /// Override settings from environment variables
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            self.search.llm.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ANUVADYA_LLM_API_KEY") {
            self.search.llm.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var("ANUVADYA_LLM_ENDPOINT") {
            self.search.llm.endpoint = Some(endpoint);
        }
        if let Ok(model) = std::env::var("ANUVADYA_LLM_MODEL") {
            self.search.llm.model = model;
        }
        if let Ok(endpoint) = std::env::var("ANUVADYA_GENERATION_ENDPOINT") {
            self.generation.endpoint = endpoint;
        }
        if let Ok(endpoint) = std::env::var("ANUVADYA_FINGERPRINT_ENDPOINT") {
            self.fingerprint.endpoint = endpoint;
        }
        if let Ok(port) = std::env::var("ANUVADYA_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.search.max_matches == 0 || self.search.fallback_max_matches == 0 {
            return Err(anyhow!("search result caps must be greater than 0"));
        }
        if self.search.context_cues == 0 {
            return Err(anyhow!("context_cues must be greater than 0"));
        }
        if self.generation.timeout_seconds == 0 {
            return Err(anyhow!("generation timeout must be greater than 0"));
        }
        if self.session.cookie_lifetime_days <= 0
            || self.session.token_lifetime_minutes <= 0
            || self.session.refresh_margin_minutes < 0
        {
            return Err(anyhow!("session lifetimes must be positive"));
        }
        if self.session.refresh_margin_minutes >= self.session.token_lifetime_minutes {
            return Err(anyhow!(
                "refresh margin must be shorter than the token lifetime"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.search.context_cues, 200);
        assert_eq!(parsed.generation.timeout_seconds, 300);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9999").unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.search.max_matches, 8);
    }

    #[test]
    fn test_invalid_caps_rejected() {
        let mut config = Config::default();
        config.search.max_matches = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_refresh_margin_bound() {
        let mut config = Config::default();
        config.session.refresh_margin_minutes = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_llm_configured() {
        let mut config = SearchConfig::default();
        assert!(!config.llm_configured());
        config.llm.api_key = Some("key".to_string());
        assert!(config.llm_configured());
    }
}
