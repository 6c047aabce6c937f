//! Natural-language scene search over subtitle tracks.
//!
//! A query runs through an ordered cascade of strategies: a structured LLM
//! search, a looser LLM fallback, and finally a deterministic keyword
//! matcher. Each tier returns a result value rather than throwing across
//! tiers; the orchestrator walks the list until one yields a non-empty
//! validated result.

pub mod keywords;
pub mod llm;
pub mod strategies;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::subtitle::Cue;

use keywords::keyword_matches;
use strategies::{SemanticLlmSearch, StructuredLlmSearch};

/// A cue surfaced as relevant to a search query.
///
/// Timing and text are always re-hydrated from the originating cue
/// sequence — `subtitle_index` refers to an existing [`Cue`] by invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneMatch {
    pub subtitle_index: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    /// Within [0, 1]; fallback tiers are capped lower to signal reduced
    /// trust.
    pub confidence: f64,
    pub reason: String,
}

/// One scene-search invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub subtitles: Vec<Cue>,
    pub video_duration: f64,
    #[serde(default = "default_language")]
    pub target_language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// One tier of the search cascade.
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Result-count cap the orchestrator applies to this tier's output.
    fn max_results(&self) -> usize;

    /// Returns validated matches; an error or an empty result both hand
    /// control to the next tier.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SceneMatch>>;
}

/// Orchestrates the tiered search cascade.
pub struct SceneSearcher {
    strategies: Vec<Box<dyn SearchStrategy>>,
}

impl SceneSearcher {
    /// Build the standard cascade from configuration. The LLM tiers are only
    /// constructed when a provider is configured; the keyword tier is always
    /// present, so a search can never fail outright for want of an API key.
    pub fn from_config(config: &SearchConfig) -> Self {
        let mut strategies: Vec<Box<dyn SearchStrategy>> = Vec::new();

        if config.llm_configured() {
            match llm::create_llm(&config.llm) {
                Ok(provider) => {
                    let provider: Arc<dyn llm::Llm> = Arc::from(provider);
                    strategies.push(Box::new(StructuredLlmSearch::new(
                        Arc::clone(&provider),
                        config.context_cues,
                        config.max_matches,
                    )));
                    strategies.push(Box::new(SemanticLlmSearch::new(
                        provider,
                        config.fallback_context_cues,
                        config.fallback_max_matches,
                    )));
                }
                Err(e) => {
                    warn!("LLM provider unavailable, keyword tier only: {}", e);
                }
            }
        } else {
            info!("No LLM provider configured, scene search uses the keyword tier only");
        }

        strategies.push(Box::new(KeywordSearch {
            max_results: config.fallback_max_matches,
        }));

        Self { strategies }
    }

    /// Build a cascade from explicit strategies. Used by tests to script
    /// tier behavior.
    pub fn with_strategies(strategies: Vec<Box<dyn SearchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Run the cascade for one request.
    ///
    /// Tier failures are absorbed: an error only reaches the caller when
    /// every tier failed. A run where some tier succeeded with zero matches
    /// yields an empty result, never an error.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SceneMatch>> {
        let mut last_error: Option<anyhow::Error> = None;
        let mut any_succeeded = false;

        for strategy in &self.strategies {
            match strategy.search(request).await {
                Ok(matches) if !matches.is_empty() => {
                    let mut matches = matches;
                    sort_by_confidence(&mut matches);
                    matches.truncate(strategy.max_results());
                    info!(
                        "scene search: {} matches via {} for query {:?}",
                        matches.len(),
                        strategy.name(),
                        request.query
                    );
                    return Ok(matches);
                }
                Ok(_) => {
                    debug!("{} produced no matches, trying next tier", strategy.name());
                    any_succeeded = true;
                }
                Err(e) => {
                    warn!("{} failed: {}, trying next tier", strategy.name(), e);
                    last_error = Some(e);
                }
            }
        }

        if any_succeeded {
            Ok(Vec::new())
        } else {
            Err(last_error.unwrap_or_else(|| anyhow!("no search strategies configured")))
        }
    }
}

/// Keyword tier wrapper; pure computation, always succeeds.
pub struct KeywordSearch {
    pub max_results: usize,
}

#[async_trait]
impl SearchStrategy for KeywordSearch {
    fn name(&self) -> &'static str {
        "keyword-fallback"
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SceneMatch>> {
        Ok(keyword_matches(&request.query, &request.subtitles))
    }
}

pub(crate) fn sort_by_confidence(matches: &mut [SceneMatch]) {
    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cues: Vec<Cue>) -> SearchRequest {
        SearchRequest {
            query: "angry argument".to_string(),
            subtitles: cues,
            video_duration: 60.0,
            target_language: "en".to_string(),
        }
    }

    struct Fixed(Vec<SceneMatch>);

    #[async_trait]
    impl SearchStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn max_results(&self) -> usize {
            8
        }
        async fn search(&self, _request: &SearchRequest) -> Result<Vec<SceneMatch>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl SearchStrategy for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn max_results(&self) -> usize {
            8
        }
        async fn search(&self, _request: &SearchRequest) -> Result<Vec<SceneMatch>> {
            Err(anyhow!("simulated outage"))
        }
    }

    fn scene_match(index: u32, confidence: f64) -> SceneMatch {
        SceneMatch {
            subtitle_index: index,
            start_time: index as f64,
            end_time: index as f64 + 2.0,
            text: format!("cue {}", index),
            confidence,
            reason: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_nonempty_tier_wins() {
        let searcher = SceneSearcher::with_strategies(vec![
            Box::new(Fixed(vec![])),
            Box::new(Fixed(vec![scene_match(1, 0.5)])),
            Box::new(Fixed(vec![scene_match(2, 0.9)])),
        ]);
        let result = searcher.search(&request(vec![])).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].subtitle_index, 1);
    }

    #[tokio::test]
    async fn test_failed_tier_falls_through() {
        let searcher = SceneSearcher::with_strategies(vec![
            Box::new(Failing),
            Box::new(Fixed(vec![scene_match(3, 0.4)])),
        ]);
        let result = searcher.search(&request(vec![])).await.unwrap();
        assert_eq!(result[0].subtitle_index, 3);
    }

    #[tokio::test]
    async fn test_all_tiers_failed_is_an_error() {
        let searcher =
            SceneSearcher::with_strategies(vec![Box::new(Failing), Box::new(Failing)]);
        assert!(searcher.search(&request(vec![])).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_success_is_not_an_error() {
        let searcher =
            SceneSearcher::with_strategies(vec![Box::new(Failing), Box::new(Fixed(vec![]))]);
        let result = searcher.search(&request(vec![])).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_results_sorted_and_truncated() {
        let matches: Vec<SceneMatch> =
            (1..=12).map(|i| scene_match(i, i as f64 / 12.0)).collect();
        let searcher = SceneSearcher::with_strategies(vec![Box::new(Fixed(matches))]);
        let result = searcher.search(&request(vec![])).await.unwrap();
        assert_eq!(result.len(), 8);
        assert!(result.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert_eq!(result[0].subtitle_index, 12);
    }

    #[tokio::test]
    async fn test_keyword_tier_always_reachable() {
        let cues = vec![Cue::new(1, 0.0, 2.0, "You are so stupid, I hate you!")];
        let searcher = SceneSearcher::with_strategies(vec![
            Box::new(Failing),
            Box::new(KeywordSearch { max_results: 5 }),
        ]);
        let result = searcher.search(&request(cues)).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].reason.contains("angry"));
    }
}
