//! LLM-backed search tiers.
//!
//! Tier 1 asks for a strict JSON object and validates every candidate
//! individually; tier 2 uses a smaller context and accepts a looser response
//! shape, with confidence capped to reflect lower trust. Both re-hydrate
//! timing and text from the authoritative cue sequence — the model's echoed
//! values are never trusted.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::llm::{ChatMessage, ChatOptions, Llm};
use super::{SceneMatch, SearchRequest, SearchStrategy};
use crate::subtitle::Cue;

/// Confidence ceiling for the loose-shape fallback tier.
const FALLBACK_CONFIDENCE_CAP: f64 = 0.7;

/// Render seconds as `m:ss` for prompt context lines.
fn format_clock(seconds: f64) -> String {
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", mins, secs)
}

fn cue_index(cues: &[Cue]) -> HashMap<u32, &Cue> {
    cues.iter().map(|c| (c.index, c)).collect()
}

/// Accept any positive integral JSON number as a cue index. Models emit
/// both `2` and `2.0`; both refer to the same cue.
fn numeric_index(value: &Value) -> Option<u32> {
    let index = value.as_f64()?;
    if index <= 0.0 || index.fract() != 0.0 || index > f64::from(u32::MAX) {
        return None;
    }
    Some(index as u32)
}

/// Validate one candidate object from a structured response.
///
/// Required: numeric `subtitleIndex > 0`, numeric `confidence` within
/// [0, 1], string `reason`. A failing candidate is dropped, never repaired.
fn validate_candidate(candidate: &Value) -> Option<(u32, f64, String)> {
    let index = numeric_index(candidate.get("subtitleIndex")?)?;
    let confidence = candidate.get("confidence")?.as_f64()?;
    if !(0.0..=1.0).contains(&confidence) {
        return None;
    }
    let reason = candidate.get("reason")?.as_str()?;
    Some((index, confidence, reason.to_string()))
}

/// Tier 1: structured LLM search over a bounded context window.
pub struct StructuredLlmSearch {
    llm: Arc<dyn Llm>,
    context_cues: usize,
    max_matches: usize,
}

impl StructuredLlmSearch {
    pub fn new(llm: Arc<dyn Llm>, context_cues: usize, max_matches: usize) -> Self {
        Self {
            llm,
            context_cues,
            max_matches,
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            r#"You are a video scene search assistant that understands scenarios, contexts, and semantic meaning. Find subtitle segments that match the user's query based on meaning, not just keywords.

Consider emotional tone, actions and events, situations and contexts, character interactions, and thematic relevance. The subtitles are translated; the query is in English. Match meaning, not literal words.

Return exactly this JSON format:
{{
  "matches": [
    {{
      "subtitleIndex": number,
      "startTime": number,
      "endTime": number,
      "text": string,
      "confidence": number (0.0-1.0),
      "reason": string (why this matches the scenario)
    }}
  ]
}}

Confidence: 0.9-1.0 perfect match, 0.7-0.89 strong, 0.5-0.69 good, 0.3-0.49 partial, below 0.3 weak.
Return the {} most relevant matches, highest confidence first."#,
            self.max_matches
        )
    }

    fn user_prompt(&self, request: &SearchRequest) -> String {
        let context = request
            .subtitles
            .iter()
            .take(self.context_cues)
            .map(|cue| {
                format!(
                    "[{}] {}-{}: {}",
                    cue.index,
                    format_clock(cue.start_time),
                    format_clock(cue.end_time),
                    cue.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "VIDEO METADATA:\n- Duration: {}\n- Target Language: {}\n- Total Subtitles: {}\n\nUSER'S SCENARIO QUERY: \"{}\"\n\nTRANSLATED SUBTITLES TO ANALYZE:\n{}\n\nFind subtitle segments that semantically match the described scenario and return them in the specified JSON format.",
            format_clock(request.video_duration),
            request.target_language,
            request.subtitles.len(),
            request.query,
            context
        )
    }

    fn parse_response(&self, content: &str, request: &SearchRequest) -> Result<Vec<SceneMatch>> {
        let parsed: Value = serde_json::from_str(content)
            .map_err(|e| anyhow!("structured response was not valid JSON: {}", e))?;

        let candidates = parsed
            .get("matches")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let by_index = cue_index(&request.subtitles);
        let mut validated = Vec::new();

        for candidate in candidates.iter().take(self.max_matches) {
            let Some((index, confidence, reason)) = validate_candidate(candidate) else {
                debug!("dropping candidate failing validation: {}", candidate);
                continue;
            };
            // Unknown indices are discarded, never fabricated.
            let Some(cue) = by_index.get(&index) else {
                debug!("dropping candidate referencing unknown cue index {}", index);
                continue;
            };
            let reason = if reason.is_empty() {
                format!("Matches scenario: {}", request.query)
            } else {
                reason
            };
            validated.push(SceneMatch {
                subtitle_index: index,
                start_time: cue.start_time,
                end_time: cue.end_time,
                text: cue.text.clone(),
                confidence: confidence.clamp(0.0, 1.0),
                reason,
            });
        }

        Ok(validated)
    }
}

#[async_trait]
impl SearchStrategy for StructuredLlmSearch {
    fn name(&self) -> &'static str {
        "llm-structured"
    }

    fn max_results(&self) -> usize {
        self.max_matches
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SceneMatch>> {
        let messages = vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.user_prompt(request)),
        ];
        let options = ChatOptions {
            temperature: 0.2,
            max_tokens: 2048,
            json_object: true,
        };

        let response = self.llm.chat(messages, &options).await?;
        debug!(
            "structured search completed (tokens: {:?})",
            response.tokens_used
        );
        self.parse_response(&response.content, request)
    }
}

/// Tier 2: semantic fallback with a smaller context and a looser response
/// shape (a bare array or a `{"matches": [...]}` object both parse).
pub struct SemanticLlmSearch {
    llm: Arc<dyn Llm>,
    context_cues: usize,
    max_matches: usize,
}

impl SemanticLlmSearch {
    pub fn new(llm: Arc<dyn Llm>, context_cues: usize, max_matches: usize) -> Self {
        Self {
            llm,
            context_cues,
            max_matches,
        }
    }

    fn user_prompt(&self, request: &SearchRequest) -> String {
        let context = request
            .subtitles
            .iter()
            .take(self.context_cues)
            .map(|cue| format!("[{}] {}", cue.index, cue.text))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Find subtitle segments that match this scenario: \"{}\"\n\nAvailable subtitles (first {}):\n{}\n\nReturn 3-{} matches with confidence scores. Focus on meaning and context.",
            request.query, self.context_cues, context, self.max_matches
        )
    }

    fn parse_response(&self, content: &str, request: &SearchRequest) -> Result<Vec<SceneMatch>> {
        let parsed: Value = serde_json::from_str(content)
            .map_err(|e| anyhow!("fallback response was not valid JSON: {}", e))?;

        let candidates = match &parsed {
            Value::Array(items) => items.clone(),
            other => other
                .get("matches")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };

        let by_index = cue_index(&request.subtitles);
        let mut matches = Vec::new();

        for candidate in &candidates {
            let Some(index) = candidate.get("subtitleIndex").and_then(numeric_index) else {
                continue;
            };
            let Some(confidence) = candidate.get("confidence").and_then(Value::as_f64) else {
                continue;
            };
            if confidence <= 0.0 {
                continue;
            }
            let Some(cue) = by_index.get(&index) else {
                continue;
            };
            let reason = candidate
                .get("reason")
                .and_then(Value::as_str)
                .filter(|r| !r.is_empty())
                .unwrap_or("Semantic match")
                .to_string();
            matches.push(SceneMatch {
                subtitle_index: index,
                start_time: cue.start_time,
                end_time: cue.end_time,
                text: cue.text.clone(),
                confidence: confidence.min(FALLBACK_CONFIDENCE_CAP),
                reason,
            });
        }

        Ok(matches)
    }
}

#[async_trait]
impl SearchStrategy for SemanticLlmSearch {
    fn name(&self) -> &'static str {
        "llm-semantic-fallback"
    }

    fn max_results(&self) -> usize {
        self.max_matches
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SceneMatch>> {
        let messages = vec![
            ChatMessage::system(
                "Find subtitle segments that match scenarios. Return JSON with subtitleIndex, confidence (0-1), and brief reason.",
            ),
            ChatMessage::user(self.user_prompt(request)),
        ];
        let options = ChatOptions {
            temperature: 0.3,
            max_tokens: 1024,
            json_object: false,
        };

        let response = match self.llm.chat(messages, &options).await {
            Ok(response) => response,
            Err(e) => {
                warn!("semantic fallback LLM call failed: {}", e);
                return Err(e);
            }
        };
        self.parse_response(&response.content, request)
    }
}
