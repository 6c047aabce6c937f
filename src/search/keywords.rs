//! Deterministic keyword fallback matcher.
//!
//! The last tier of the scene-search cascade: no network, no model, just a
//! fixed table of scenario categories scored against cue text. Confidence is
//! capped below the LLM tiers to signal lower trust.

use super::SceneMatch;
use crate::subtitle::Cue;

/// Only the first N cues are scanned, matching the LLM fallback context.
pub const KEYWORD_SCAN_LIMIT: usize = 100;

const CONFIDENCE_CAP: f64 = 0.8;
const INCLUSION_THRESHOLD: f64 = 0.2;

/// Scenario category name → representative keywords.
const SCENARIO_KEYWORDS: &[(&str, &[&str])] = &[
    // Emotional scenarios
    (
        "emotional",
        &["cry", "tears", "emotional", "feelings", "heart", "love", "hug", "comfort", "sorry", "apologize", "forgive"],
    ),
    (
        "romantic",
        &["love", "romantic", "kiss", "marry", "propose", "relationship", "together", "forever", "darling", "sweetheart"],
    ),
    (
        "angry",
        &["angry", "mad", "furious", "yell", "shout", "argument", "fight", "hate", "stupid", "idiot", "bastard"],
    ),
    (
        "sad",
        &["sad", "depressed", "unhappy", "misery", "grief", "loss", "death", "died", "goodbye", "leave"],
    ),
    (
        "happy",
        &["happy", "joy", "celebrate", "party", "congratulations", "success", "win", "achievement", "smile", "laugh"],
    ),
    // Action scenarios
    (
        "action",
        &["fight", "battle", "attack", "defend", "escape", "run", "chase", "shoot", "kill", "weapon", "danger"],
    ),
    (
        "suspense",
        &["mystery", "secret", "hidden", "discover", "find", "clue", "investigate", "suspect", "truth"],
    ),
    // Situational contexts
    (
        "rain",
        &["rain", "raining", "storm", "thunder", "lightning", "umbrella", "wet", "downpour"],
    ),
    (
        "night",
        &["night", "dark", "midnight", "evening", "moon", "stars", "sleep", "bed"],
    ),
    (
        "party",
        &["party", "celebrate", "dance", "music", "drink", "fun", "enjoy", "festival"],
    ),
    // Common scenarios
    (
        "confession",
        &["confess", "admit", "truth", "secret", "tell you", "need to say", "honest"],
    ),
    (
        "argument",
        &["argue", "disagree", "fight", "conflict", "problem", "issue", "wrong"],
    ),
    (
        "reunion",
        &["meet", "see you", "long time", "missed", "reunite", "again", "back"],
    ),
    (
        "goodbye",
        &["goodbye", "farewell", "leave", "going", "depart", "see you", "take care"],
    ),
];

/// Score the first [`KEYWORD_SCAN_LIMIT`] cues against the query.
///
/// Each category contributes 1 point when any of its keywords appears in the
/// cue text or the category name appears in the query. Each query word longer
/// than three characters found in the cue text adds another 0.5. Confidence
/// is `min(score / 5, 0.8)`; a cue is included only above 0.2 with at least
/// one category or direct hit. No result cap here — per-tier caps belong to
/// the orchestrator.
pub fn keyword_matches(query: &str, cues: &[Cue]) -> Vec<SceneMatch> {
    let query_lower = query.to_lowercase();
    let direct_keywords: Vec<&str> = query_lower
        .split_whitespace()
        .filter(|word| word.len() > 3)
        .collect();

    let mut matches = Vec::new();

    for cue in cues.iter().take(KEYWORD_SCAN_LIMIT) {
        let text_lower = cue.text.to_lowercase();
        let mut score = 0.0;
        let mut matched_categories: Vec<&str> = Vec::new();

        for &(category, keywords) in SCENARIO_KEYWORDS {
            let category_hit = keywords.iter().any(|kw| text_lower.contains(kw))
                || query_lower.contains(category);
            if category_hit {
                score += 1.0;
                matched_categories.push(category);
            }
        }

        let direct_hits = direct_keywords
            .iter()
            .filter(|kw| text_lower.contains(*kw))
            .count();
        score += direct_hits as f64 * 0.5;

        let confidence = (score / 5.0).min(CONFIDENCE_CAP);

        if confidence > INCLUSION_THRESHOLD && (!matched_categories.is_empty() || direct_hits > 0) {
            let reason = if matched_categories.is_empty() {
                "Contains relevant keywords".to_string()
            } else {
                format!("Matches categories: {}", matched_categories.join(", "))
            };
            matches.push(SceneMatch {
                subtitle_index: cue.index,
                start_time: cue.start_time,
                end_time: cue.end_time,
                text: cue.text.clone(),
                confidence,
                reason,
            });
        }
    }

    matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(index: u32, text: &str) -> Cue {
        Cue::new(index, index as f64, index as f64 + 2.0, text)
    }

    #[test]
    fn test_angry_argument_scenario() {
        let cues = vec![cue(1, "You are so stupid, I hate you!")];
        let matches = keyword_matches("angry argument", &cues);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].confidence > 0.2);
        assert!(matches[0].reason.contains("angry"));
    }

    #[test]
    fn test_no_match_below_threshold() {
        let cues = vec![cue(1, "The weather report for tomorrow.")];
        let matches = keyword_matches("quantum entanglement", &cues);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_direct_keyword_half_point() {
        let cues = vec![cue(1, "the umbrella salesman counted thunderclaps and lightning")];
        let matches = keyword_matches("umbrella thunderclaps lightning", &cues);
        assert_eq!(matches.len(), 1);
        // "rain" category also fires via keyword hits in the text.
        assert!(matches[0].reason.starts_with("Matches categories"));
    }

    #[test]
    fn test_confidence_capped() {
        let text = "I cry tears of love at night while the rain and storm rage, \
                    we fight and argue, then celebrate the party with joy";
        let cues = vec![cue(1, text)];
        let matches = keyword_matches("emotional rain party argument night", &cues);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].confidence <= 0.8);
    }

    #[test]
    fn test_sorted_descending() {
        let cues = vec![
            cue(1, "A storm is coming"),
            cue(2, "They chase him through the storm as thunder crashes"),
        ];
        let matches = keyword_matches("storm chase", &cues);
        assert_eq!(matches.len(), 2);
        assert!(matches[0].confidence > matches[1].confidence);
        assert_eq!(matches[0].subtitle_index, 2);
    }

    #[test]
    fn test_scan_limit() {
        let mut cues: Vec<Cue> = (1..=150)
            .map(|i| cue(i, "unremarkable filler line"))
            .collect();
        cues[9] = cue(10, "You are so stupid, I hate you!");
        cues[140] = cue(141, "You are so stupid, I hate you!");
        let matches = keyword_matches("stupid fight", &cues);
        // Cue 141 is past the 100-cue scan window; cue 10 is inside it.
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].subtitle_index, 10);
    }
}
