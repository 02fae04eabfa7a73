use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{GeneratedReply, DEFAULT_IMPORTANCE};

/// Answer used when the model cannot be reached at all.
pub const REMOTE_FAILURE_ANSWER: &str = "I am unable to contemplate that at the moment.";

/// Answer used when no API key is configured.
pub const MISSING_KEY_ANSWER: &str =
    "I cannot think right now because my API Key is missing. Please configure the .env file.";

lazy_static! {
    static ref FENCE_MARKERS: Regex = Regex::new(r"```json\n|\n```").unwrap();
}

/// Shape the model is instructed to answer with. Extra fields (the model
/// sometimes volunteers a summary) are tolerated and dropped.
#[derive(Debug, Deserialize)]
struct RawReply {
    answer: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    importance: Option<Value>,
}

/// Normalize raw model output into a structured reply.
///
/// Code fences are stripped before decoding; if the cleaned text still is
/// not a valid reply object, the raw text becomes the answer so the user
/// always sees something.
pub fn normalize_reply(raw: &str) -> GeneratedReply {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<RawReply>(&cleaned) {
        Ok(reply) => GeneratedReply {
            answer: reply.answer,
            keywords: reply.keywords,
            importance: coerce_importance(reply.importance.as_ref()),
        },
        Err(err) => {
            warn!("Model reply was not valid JSON ({}), keeping raw text", err);
            freeform_reply(raw)
        }
    }
}

/// Fallback shape for undecodable output: the raw text is never discarded.
pub fn freeform_reply(raw: &str) -> GeneratedReply {
    GeneratedReply {
        answer: raw.to_string(),
        keywords: vec!["Thought".to_string()],
        importance: DEFAULT_IMPORTANCE,
    }
}

/// Reply used when the model call fails outright.
pub fn remote_failure_reply() -> GeneratedReply {
    GeneratedReply {
        answer: REMOTE_FAILURE_ANSWER.to_string(),
        keywords: vec!["Error".to_string()],
        importance: 1,
    }
}

/// Reply used when no credential is configured. High importance on purpose:
/// the condition should stand out in the constellation.
pub fn missing_key_reply() -> GeneratedReply {
    GeneratedReply {
        answer: MISSING_KEY_ANSWER.to_string(),
        keywords: vec!["System Error".to_string()],
        importance: 5,
    }
}

fn strip_code_fences(raw: &str) -> String {
    FENCE_MARKERS
        .replace_all(raw, "")
        .replace("```", "")
        .trim()
        .to_string()
}

// Absent or non-numeric importance falls back to the default; numbers out of
// range are pulled back into [1,5].
fn coerce_importance(value: Option<&Value>) -> u8 {
    match value.and_then(Value::as_f64) {
        Some(raw) => raw.round().clamp(1.0, 5.0) as u8,
        None => DEFAULT_IMPORTANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn well_formed_reply_passes_through_unchanged() {
        let raw = r#"{"answer": "A nebula is a stellar nursery.", "keywords": ["Nebula", "Stars"], "importance": 4}"#;
        let reply = normalize_reply(raw);
        assert_eq!(reply.answer, "A nebula is a stellar nursery.");
        assert_eq!(reply.keywords, vec!["Nebula", "Stars"]);
        assert_eq!(reply.importance, 4);
    }

    #[test]
    fn fenced_reply_is_decoded() {
        let raw = "```json\n{\"answer\": \"Orion rises.\", \"keywords\": [\"Orion\"], \"importance\": 3}\n```";
        let reply = normalize_reply(raw);
        assert_eq!(reply.answer, "Orion rises.");
        assert_eq!(reply.keywords, vec!["Orion"]);
        assert_eq!(reply.importance, 3);
    }

    #[test]
    fn bare_fences_are_stripped_too() {
        let raw = "```{\"answer\": \"Yes.\"}```";
        let reply = normalize_reply(raw);
        assert_eq!(reply.answer, "Yes.");
    }

    #[test]
    fn malformed_reply_keeps_the_raw_text() {
        let raw = "The stars whisper, but not in JSON.";
        let reply = normalize_reply(raw);
        assert_eq!(reply.answer, raw);
        assert_eq!(reply.keywords, vec!["Thought"]);
        assert_eq!(reply.importance, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn degradation_is_idempotent() {
        let raw = "{not json at all";
        assert_eq!(normalize_reply(raw), normalize_reply(raw));
    }

    #[test]
    fn missing_keywords_default_to_empty() {
        let reply = normalize_reply(r#"{"answer": "Quiet sky.", "importance": 1}"#);
        assert!(reply.keywords.is_empty());
        assert_eq!(reply.importance, 1);
    }

    #[test]
    fn missing_importance_defaults() {
        let reply = normalize_reply(r#"{"answer": "Hm.", "keywords": ["Wonder"]}"#);
        assert_eq!(reply.importance, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn textual_importance_defaults() {
        let reply = normalize_reply(r#"{"answer": "Hm.", "importance": "high"}"#);
        assert_eq!(reply.importance, DEFAULT_IMPORTANCE);
    }

    #[test]
    fn out_of_range_importance_is_clamped() {
        let high = normalize_reply(r#"{"answer": "!", "importance": 9}"#);
        assert_eq!(high.importance, 5);
        let low = normalize_reply(r#"{"answer": "!", "importance": 0}"#);
        assert_eq!(low.importance, 1);
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let raw = r#"{"answer": "Noted.", "summary": "User asked, Sidera answered.", "keywords": [], "importance": 2}"#;
        let reply = normalize_reply(raw);
        assert_eq!(reply.answer, "Noted.");
    }

    #[test]
    fn missing_answer_falls_back_whole() {
        let raw = r#"{"keywords": ["Lost"], "importance": 4}"#;
        let reply = normalize_reply(raw);
        assert_eq!(reply.answer, raw);
        assert_eq!(reply.keywords, vec!["Thought"]);
    }

    #[test]
    fn fixed_replies_match_their_shapes() {
        let remote = remote_failure_reply();
        assert_eq!(remote.keywords, vec!["Error"]);
        assert_eq!(remote.importance, 1);

        let missing = missing_key_reply();
        assert_eq!(missing.keywords, vec!["System Error"]);
        assert_eq!(missing.importance, 5);
        assert!(missing.answer.contains("API Key is missing"));
    }

    proptest! {
        #[test]
        fn normalization_is_deterministic(raw in ".*") {
            prop_assert_eq!(normalize_reply(&raw), normalize_reply(&raw));
        }

        #[test]
        fn prose_always_survives_as_the_answer(raw in "[a-zA-Z ,.!?]{1,80}") {
            let reply = normalize_reply(&raw);
            prop_assert_eq!(reply.answer, raw);
            prop_assert_eq!(reply.keywords, vec!["Thought".to_string()]);
            prop_assert_eq!(reply.importance, DEFAULT_IMPORTANCE);
        }
    }
}
