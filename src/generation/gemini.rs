use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::normalize::{missing_key_reply, normalize_reply, remote_failure_reply};
use super::AnswerGenerator;
use crate::config::Config;
use crate::error::{GraphError, GraphResult};
use crate::models::GeneratedReply;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<PromptContent>,
}

#[derive(Debug, Serialize)]
struct PromptContent {
    parts: Vec<PromptPart>,
}

#[derive(Debug, Serialize)]
struct PromptPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Answer generator backed by the Google Generative Language API.
///
/// Every failure mode degrades to a fixed reply shape; callers never see an
/// error from this client.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(config: &Config) -> GraphResult<Self> {
        // the call layer owns the timeout; nothing upstream enforces one
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GraphError::configuration(format!("http client: {}", e)))?;

        if config.gemini_api_key.is_none() {
            warn!("No Gemini API key configured; replies will degrade to system errors");
        }
        debug!(
            "Gemini client initialized with URL: {}, Model: {}",
            config.gemini_base_url, config.gemini_model
        );

        Ok(Self {
            client,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }
}

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    async fn generate(&self, question: &str) -> GeneratedReply {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                warn!("Generation requested without an API key");
                return missing_key_reply();
            }
        };

        let request = GenerateRequest {
            contents: vec![PromptContent {
                parts: vec![PromptPart {
                    text: build_prompt(question),
                }],
            }],
        };
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!("Requesting answer for question: '{}'", question);

        let response = match self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("Gemini request failed: {}", err);
                return remote_failure_reply();
            }
        };

        if !response.status().is_success() {
            warn!("Gemini returned status {}", response.status());
            return remote_failure_reply();
        }

        let body: GenerateResponse = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!("Gemini response body was unreadable: {}", err);
                return remote_failure_reply();
            }
        };

        let text: String = body
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            warn!("Gemini returned no candidate text");
            return remote_failure_reply();
        }

        debug!("Raw model text: {}", text);
        normalize_reply(&text)
    }
}

fn build_prompt(question: &str) -> String {
    format!(
        r#"You are a wise and poetic astronomical guide named "Sidera".

Task:
1. Analyze the user's input and provide a helpful, engaging response.
2. Extract 1-3 short keywords (noun phrases).
3. Rate importance (1=Trivial, 3=Standard, 5=Crucial/Milestone).

User Input: "{}"

Respond STRICTLY in this JSON format:
{{
  "answer": "Your detailed response...",
  "keywords": ["keyword1", "keyword2"],
  "importance": 3
}}"#,
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::normalize::MISSING_KEY_ANSWER;

    fn keyless_config() -> Config {
        Config {
            gemini_api_key: None,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_model: "gemma-3-27b-it".to_string(),
            api_base_url: None,
            project_name: "My Constellation".to_string(),
            position_spread: 5.0,
        }
    }

    #[tokio::test]
    async fn missing_key_short_circuits_without_network() {
        let generator = GeminiGenerator::new(&keyless_config()).unwrap();
        let reply = generator.generate("What is a nebula?").await;
        assert_eq!(reply.answer, MISSING_KEY_ANSWER);
        assert_eq!(reply.keywords, vec!["System Error"]);
        assert_eq!(reply.importance, 5);
    }

    #[test]
    fn prompt_embeds_the_question_and_demands_jsoned_fields() {
        let prompt = build_prompt("Why do stars twinkle?");
        assert!(prompt.contains("Why do stars twinkle?"));
        assert!(prompt.contains("\"keywords\""));
        assert!(prompt.contains("\"importance\""));
    }
}
