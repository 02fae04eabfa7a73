use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub api_base_url: Option<String>,
    pub project_name: String,
    pub position_spread: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            gemini_api_key: env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .ok(),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemma-3-27b-it".to_string()),
            api_base_url: env::var("SIDERA_API_URL").ok(),
            project_name: env::var("PROJECT_NAME")
                .unwrap_or_else(|_| "My Constellation".to_string()),
            position_spread: env::var("POSITION_SPREAD")
                .unwrap_or_else(|_| "5.0".to_string())
                .parse()?,
        })
    }
}
