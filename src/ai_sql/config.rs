//! Configuration for the completion endpoint and sampling profiles

use crate::ai_sql::client::SamplingParams;
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable consulted when no key is configured
pub const API_KEY_ENV_VAR: &str = "FIREWORKS_API_KEY";

/// Configuration for SQL generation and schema answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSqlConfig {
    /// Base URL of an OpenAI-compatible chat-completion API
    pub base_url: String,

    /// Model identifier sent with every request
    pub model: String,

    /// API key (can also use FIREWORKS_API_KEY env var)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    // === SQL generation profile ===
    pub sql_temperature: f32,
    pub sql_max_tokens: u32,

    // === Schema/PII answer profile ===
    pub answer_temperature: f32,
    pub answer_max_tokens: u32,

    // === Pricing (USD per million tokens) ===
    pub input_price_per_million: f64,
    pub output_price_per_million: f64,
}

impl Default for AiSqlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.fireworks.ai/inference/v1".to_string(),
            model: "accounts/fireworks/models/llama-v3p3-70b-instruct".to_string(),
            api_key: None,
            timeout_seconds: 30,

            // Near-deterministic, short output for SQL
            sql_temperature: 0.1,
            sql_max_tokens: 500,

            answer_temperature: 0.3,
            answer_max_tokens: 300,

            input_price_per_million: 0.20,
            output_price_per_million: 0.60,
        }
    }
}

impl AiSqlConfig {
    /// Get API key from config or environment
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env::var(API_KEY_ENV_VAR).ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn sql_sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.sql_temperature,
            max_tokens: self.sql_max_tokens,
        }
    }

    pub fn answer_sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.answer_temperature,
            max_tokens: self.answer_max_tokens,
        }
    }

    pub fn pricing(&self) -> TokenPricing {
        TokenPricing {
            input_per_million: self.input_price_per_million,
            output_per_million: self.output_price_per_million,
        }
    }

    /// Estimated cost in USD for a request with the given token counts
    pub fn estimate_cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        self.pricing().cost(prompt_tokens, completion_tokens)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if url::Url::parse(&self.base_url).is_err() {
            return Err(format!("base_url is not a valid URL: {}", self.base_url));
        }

        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }

        if self.get_api_key().is_none() {
            return Err(format!(
                "API key not found. Set {} environment variable or configure ai.api_key in config file",
                API_KEY_ENV_VAR
            ));
        }

        for (name, temperature) in [
            ("sql_temperature", self.sql_temperature),
            ("answer_temperature", self.answer_temperature),
        ] {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("{} must be between 0.0 and 2.0", name));
            }
        }

        if self.sql_max_tokens == 0 || self.answer_max_tokens == 0 {
            return Err("max token budgets must be greater than 0".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("timeout_seconds must be greater than 0".to_string());
        }

        if self.input_price_per_million < 0.0 || self.output_price_per_million < 0.0 {
            return Err("token prices must not be negative".to_string());
        }

        Ok(())
    }
}

/// USD rates per million tokens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl TokenPricing {
    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 * self.input_per_million
            + completion_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}
