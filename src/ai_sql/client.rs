//! Completion client for OpenAI-compatible chat endpoints

use crate::ai_sql::config::{AiSqlConfig, TokenPricing};
use crate::ai_sql::error::{AiError, AiResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sampling knobs sent with a single request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token accounting reported by the endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Generated text plus the metrics of the call that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub latency: Duration,
    pub usage: TokenUsage,
    pub cost_usd: f64,
}

/// Trait for text-completion backends
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one prompt and wait for the full response
    async fn complete(&self, prompt: &str, params: SamplingParams) -> AiResult<Completion>;

    /// Get provider name
    fn name(&self) -> &str;
}

/// Provider for any endpoint speaking the `/chat/completions` protocol
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout_secs: u64,
    pricing: TokenPricing,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: &AiSqlConfig, api_key: String) -> AiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AiError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_seconds,
            pricing: config.pricing(),
        })
    }

    async fn call_api(&self, prompt: &str, params: SamplingParams) -> AiResult<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        debug!(
            "Calling chat completions with model: {}, max_tokens: {}, temperature: {}",
            self.model, params.max_tokens, params.temperature
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    AiError::AuthenticationError(format!("{}: {}", status, body.trim()))
                }
                StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited(body.trim().to_string()),
                _ => AiError::ApiError {
                    status_code: status.as_u16(),
                    message: body.trim().to_string(),
                },
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| AiError::MalformedResponse(format!("Failed to parse API response: {}", e)))
    }

    fn transport_error(&self, e: reqwest::Error) -> AiError {
        if e.is_timeout() {
            AiError::TimeoutError {
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_connect() || e.is_request() {
            AiError::NetworkError(format!("Request failed: {}", e))
        } else {
            AiError::HttpError(e)
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    async fn complete(&self, prompt: &str, params: SamplingParams) -> AiResult<Completion> {
        debug!("Prompt length: {} chars", prompt.len());

        let start = Instant::now();
        let response = self.call_api(prompt, params).await;
        let latency = start.elapsed();

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, latency_ms = latency.as_millis() as u64, "Completion request failed");
                return Err(e);
            }
        };

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::MalformedResponse("No choices in response".to_string()))?
            .trim()
            .to_string();

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u
                    .total_tokens
                    .unwrap_or(u.prompt_tokens + u.completion_tokens),
            })
            .unwrap_or_default();
        let cost_usd = self.pricing.cost(usage.prompt_tokens, usage.completion_tokens);

        info!(
            latency_ms = latency.as_millis() as u64,
            tokens = usage.total_tokens,
            "Completion received"
        );

        Ok(Completion {
            text,
            latency,
            usage,
            cost_usd,
        })
    }

    fn name(&self) -> &str {
        "OpenAI-compatible"
    }
}

/// Strip markdown fences from generated SQL
pub fn clean_sql_response(sql: &str) -> String {
    let mut cleaned = sql.replace("```sql", "").replace("```", "").trim().to_string();

    while cleaned.ends_with(";;") {
        cleaned.pop();
    }

    cleaned
}

// Chat completion wire types
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    total_tokens: Option<u64>,
}

/// Create the completion client described by `config`
pub fn create_completion_client(config: &AiSqlConfig) -> AiResult<Box<dyn CompletionProvider>> {
    config.validate().map_err(AiError::ConfigurationError)?;

    let api_key = config.get_api_key().ok_or_else(|| {
        AiError::ConfigurationError(format!(
            "API key not configured. Set {} environment variable or add ai.api_key to config.",
            crate::ai_sql::config::API_KEY_ENV_VAR
        ))
    })?;

    let provider = OpenAiCompatibleProvider::new(config, api_key)?;
    info!(model = %config.model, base_url = %config.base_url, "Completion client ready");
    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode as HttpStatus};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    enum StubReply {
        Ok(Value),
        Status(HttpStatus, &'static str),
        Raw(&'static str),
        Slow,
    }

    #[derive(Clone)]
    struct StubState {
        reply: StubReply,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn chat_handler(
        State(state): State<StubState>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.seen.lock().unwrap().push((auth, body));

        match state.reply {
            StubReply::Ok(value) => Json(value).into_response(),
            StubReply::Status(status, message) => (status, message).into_response(),
            StubReply::Raw(text) => text.into_response(),
            StubReply::Slow => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({})).into_response()
            }
        }
    }

    async fn spawn_stub(reply: StubReply) -> (String, StubState) {
        let state = StubState {
            reply,
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(chat_handler))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v1", addr), state)
    }

    fn provider_for(base_url: String) -> OpenAiCompatibleProvider {
        let config = AiSqlConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            timeout_seconds: 1,
            ..AiSqlConfig::default()
        };
        OpenAiCompatibleProvider::new(&config, "test-key".to_string()).unwrap()
    }

    fn sql_params() -> SamplingParams {
        AiSqlConfig::default().sql_sampling()
    }

    #[test]
    fn test_clean_sql_response() {
        let test_cases = vec![
            ("```sql\nSELECT * FROM trips;\n```", "SELECT * FROM trips;"),
            ("```\nSELECT * FROM trips;\n```", "SELECT * FROM trips;"),
            ("SELECT * FROM trips;", "SELECT * FROM trips;"),
            ("  SELECT * FROM trips;  ", "SELECT * FROM trips;"),
            ("SELECT * FROM trips;;", "SELECT * FROM trips;"),
            ("SELECT 1;;;", "SELECT 1;"),
            ("```sql\nSELECT 1\n```\n```sql\nSELECT 2\n```", "SELECT 1\n\n\nSELECT 2"),
        ];

        for (input, expected) in test_cases {
            let result = clean_sql_response(input);
            assert_eq!(result, expected, "Failed for input: {}", input);
        }
    }

    #[tokio::test]
    async fn test_complete_success() {
        let (base_url, state) = spawn_stub(StubReply::Ok(json!({
            "choices": [{"message": {"role": "assistant", "content": "  SELECT 1  "}}],
            "usage": {"prompt_tokens": 1000, "completion_tokens": 200, "total_tokens": 1200}
        })))
        .await;

        let provider = provider_for(base_url);
        let completion = provider.complete("question", sql_params()).await.unwrap();

        assert_eq!(completion.text, "SELECT 1");
        assert_eq!(completion.usage.total_tokens, 1200);
        assert!((completion.cost_usd - 0.00032).abs() < 1e-12);

        let seen = state.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer test-key"));
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "question");
        assert_eq!(body["model"], AiSqlConfig::default().model);
    }

    #[tokio::test]
    async fn test_configured_prices_drive_cost() {
        let (base_url, _state) = spawn_stub(StubReply::Ok(json!({
            "choices": [{"message": {"role": "assistant", "content": "SELECT 1"}}],
            "usage": {"prompt_tokens": 2000, "completion_tokens": 1000, "total_tokens": 3000}
        })))
        .await;

        let config = AiSqlConfig {
            base_url,
            input_price_per_million: 1.0,
            output_price_per_million: 4.0,
            ..AiSqlConfig::default()
        };
        let provider = OpenAiCompatibleProvider::new(&config, "test-key".to_string()).unwrap();
        assert_eq!(provider.pricing, config.pricing());

        let completion = provider.complete("question", sql_params()).await.unwrap();
        assert!((completion.cost_usd - 0.006).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_missing_total_tokens_is_summed() {
        let (base_url, _state) = spawn_stub(StubReply::Ok(json!({
            "choices": [{"message": {"role": "assistant", "content": "ok"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        })))
        .await;

        let completion = provider_for(base_url)
            .complete("q", sql_params())
            .await
            .unwrap();
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication_error() {
        let (base_url, _state) =
            spawn_stub(StubReply::Status(HttpStatus::UNAUTHORIZED, "invalid api key")).await;

        let err = provider_for(base_url)
            .complete("q", sql_params())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::AuthenticationError(ref m) if m.contains("invalid api key")));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_status_codes_map_to_typed_errors() {
        let (base_url, _state) =
            spawn_stub(StubReply::Status(HttpStatus::TOO_MANY_REQUESTS, "slow down")).await;
        let err = provider_for(base_url).complete("q", sql_params()).await.unwrap_err();
        assert!(matches!(err, AiError::RateLimited(_)));

        let (base_url, _state) =
            spawn_stub(StubReply::Status(HttpStatus::INTERNAL_SERVER_ERROR, "boom")).await;
        let err = provider_for(base_url).complete("q", sql_params()).await.unwrap_err();
        assert!(matches!(err, AiError::ApiError { status_code: 500, .. }));
    }

    #[tokio::test]
    async fn test_malformed_responses() {
        let (base_url, _state) = spawn_stub(StubReply::Raw("not json at all")).await;
        let err = provider_for(base_url).complete("q", sql_params()).await.unwrap_err();
        assert!(matches!(err, AiError::MalformedResponse(_)));

        let (base_url, _state) = spawn_stub(StubReply::Ok(json!({"choices": []}))).await;
        let err = provider_for(base_url).complete("q", sql_params()).await.unwrap_err();
        assert!(matches!(err, AiError::MalformedResponse(ref m) if m.contains("No choices")));
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let (base_url, _state) = spawn_stub(StubReply::Slow).await;
        let err = provider_for(base_url).complete("q", sql_params()).await.unwrap_err();
        assert!(matches!(err, AiError::TimeoutError { timeout_secs: 1 }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider_for(format!("http://{}/v1", addr))
            .complete("q", sql_params())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::NetworkError(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_factory_rejects_invalid_config() {
        let config = AiSqlConfig {
            api_key: Some("test-key".to_string()),
            base_url: "not a url".to_string(),
            ..AiSqlConfig::default()
        };
        assert!(matches!(
            create_completion_client(&config),
            Err(AiError::ConfigurationError(_))
        ));

        let config = AiSqlConfig {
            api_key: Some("test-key".to_string()),
            ..AiSqlConfig::default()
        };
        let client = create_completion_client(&config).unwrap();
        assert_eq!(client.name(), "OpenAI-compatible");
    }
}
