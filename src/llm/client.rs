//! Completion API Client
//!
//! HTTP client for OpenAI-compatible chat-completion endpoints
//! (OpenRouter by default).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::prompts;
use crate::llm::CodeAssistant;
use crate::sandbox::{
    PoolParameters, SimulationKind, SimulationParameters, TokenParameters, VaultParameters,
};

/// Client for a hosted completion model
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new client with the given configuration
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(LlmError::Request)?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    /// Check that the endpoint answers and accepts our key
    pub async fn health_check(&self) -> Result<(), LlmError> {
        if !self.is_configured() {
            return Err(LlmError::MissingApiKey);
        }

        let url = format!("{}/models", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(classify)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::Api {
                status: response.status().as_u16(),
                message: response.status().to_string(),
            })
        }
    }

    /// Send messages and return the first choice's content
    pub async fn complete(&self, messages: Vec<CompletionMessage>) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::MissingApiKey);
        }

        let body = CompletionRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let response = self.send_with_retry(&body).await?;

        tracing::debug!(
            model = %response.model,
            total_tokens = response.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            "Completion received"
        );

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }

    /// POST the request, retrying transport failures and rate limits
    async fn send_with_retry(
        &self,
        body: &CompletionRequest<'_>,
    ) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let mut last_error = LlmError::Unavailable;
        let mut requested_wait: Option<Duration> = None;

        for attempt in 0..self.config.max_retries.max(1) {
            if attempt > 0 {
                // Server-requested wait replaces the backoff of 1s, 4s, 9s...
                let delay = requested_wait
                    .take()
                    .unwrap_or_else(|| Duration::from_secs((attempt as u64).pow(2)));
                tokio::time::sleep(delay).await;
            }

            let result = self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .header("HTTP-Referer", &self.config.app_url)
                .header("X-Title", "Aptos Assistant DeFi")
                .json(body)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json().await.map_err(LlmError::Request);
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        requested_wait = retry_after(
                            response.headers(),
                            Duration::from_millis(self.config.request_timeout_ms),
                        );
                        tracing::warn!(attempt, wait = ?requested_wait, "Completion API rate limited");
                        last_error = LlmError::RateLimited;
                        continue;
                    } else {
                        let text = response.text().await.unwrap_or_default();
                        return Err(LlmError::Api {
                            status: status.as_u16(),
                            message: text,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Completion request failed");
                    last_error = classify(e);
                    continue;
                }
            }
        }

        Err(last_error)
    }

    pub async fn chat_with_assistant(
        &self,
        message: &str,
        history: &[CompletionMessage],
    ) -> Result<String, LlmError> {
        self.complete(prompts::chat(message, history)).await
    }

    pub async fn generate_token_code(&self, params: &TokenParameters) -> Result<String, LlmError> {
        self.complete(prompts::token_code(params)).await
    }

    pub async fn generate_pool_code(&self, params: &PoolParameters) -> Result<String, LlmError> {
        self.complete(prompts::pool_code(params)).await
    }

    pub async fn generate_vault_code(&self, params: &VaultParameters) -> Result<String, LlmError> {
        self.complete(prompts::vault_code(params)).await
    }
}

/// Delay-seconds form of `Retry-After`, capped at `max`
fn retry_after(headers: &HeaderMap, max: Duration) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?;
    match value.to_str().ok().and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(secs) => Some(Duration::from_secs(secs).min(max)),
        None => {
            tracing::warn!(value = ?value, "Ignoring unparseable Retry-After header");
            None
        }
    }
}

fn classify(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else if e.is_connect() {
        LlmError::Unavailable
    } else {
        LlmError::Request(e)
    }
}

#[async_trait]
impl CodeAssistant for LlmClient {
    async fn chat(&self, message: &str, history: &[CompletionMessage]) -> Result<String, LlmError> {
        self.chat_with_assistant(message, history).await
    }

    async fn generate_code(&self, params: &SimulationParameters) -> Result<String, LlmError> {
        match params {
            SimulationParameters::Token(p) => self.generate_token_code(p).await,
            SimulationParameters::Pool(p) => self.generate_pool_code(p).await,
            SimulationParameters::Vault(p) => self.generate_vault_code(p).await,
        }
    }

    async fn analyze_code(&self, code: &str, kind: SimulationKind) -> Result<String, LlmError> {
        self.complete(prompts::analysis(code, kind)).await
    }

    async fn explain_concept(&self, concept: &str) -> Result<String, LlmError> {
        self.complete(prompts::explanation(concept)).await
    }

    async fn recommend(&self, context: &str) -> Result<String, LlmError> {
        self.complete(prompts::recommendations(context)).await
    }
}

// ============================================
// Request/Response DTOs
// ============================================

/// Speaker of a completion message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One message in a completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionMessage {
    pub role: MessageRole,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [CompletionMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessageBody,
}

#[derive(Debug, Deserialize)]
struct CompletionMessageBody {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    total_tokens: u32,
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when talking to the completion API
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Completion API key not configured")]
    MissingApiKey,

    #[error("Completion API unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Completion API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Completion API returned no choices")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const COMPLETION: &str = r#"{"model":"qwen","choices":[{"message":{"role":"assistant","content":"ok"}}]}"#;

    fn http(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\n{}content-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            headers,
            body.len(),
            body
        )
    }

    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    /// Answer one connection per response, in order; the handle yields the count served
    async fn serve(responses: Vec<String>) -> (String, tokio::task::JoinHandle<usize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut served = 0;
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
                served += 1;
            }
            served
        });

        (format!("http://{}", addr), handle)
    }

    fn client_for(base_url: String, max_retries: u32) -> LlmClient {
        let config = LlmConfig {
            base_url,
            api_key: "test-key".to_string(),
            request_timeout_ms: 2_000,
            max_retries,
            ..Default::default()
        };
        LlmClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let (url, handle) = serve(vec![http("500 Internal Server Error", "", "upstream broke")]).await;
        let client = client_for(url, 3);

        let err = client.complete(vec![CompletionMessage::user("hi")]).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream broke");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_honors_retry_after() {
        let (url, handle) = serve(vec![
            http("429 Too Many Requests", "retry-after: 0\r\n", "{}"),
            http("200 OK", "", COMPLETION),
        ])
        .await;
        let client = client_for(url, 3);

        let started = Instant::now();
        let reply = client.complete(vec![CompletionMessage::user("hi")]).await.unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(handle.await.unwrap(), 2);
        // Retry-After: 0 replaces the one second backoff
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let limited = http("429 Too Many Requests", "retry-after: 0\r\n", "{}");
        let (url, handle) = serve(vec![limited.clone(), limited]).await;
        let client = client_for(url, 2);

        let err = client.complete(vec![CompletionMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited));
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_no_choices_is_empty_response() {
        let (url, _handle) = serve(vec![http("200 OK", "", r#"{"choices":[]}"#)]).await;
        let client = client_for(url, 1);

        let err = client.complete(vec![CompletionMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_connection_refused_after_retries() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = client_for(format!("http://{}", addr), 2);

        let err = client.complete(vec![CompletionMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::Unavailable), "unexpected error: {:?}", err);
    }

    #[test]
    fn test_retry_after_parsing() {
        let max = Duration::from_secs(30);
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers, max), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(retry_after(&headers, max), Some(Duration::from_secs(2)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("3600"));
        assert_eq!(retry_after(&headers, max), Some(max));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers, max), None);
    }

    #[test]
    fn test_default_config() {
        let client = LlmClient::new(LlmConfig::default()).unwrap();
        assert_eq!(client.config().base_url, "https://openrouter.ai/api/v1");
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let client = LlmClient::new(config).unwrap();

        let err = client
            .chat_with_assistant("hello", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![CompletionMessage::system("sys"), CompletionMessage::user("hi")];
        let body = CompletionRequest {
            model: "test-model",
            messages: &messages,
            temperature: 0.2,
            max_tokens: 2000,
            stream: false,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "id": "gen-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "qwen",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "module x {}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let response: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.choices[0].message.content, "module x {}");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }
}
