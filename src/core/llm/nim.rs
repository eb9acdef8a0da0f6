//! NVIDIA NIM chat completions client
//!
//! NIM exposes the OpenAI-compatible `POST /v1/chat/completions` endpoint.
//! Streaming is disabled; the whole reply is returned in one response.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::base::{ChatMessage, LLMError, LLMResult, LanguageModel};

/// Fixed sampling parameters sent with every request
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 300,
            frequency_penalty: 1.0,
            stop: vec!["\nHuman:".to_string(), "\n\nHuman:".to_string()],
        }
    }
}

#[derive(Clone)]
pub struct NimConfig {
    /// Full chat completions URL
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub sampling: SamplingParams,
    /// `None` waits indefinitely for the reply
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for NimConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NimConfig")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("sampling", &self.sampling)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    top_p: f32,
    n: u32,
    max_tokens: u32,
    stream: bool,
    temperature: f32,
    frequency_penalty: f32,
    stop: &'a [String],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct NimChatClient {
    client: reqwest::Client,
    config: NimConfig,
}

impl NimChatClient {
    pub fn new(config: NimConfig) -> LLMResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LLMError::RequestFailed(format!("Failed to build HTTP client: {e}")))?;

        info!(url = %config.url, model = %config.model, "Configured NIM chat client");
        Ok(Self { client, config })
    }

    fn build_request(&self, messages: &[ChatMessage]) -> reqwest::RequestBuilder {
        let sampling = &self.config.sampling;
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            top_p: sampling.top_p,
            n: 1,
            max_tokens: sampling.max_tokens,
            stream: false,
            temperature: sampling.temperature,
            frequency_penalty: sampling.frequency_penalty,
            stop: &sampling.stop,
        };

        let mut request = self
            .client
            .post(&self.config.url)
            .header(http::header::ACCEPT, "application/json")
            .json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }
        request
    }
}

#[async_trait]
impl LanguageModel for NimChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> LLMResult<String> {
        let started = Instant::now();
        debug!(messages = messages.len(), "Calling NIM chat completions");

        let response = self.build_request(messages).send().await.map_err(|e| {
            if e.is_timeout() {
                LLMError::Timeout
            } else {
                LLMError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "NIM endpoint returned an error");
            return Err(LLMError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LLMError::EmptyResponse)?;

        info!(
            duration_ms = started.elapsed().as_millis() as u64,
            chars = content.len(),
            "NIM chat completion finished"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> NimConfig {
        NimConfig {
            url: format!("{}/v1/chat/completions", server.uri()),
            model: "meta/llama-3.1-8b-instruct".to_string(),
            api_key: None,
            sampling: SamplingParams::default(),
            timeout: None,
        }
    }

    #[tokio::test]
    async fn test_complete_sends_fixed_sampling_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "meta/llama-3.1-8b-instruct",
                "n": 1,
                "max_tokens": 300,
                "stream": false,
                "stop": ["\nHuman:", "\n\nHuman:"],
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello! What size?"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = NimChatClient::new(config(&server)).unwrap();
        let reply = client.complete(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(reply, "Hello! What size?");
    }

    #[tokio::test]
    async fn test_sampling_floats_serialized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let client = NimChatClient::new(config(&server)).unwrap();
        client.complete(&[ChatMessage::user("hi")]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((body["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert!((body["frequency_penalty"].as_f64().unwrap() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_bearer_key_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer nvapi-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.api_key = Some("nvapi-test".to_string());
        let client = NimChatClient::new(cfg).unwrap();
        assert_eq!(client.complete(&[]).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = NimChatClient::new(config(&server)).unwrap();
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert_eq!(
            err,
            LLMError::Status {
                status: 503,
                body: "overloaded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = NimChatClient::new(config(&server)).unwrap();
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert_eq!(err, LLMError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({"choices": [{"message": {"content": "late"}}]})),
            )
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.timeout = Some(Duration::from_millis(100));
        let client = NimChatClient::new(cfg).unwrap();
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert_eq!(err, LLMError::Timeout);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let cfg = NimConfig {
            url: "https://nim.example.com/v1/chat/completions".to_string(),
            model: "m".to_string(),
            api_key: Some("secret-value".to_string()),
            sampling: SamplingParams::default(),
            timeout: None,
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("***"));
    }
}
