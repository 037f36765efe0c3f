use crate::config::toml_config::LlmConfig;
use crate::domain::model::ChatMessage;
use crate::domain::ports::ChatModel;
use crate::utils::error::{FinError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI chat-completions 相容客戶端
pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
    permits: Arc<Semaphore>,
}

impl OpenAiChat {
    pub fn new(config: &LlmConfig, api_key: String) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_seconds),
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_secs(config.retry_delay_seconds),
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("🤖 {} responded with {}", self.endpoint, status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FinError::ApiStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| FinError::ResponseFormatError {
                message: "response contained no choices".to_string(),
            })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| FinError::agent("llm", e.to_string()))?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(messages).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt <= self.retry_attempts => {
                    tracing::warn!(
                        "🔁 LLM request failed (attempt {}/{}): {}",
                        attempt,
                        self.retry_attempts + 1,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn config_for(server: &MockServer, retry_attempts: u32) -> LlmConfig {
        LlmConfig {
            base_url: server.url("/v1"),
            retry_attempts,
            retry_delay_seconds: 0,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("Authorization", "Bearer sk-test")
                .json_body_partial(r#"{"model":"gpt-4o-mini"}"#);
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Xin chào"}}]
            }));
        });

        let chat = OpenAiChat::new(&config_for(&server, 0), "sk-test".to_string());
        let reply = chat
            .complete(&[ChatMessage::user("What is your name?")])
            .await
            .unwrap();

        mock.assert();
        assert_eq!(reply, "Xin chào");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401).body("invalid key");
        });

        let chat = OpenAiChat::new(&config_for(&server, 3), "bad".to_string());
        let err = chat.complete(&[ChatMessage::user("hi")]).await.unwrap_err();

        mock.assert_hits(1);
        assert!(matches!(err, FinError::ApiStatusError { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(503);
        });

        let chat = OpenAiChat::new(&config_for(&server, 2), "sk".to_string());
        let err = chat.complete(&[ChatMessage::user("hi")]).await.unwrap_err();

        mock.assert_hits(3);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_choices_is_format_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(serde_json::json!({"choices": []}));
        });

        let chat = OpenAiChat::new(&config_for(&server, 0), "sk".to_string());
        let err = chat.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, FinError::ResponseFormatError { .. }));
    }

    #[tokio::test]
    async fn test_semaphore_serialises_requests() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .delay(Duration::from_millis(300))
                .json_body(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "ok"}}]
                }));
        });

        let config = LlmConfig {
            max_concurrent_requests: 1,
            ..config_for(&server, 0)
        };
        let chat = OpenAiChat::new(&config, "sk".to_string());
        let messages = [ChatMessage::user("hi")];

        let started = std::time::Instant::now();
        let (a, b) = tokio::join!(chat.complete(&messages), chat.complete(&messages));
        let elapsed = started.elapsed();

        assert_eq!(a.unwrap(), "ok");
        assert_eq!(b.unwrap(), "ok");
        mock.assert_hits(2);
        // 同一時間只允許一個請求，兩次延遲必須依序發生
        assert!(elapsed >= Duration::from_millis(580), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_timeout_is_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .delay(Duration::from_millis(1500))
                .json_body(serde_json::json!({"choices": []}));
        });

        let config = LlmConfig {
            timeout_seconds: 1,
            ..config_for(&server, 1)
        };
        let chat = OpenAiChat::new(&config, "sk".to_string());
        let err = chat.complete(&[ChatMessage::user("hi")]).await.unwrap_err();

        mock.assert_hits(2);
        assert!(matches!(&err, FinError::HttpError(e) if e.is_timeout()));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_connection_refused_is_retryable() {
        // 取得一個未被監聽的埠
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = LlmConfig {
            base_url: format!("http://127.0.0.1:{}/v1", port),
            retry_attempts: 2,
            retry_delay_seconds: 0,
            ..LlmConfig::default()
        };

        let chat = OpenAiChat::new(&config, "sk".to_string());
        let err = chat.complete(&[ChatMessage::user("hi")]).await.unwrap_err();

        assert!(matches!(&err, FinError::HttpError(e) if e.is_connect()));
        assert!(err.is_retryable());
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Network);
    }
}
