//! Dialogue generator: the external language model behind the bot.
//!
//! [`DialogueGenerator`] is the seam the session talks to. The production
//! implementation, [`ChatCompletionsClient`], speaks the OpenAI-compatible
//! `/chat/completions` protocol (Groq by default) over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use solace_core::config::LlmConfig;
use solace_core::types::Role;
use tracing::{debug, info, warn};

use crate::error::ChatError;

/// Pause before retrying a failed request.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// One message of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorMessage {
    pub role: Role,
    pub content: String,
}

impl GeneratorMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Produces a reply for an ordered list of system/user messages.
#[async_trait]
pub trait DialogueGenerator: Send + Sync {
    async fn generate(&self, messages: &[GeneratorMessage]) -> Result<String, ChatError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [GeneratorMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Outcome of one HTTP attempt.
enum Attempt {
    Done(String),
    /// Transport error or server-side failure; worth another try.
    Transient(String),
    /// Client-side failure; retrying will not help.
    Fatal(String),
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl ChatCompletionsClient {
    /// Build a client from configuration, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(
                env = %config.api_key_env,
                "No API key set; generation requests will be unauthenticated"
            );
        }
        Self::new(
            &config.endpoint,
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }

    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
            model: model.to_string(),
            api_key,
            max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn attempt(&self, messages: &[GeneratorMessage]) -> Attempt {
        let body = CompletionRequest {
            model: &self.model,
            messages,
        };
        let mut request = self.http.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return Attempt::Transient(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("endpoint returned {status}: {}", truncate(&text, 200));
            return if is_retryable(status) {
                Attempt::Transient(message)
            } else {
                Attempt::Fatal(message)
            };
        }

        match response.json::<CompletionResponse>().await {
            Ok(parsed) => match parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
            {
                Some(content) => Attempt::Done(content),
                None => Attempt::Fatal("response contained no message content".to_string()),
            },
            Err(e) => Attempt::Fatal(format!("malformed response: {e}")),
        }
    }
}

#[async_trait]
impl DialogueGenerator for ChatCompletionsClient {
    async fn generate(&self, messages: &[GeneratorMessage]) -> Result<String, ChatError> {
        let mut attempt_no = 0;
        loop {
            attempt_no += 1;
            debug!(model = %self.model, attempt = attempt_no, "Calling chat-completions endpoint");
            match self.attempt(messages).await {
                Attempt::Done(text) => {
                    info!(model = %self.model, chars = text.len(), "Generation succeeded");
                    return Ok(text);
                }
                Attempt::Transient(e) if attempt_no <= self.max_retries => {
                    warn!(error = %e, attempt = attempt_no, "Generation failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Attempt::Transient(e) | Attempt::Fatal(e) => {
                    return Err(ChatError::GenerationFailure(e));
                }
            }
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let messages = vec![
            GeneratorMessage::system("be kind"),
            GeneratorMessage::user("hello"),
        ];
        let body = CompletionRequest {
            model: "openai/gpt-oss-20b",
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "openai/gpt-oss-20b");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Hi!"));

        let empty: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.choices.is_empty());
    }

    #[test]
    fn test_url_joining() {
        let client = ChatCompletionsClient::new(
            "https://api.groq.com/openai/v1/",
            "m",
            None,
            Duration::from_secs(5),
            1,
        )
        .unwrap();
        assert_eq!(client.url, "https://api.groq.com/openai/v1/chat/completions");
        assert_eq!(client.model(), "m");
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_after_retry() {
        // Port 9 on localhost is the discard port; nothing listens there.
        let client = ChatCompletionsClient::new(
            "http://127.0.0.1:9/v1",
            "m",
            None,
            Duration::from_millis(500),
            1,
        )
        .unwrap();
        let result = client.generate(&[GeneratorMessage::user("hi")]).await;
        assert!(matches!(result, Err(ChatError::GenerationFailure(_))));
    }
}
