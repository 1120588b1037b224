//! Text backend backed by an OpenAI-compatible chat-completions endpoint.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use scrivener_config::Config;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BACKEND_TARGET, BackendError, TextBackend};

/// Connection settings for a [`ChatBackend`].
#[derive(Clone, PartialEq, Eq)]
pub struct ChatSettings {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl ChatSettings {
    /// Creates settings for `model` served under `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            timeout,
        }
    }

    /// Sets the bearer token sent with each request.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Reads chat settings from `config`; `None` when no base URL is set.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        let base_url = config.backend_base_url.as_deref()?;
        let mut settings = Self::new(
            base_url,
            config.backend_model.as_str(),
            config.backend_timeout(),
        );
        settings.api_key.clone_from(&config.backend_api_key);
        Some(settings)
    }

    /// Returns the full chat-completions URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Returns the requested model.
    #[must_use]
    pub const fn model(&self) -> &str {
        self.model.as_str()
    }
}

impl fmt::Debug for ChatSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ChatSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Backend that sends the instructions as the system message and the text as
/// the user message, returning the first choice's content.
#[derive(Debug)]
pub struct ChatBackend {
    settings: ChatSettings,
    endpoint: String,
    client: Client,
}

impl ChatBackend {
    /// Builds a backend and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Request`] when the HTTP client cannot be built.
    pub fn new(settings: ChatSettings) -> Result<Self, BackendError> {
        let endpoint = settings.endpoint();
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|source| BackendError::Request {
                endpoint: endpoint.clone(),
                source,
            })?;
        Ok(Self {
            settings,
            endpoint,
            client,
        })
    }

    fn request_error(&self, source: reqwest::Error) -> BackendError {
        BackendError::Request {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}

impl TextBackend for ChatBackend {
    fn complete(&self, instructions: &str, text: &str) -> Result<String, BackendError> {
        let body = ChatRequest {
            model: self.settings.model(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: instructions,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = self.settings.api_key.as_deref() {
            request = request.bearer_auth(key);
        }
        debug!(
            target: BACKEND_TARGET,
            endpoint = %self.endpoint,
            model = self.settings.model(),
            "sending chat request"
        );
        let response = request.send().map_err(|source| self.request_error(source))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .map(|body| body.trim().to_owned())
                .unwrap_or_default();
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletion = response
            .json()
            .map_err(|error| BackendError::InvalidOutput {
                message: format!("chat response is not a completion: {error}"),
            })?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::InvalidOutput {
                message: String::from("chat response carries no message content"),
            })
    }
}
