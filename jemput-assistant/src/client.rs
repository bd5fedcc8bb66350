//! HTTP client for the Mistral chat completions API.

use jemput_core::model::ChatMessage;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::conversation::Conversation;

/// Public chat completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "mistral-small";

/// Models offered in the model picker.
pub const MODELS: [&str; 5] = [
    "mistral-tiny",
    "mistral-small",
    "mistral-medium",
    "open-mistral-7b",
    "open-mixtral-8x7b",
];

const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;

#[derive(Debug, Error)]
/// Failures talking to the completions API.
pub enum AssistantError {
    #[error("no API key configured")]
    /// Request skipped because no key is set.
    MissingApiKey,

    #[error("API key rejected")]
    /// HTTP 401.
    InvalidApiKey,

    #[error("rate limit exceeded, try again later")]
    /// HTTP 429.
    RateLimited,

    #[error("bad request: {0}")]
    /// HTTP 400 with the API's explanation.
    BadRequest(String),

    #[error("API error {status}: {message}")]
    /// Any other non-success status.
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or extracted message.
        message: String,
    },

    #[error("response contained no answer")]
    /// Success status but no choices.
    EmptyResponse,

    #[error("network error: {0}")]
    /// Transport or decoding failure.
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Chat completions client bound to one API key and model.
pub struct MistralClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl MistralClient {
    /// Create a client for the public endpoint using [`DEFAULT_MODEL`].
    #[must_use]
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url: DEFAULT_API_URL.to_owned(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: DEFAULT_MODEL.to_owned(),
        }
    }

    /// Point the client at another endpoint.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Use another model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Currently selected model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Switch models between requests.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send the whole transcript and return the first answer.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::MissingApiKey`] without sending anything when
    /// no key is set, a status-specific variant for non-success responses,
    /// [`AssistantError::EmptyResponse`] when no choice comes back, and
    /// [`AssistantError::Network`] on transport failures.
    pub async fn complete(&self, conversation: &Conversation) -> Result<String, AssistantError> {
        let api_key = self.api_key.as_deref().ok_or(AssistantError::MissingApiKey)?;

        let body = ChatRequest {
            model: &self.model,
            messages: conversation.messages(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            stream: false,
        };
        debug!(model = %self.model, messages = body.messages.len(), "sending chat request");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = error_for_status(status, &text);
            warn!(status = status.as_u16(), error = %err, "chat request failed");
            return Err(err);
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AssistantError::EmptyResponse)
    }
}

/// Map a non-success response to an [`AssistantError`].
fn error_for_status(status: StatusCode, body: &str) -> AssistantError {
    match status {
        StatusCode::UNAUTHORIZED => AssistantError::InvalidApiKey,
        StatusCode::TOO_MANY_REQUESTS => AssistantError::RateLimited,
        StatusCode::BAD_REQUEST => AssistantError::BadRequest(extract_message(body)),
        other => AssistantError::Api {
            status: other.as_u16(),
            message: extract_message(body),
        },
    }
}

// Prefer `error.message`, then a top-level `message`, then the raw body.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| {
            parsed
                .error
                .and_then(|detail| detail.message)
                .or(parsed.message)
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, ""),
            AssistantError::InvalidApiKey
        ));
        assert!(matches!(
            error_for_status(StatusCode::TOO_MANY_REQUESTS, ""),
            AssistantError::RateLimited
        ));
        assert!(matches!(
            error_for_status(StatusCode::SERVICE_UNAVAILABLE, "down"),
            AssistantError::Api { status: 503, ref message } if message == "down"
        ));
    }

    #[test]
    fn bad_request_carries_api_message() {
        let body = r#"{"error":{"message":"Invalid model: mistral-huge"}}"#;
        let AssistantError::BadRequest(message) = error_for_status(StatusCode::BAD_REQUEST, body)
        else {
            panic!("expected BadRequest");
        };
        assert_eq!(message, "Invalid model: mistral-huge");

        let flat = r#"{"message":"messages must not be empty"}"#;
        assert_eq!(extract_message(flat), "messages must not be empty");
        assert_eq!(extract_message("  plain text "), "plain text");
    }

    #[test]
    fn request_body_has_fixed_sampling_parameters() {
        let conversation = Conversation::with_system_prompt("prompt");
        let body = ChatRequest {
            model: "mistral-tiny",
            messages: conversation.messages(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            stream: false,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["model"], "mistral-tiny");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let client = MistralClient::new(Client::new(), Some("   ".to_owned()))
            .with_api_url("http://127.0.0.1:9/unreachable");
        assert!(!client.has_api_key());

        let err = client
            .complete(&Conversation::with_system_prompt("prompt"))
            .await
            .expect_err("no key");
        assert!(matches!(err, AssistantError::MissingApiKey));
    }
}
