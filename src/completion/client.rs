//! HTTP client for the completion endpoint

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use super::models::{CompletionRequest, CompletionResponse, DisplayAnswer};
use crate::config::CompletionConfig;
use crate::{Error, Result};

/// Answer used when the endpoint succeeds without any choice
pub const FALLBACK_ANSWER: &str = "Sorry, I cannot answer this question.";

/// Answer used when no response was received at all
pub const NETWORK_ERROR_ANSWER: &str = "Network error";

/// Classification of a single completion round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Success with at least one choice; holds the first choice's text
    Answered(String),
    /// Success with an empty `choices` sequence
    NoChoices,
    /// The endpoint answered with a non-success status
    Rejected { status: StatusCode, body: String },
    /// No usable response was received
    Network(String),
}

impl CompletionOutcome {
    /// Collapse the outcome into the string shown and spoken to the user
    #[must_use]
    pub fn into_answer(self) -> DisplayAnswer {
        match self {
            Self::Answered(text) => DisplayAnswer::from(text),
            Self::NoChoices => DisplayAnswer::from(FALLBACK_ANSWER),
            Self::Rejected { body, .. } => DisplayAnswer::from(format!("Error: {body}")),
            Self::Network(_) => DisplayAnswer::from(NETWORK_ERROR_ANSWER),
        }
    }
}

/// Sends questions to the completion endpoint
///
/// Stateless between calls: every request is built fresh from the question
/// and the fixed model parameters.
pub struct CompletionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_key: SecretString,
}

impl CompletionClient {
    /// Create a new completion client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(config: &CompletionConfig, api_key: Option<&SecretString>) -> Result<Self> {
        let api_key = api_key
            .map(|key| SecretString::from(key.expose_secret().to_string()))
            .ok_or_else(|| Error::Config("OpenAI API key required for completions".to_string()))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let endpoint = config.endpoint();
        tracing::debug!(
            endpoint = %endpoint,
            model = %config.model,
            max_tokens = config.max_tokens,
            "completion client initialized"
        );

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
        })
    }

    /// Model identifier sent with every request
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask a question and produce the answer to display
    ///
    /// Never fails: every failure path maps to a fixed or error-bearing string.
    pub async fn request_completion(&self, question: &str) -> DisplayAnswer {
        self.complete(question).await.into_answer()
    }

    /// Perform one completion round trip and classify the result
    ///
    /// Sends exactly one request; no retry is attempted.
    pub async fn complete(&self, question: &str) -> CompletionOutcome {
        let request = CompletionRequest {
            prompt: question,
            model: &self.model,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            prompt_chars = question.chars().count(),
            "sending completion request"
        );

        let response = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "completion request failed");
                return CompletionOutcome::Network(e.to_string());
            }
        };

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "completion API error");
            return CompletionOutcome::Rejected { status, body };
        }

        match response.json::<CompletionResponse>().await {
            Ok(body) => match body.first_text() {
                Some(text) => {
                    tracing::info!(answer_chars = text.chars().count(), "completion received");
                    CompletionOutcome::Answered(text.to_string())
                }
                None => {
                    tracing::info!("completion returned no choices");
                    CompletionOutcome::NoChoices
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to parse completion response");
                CompletionOutcome::Network(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_map_to_display_strings() {
        assert_eq!(
            CompletionOutcome::Answered("Paris".to_string()).into_answer(),
            "Paris"
        );
        assert_eq!(
            CompletionOutcome::NoChoices.into_answer(),
            "Sorry, I cannot answer this question."
        );
        assert_eq!(
            CompletionOutcome::Network("dns error".to_string()).into_answer(),
            "Network error"
        );

        let rejected = CompletionOutcome::Rejected {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "rate limited".to_string(),
        };
        assert_eq!(rejected.into_answer(), "Error: rate limited");
    }

    #[test]
    fn answered_text_is_kept_verbatim() {
        let answer = CompletionOutcome::Answered("\n\nParis.".to_string()).into_answer();
        assert_eq!(answer, "\n\nParis.");
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let result = CompletionClient::new(&CompletionConfig::default(), None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn client_uses_configured_model() {
        let key = SecretString::from("test-key".to_string());
        let client = CompletionClient::new(&CompletionConfig::default(), Some(&key)).unwrap();
        assert_eq!(client.model(), "gpt-3.5-turbo-instruct");
    }
}
