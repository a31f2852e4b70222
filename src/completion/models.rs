//! Wire types of the completion endpoint

use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of a completion request
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub max_tokens: u32,
}

/// Body of a successful completion response
#[derive(Debug, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub text: String,
}

impl CompletionResponse {
    /// Text of the first choice, if any
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.text.as_str())
    }
}

/// The answer currently shown to the user and read aloud
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayAnswer(String);

impl DisplayAnswer {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for DisplayAnswer {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DisplayAnswer {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for DisplayAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for DisplayAnswer {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DisplayAnswer {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_wire_field_names() {
        let request = CompletionRequest {
            prompt: "Quelle est la capitale de la France ?",
            model: "gpt-3.5-turbo-instruct",
            max_tokens: 700,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "prompt": "Quelle est la capitale de la France ?",
                "model": "gpt-3.5-turbo-instruct",
                "max_tokens": 700,
            })
        );
    }

    #[test]
    fn response_ignores_extra_fields() {
        let body = r#"{
            "id": "cmpl-1",
            "object": "text_completion",
            "choices": [
                {"text": "\n\nParis", "index": 0, "finish_reason": "stop"},
                {"text": "Lyon", "index": 1, "finish_reason": "stop"}
            ],
            "usage": {"total_tokens": 12}
        }"#;

        let response: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_text(), Some("\n\nParis"));
    }

    #[test]
    fn missing_choices_is_empty() {
        let response: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.first_text().is_none());
    }

    #[test]
    fn display_answer_compares_with_str() {
        let answer = DisplayAnswer::from("Paris");
        assert_eq!(answer, "Paris");
        assert_eq!(answer.to_string(), "Paris");
        assert!(!answer.is_empty());
    }
}
