//! Completion client
//!
//! Turns a question into one request to the remote completion endpoint and
//! the response (or failure) into the answer shown to the user.

mod client;
mod models;

pub use client::{CompletionClient, CompletionOutcome, FALLBACK_ANSWER, NETWORK_ERROR_ANSWER};
pub use models::{Choice, CompletionRequest, CompletionResponse, DisplayAnswer};

/// Default completion service base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/";

/// Default completion route, relative to the base URL
pub const DEFAULT_ROUTE: &str = "v1/completions";

/// Default completion model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";

/// Default bound on generated tokens
pub const DEFAULT_MAX_TOKENS: u32 = 700;
