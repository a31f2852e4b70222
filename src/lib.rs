//! Vocal Assistant - ask a question out loud, hear the answer
//!
//! This library provides the pieces of a small voice assistant:
//! - Completion client for a remote text-completion API
//! - Voice input (microphone capture + STT) and output (TTS + playback)
//! - The assistant state tying them together
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  question  ┌──────────────────┐  prompt  ┌────────────────┐
//! │ VoiceInput   │───────────▶│    Assistant     │─────────▶│  Completion    │
//! │ mic + STT    │            │ question, answer │◀─────────│  endpoint      │
//! └──────────────┘            └────────┬─────────┘  answer  └────────────────┘
//!                                      │ answer
//!                             ┌────────▼─────────┐
//!                             │   VoiceOutput    │
//!                             │  TTS + speakers  │
//!                             └──────────────────┘
//! ```

pub mod assistant;
pub mod completion;
pub mod config;
pub mod error;
pub mod voice;

pub use assistant::Assistant;
pub use completion::{CompletionClient, CompletionOutcome, DisplayAnswer};
pub use config::Config;
pub use error::{Error, Result};
