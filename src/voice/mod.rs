//! Voice processing module
//!
//! The assistant talks to speech through two traits: [`VoiceInput`] yields
//! one transcribed question, [`VoiceOutput`] reads text aloud. Microphone and
//! speaker implementations route STT/TTS through a remote speech API; the
//! console implementations stand in on machines without audio hardware.

mod capture;
mod console;
mod microphone;
mod playback;
mod speaker;
mod stt;
mod tts;
mod utterance;

use async_trait::async_trait;

pub use capture::{AudioCapture, SAMPLE_RATE, record_utterance, samples_to_wav};
pub use console::{ConsoleOutput, LineInput};
pub use microphone::MicrophoneInput;
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3};
pub use speaker::SpeechOutput;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use utterance::{UtteranceDetector, UtteranceState, calculate_energy};

/// What to do with speech that is already playing or queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Drop everything pending and speak now
    Flush,
    /// Speak after everything pending
    Enqueue,
}

/// Source of spoken questions
#[async_trait]
pub trait VoiceInput: Send + Sync {
    /// Capture one question
    ///
    /// `prompt` is the text the front-end shows while listening; adapters
    /// only log it and never write to stdout. Returns the best
    /// transcription, or `None` if recognition failed or was cancelled.
    async fn listen(&self, prompt: &str) -> Option<String>;
}

/// Sink for spoken answers
pub trait VoiceOutput: Send + Sync {
    /// Read `text` aloud without waiting for it to finish
    fn speak(&self, text: &str, mode: QueueMode);

    /// Stop current and queued speech
    ///
    /// Safe to call at any time, including before anything was spoken.
    fn stop(&self);
}
