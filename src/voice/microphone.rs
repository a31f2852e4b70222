//! Spoken questions from the local microphone

use std::time::Duration;

use async_trait::async_trait;

use super::capture::{SAMPLE_RATE, record_utterance, samples_to_wav};
use super::stt::SpeechToText;
use super::VoiceInput;

/// Shortest recording worth sending for transcription (0.3 seconds)
const MIN_UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize * 3 / 10;

/// Voice input that records one utterance and transcribes it remotely
pub struct MicrophoneInput {
    stt: SpeechToText,
    max_listen: Duration,
}

impl MicrophoneInput {
    #[must_use]
    pub const fn new(stt: SpeechToText, max_listen: Duration) -> Self {
        Self { stt, max_listen }
    }
}

#[async_trait]
impl VoiceInput for MicrophoneInput {
    async fn listen(&self, prompt: &str) -> Option<String> {
        tracing::debug!(prompt, "microphone open");

        let max_listen = self.max_listen;
        let samples = match tokio::task::spawn_blocking(move || record_utterance(max_listen)).await {
            Ok(Ok(samples)) => samples,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "recording failed");
                return None;
            }
            Err(e) => {
                tracing::error!(error = %e, "recording task panicked");
                return None;
            }
        };

        if samples.len() < MIN_UTTERANCE_SAMPLES {
            tracing::info!("no speech recognized");
            return None;
        }

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode recording");
                return None;
            }
        };

        match self.stt.transcribe(&wav).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "STT failed");
                None
            }
        }
    }
}
