//! Spoken answers through remote TTS and the local speakers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use super::{QueueMode, VoiceOutput};

/// A piece of text waiting to be spoken
struct Utterance {
    text: String,
    generation: u64,
}

/// Voice output backed by [`TextToSpeech`] and [`AudioPlayback`]
///
/// The playback worker starts on the first call to `speak`. Every flush or
/// stop bumps a generation counter; queued or playing utterances from an
/// older generation are dropped.
pub struct SpeechOutput {
    tts: Arc<TextToSpeech>,
    generation: Arc<AtomicU64>,
    sender: OnceLock<mpsc::UnboundedSender<Utterance>>,
}

impl SpeechOutput {
    #[must_use]
    pub fn new(tts: TextToSpeech) -> Self {
        Self {
            tts: Arc::new(tts),
            generation: Arc::new(AtomicU64::new(0)),
            sender: OnceLock::new(),
        }
    }

    /// Whether the playback worker has been started
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.sender.get().is_some()
    }

    fn sender(&self) -> Option<&mpsc::UnboundedSender<Utterance>> {
        if let Some(sender) = self.sender.get() {
            return Some(sender);
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime - speech output unavailable");
            return None;
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if self.sender.set(tx).is_ok() {
            handle.spawn(run_worker(
                Arc::clone(&self.tts),
                Arc::clone(&self.generation),
                rx,
            ));
            tracing::debug!("speech worker started");
        }

        self.sender.get()
    }
}

impl VoiceOutput for SpeechOutput {
    fn speak(&self, text: &str, mode: QueueMode) {
        let generation = match mode {
            QueueMode::Flush => self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            QueueMode::Enqueue => self.generation.load(Ordering::SeqCst),
        };

        let Some(sender) = self.sender() else {
            return;
        };

        let utterance = Utterance {
            text: text.to_string(),
            generation,
        };
        if sender.send(utterance).is_err() {
            tracing::warn!("speech worker has stopped");
        }
    }

    fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(initialized = self.is_initialized(), "speech stopped");
    }
}

async fn run_worker(
    tts: Arc<TextToSpeech>,
    generation: Arc<AtomicU64>,
    mut rx: mpsc::UnboundedReceiver<Utterance>,
) {
    while let Some(utterance) = rx.recv().await {
        let is_current = |g: &AtomicU64| g.load(Ordering::SeqCst) == utterance.generation;

        if !is_current(&generation) || utterance.text.is_empty() {
            continue;
        }

        let audio = match tts.synthesize(&utterance.text).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed");
                continue;
            }
        };

        // Stopped while synthesizing
        if !is_current(&generation) {
            continue;
        }

        let playing = Arc::clone(&generation);
        let wanted = utterance.generation;
        let result = tokio::task::spawn_blocking(move || {
            let playback = AudioPlayback::new()?;
            playback.play_mp3_blocking(&audio, || playing.load(Ordering::SeqCst) != wanted)
        })
        .await;

        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "speech playback failed"),
            Err(e) => tracing::error!(error = %e, "speech playback task panicked"),
        }
    }

    tracing::debug!("speech worker stopped");
}
