//! End-of-utterance detection
//!
//! Segments one spoken question out of a microphone stream using RMS energy:
//! the utterance starts with the first loud chunk and ends after enough
//! trailing silence.

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech for a valid utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends an utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// State of the utterance detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceState {
    /// No speech heard yet
    Waiting,
    /// Speech started, accumulating audio
    Speaking,
    /// Enough speech followed by silence
    Complete,
}

/// Accumulates one utterance from consecutive audio chunks
pub struct UtteranceDetector {
    state: UtteranceState,
    buffer: Vec<f32>,
    speech_samples: usize,
    silence_counter: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: UtteranceState::Waiting,
            buffer: Vec::new(),
            speech_samples: 0,
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples
    ///
    /// Returns true once the utterance is complete. Chunks fed after
    /// completion are ignored until [`reset`](Self::reset).
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            UtteranceState::Waiting => {
                if is_speech {
                    self.state = UtteranceState::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            UtteranceState::Speaking => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_samples += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_samples >= MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.buffer.len(), "utterance complete");
                    self.state = UtteranceState::Complete;
                } else if self.silence_counter > SILENCE_SAMPLES * 2 {
                    // A short noise burst, not a question
                    tracing::trace!("too little speech - waiting again");
                    self.reset();
                }
            }
            UtteranceState::Complete => {}
        }

        self.is_complete()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == UtteranceState::Complete
    }

    /// Whether any speech has been heard since the last reset
    #[must_use]
    pub fn has_speech(&self) -> bool {
        self.state != UtteranceState::Waiting
    }

    #[must_use]
    pub const fn state(&self) -> UtteranceState {
        self.state
    }

    /// Get the accumulated audio
    #[must_use]
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Take the accumulated audio, resetting the detector
    pub fn take_buffer(&mut self) -> Vec<f32> {
        let buffer = std::mem::take(&mut self.buffer);
        self.reset();
        buffer
    }

    pub fn reset(&mut self) {
        self.state = UtteranceState::Waiting;
        self.buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
