//! Terminal stand-ins for the microphone and the speakers

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use super::{QueueMode, VoiceInput, VoiceOutput};

/// Reads typed lines from stdin
///
/// One instance should own stdin for the whole session so that buffered
/// input is never lost between readers.
pub struct LineInput {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Default for LineInput {
    fn default() -> Self {
        Self::new()
    }
}

impl LineInput {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Next line from stdin, `None` at end of input
    pub async fn next_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                None
            }
        }
    }
}

#[async_trait]
impl VoiceInput for LineInput {
    async fn listen(&self, prompt: &str) -> Option<String> {
        tracing::debug!(prompt, "waiting for a typed question");

        let line = self.next_line().await?;
        let text = line.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Logs what would be spoken
///
/// The front-end already prints every answer, so nothing goes to stdout here.
#[derive(Debug, Default)]
pub struct ConsoleOutput;

impl VoiceOutput for ConsoleOutput {
    fn speak(&self, text: &str, mode: QueueMode) {
        tracing::info!(text, ?mode, "speaking (console)");
    }

    fn stop(&self) {}
}
