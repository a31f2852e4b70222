//! Assistant - the application state behind the front-end
//!
//! Owns the current question, the current answer, the completion client and
//! the voice adapters. The question is only written by the recognition path
//! (`ask`, `ask_text`); the answer only by the completion path.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::completion::{CompletionClient, DisplayAnswer};
use crate::voice::{QueueMode, VoiceInput, VoiceOutput};

/// Voice assistant state and actions
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Assistant {
    inner: Arc<Inner>,
}

struct Inner {
    client: CompletionClient,
    input: Arc<dyn VoiceInput>,
    output: Arc<dyn VoiceOutput>,
    listen_prompt: String,
    question: watch::Sender<String>,
    answer: watch::Sender<DisplayAnswer>,
}

impl Assistant {
    #[must_use]
    pub fn new(
        client: CompletionClient,
        input: Arc<dyn VoiceInput>,
        output: Arc<dyn VoiceOutput>,
        listen_prompt: impl Into<String>,
    ) -> Self {
        let (question, _) = watch::channel(String::new());
        let (answer, _) = watch::channel(DisplayAnswer::default());

        Self {
            inner: Arc::new(Inner {
                client,
                input,
                output,
                listen_prompt: listen_prompt.into(),
                question,
                answer,
            }),
        }
    }

    /// The current question
    #[must_use]
    pub fn question(&self) -> String {
        self.inner.question.borrow().clone()
    }

    /// Text to show while the voice input is listening
    #[must_use]
    pub fn listen_prompt(&self) -> &str {
        &self.inner.listen_prompt
    }

    /// The current answer
    #[must_use]
    pub fn answer(&self) -> DisplayAnswer {
        self.inner.answer.borrow().clone()
    }

    /// Watch the answer; the receiver is notified on every completed request
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DisplayAnswer> {
        self.inner.answer.subscribe()
    }

    /// Capture a spoken question and answer it
    ///
    /// Speech output is stopped before listening. If nothing was recognized
    /// the question and answer are left untouched.
    pub async fn ask(&self) -> Option<DisplayAnswer> {
        let question = self.listen().await?;
        self.request_completion(&question).await
    }

    /// Stop speech output and capture a question without sending it
    ///
    /// A recognized question becomes the current question.
    pub async fn listen(&self) -> Option<String> {
        self.inner.output.stop();

        let Some(text) = self.inner.input.listen(&self.inner.listen_prompt).await else {
            tracing::info!("no question recognized");
            return None;
        };

        tracing::info!(question = %text, "question recognized");
        self.inner.question.send_replace(text.clone());
        Some(text)
    }

    /// Answer a typed question
    pub async fn ask_text(&self, text: &str) -> Option<DisplayAnswer> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.inner.question.send_replace(text.to_string());
        self.request_completion(text).await
    }

    /// Ask the current question again
    ///
    /// Does nothing while no question has been recognized.
    pub async fn ask_again(&self) -> Option<DisplayAnswer> {
        let question = self.question();
        self.request_completion(&question).await
    }

    /// Stop reading the answer aloud
    pub fn stop_reading(&self) {
        self.inner.output.stop();
    }

    /// Send `question` to the completion endpoint, then show and speak the answer
    ///
    /// An empty question is not sent and returns `None`. Every other call
    /// overwrites the current answer when it completes, error strings
    /// included, and hands it to the voice output.
    pub async fn request_completion(&self, question: &str) -> Option<DisplayAnswer> {
        if question.is_empty() {
            tracing::debug!("empty question - not sending");
            return None;
        }

        let answer = self.inner.client.request_completion(question).await;

        // Display and speech change together so the last answer shown is
        // also the last one spoken
        self.inner.answer.send_modify(|current| {
            current.clone_from(&answer);
            self.inner.output.speak(answer.as_str(), QueueMode::Flush);
        });

        Some(answer)
    }

    /// Run [`request_completion`](Self::request_completion) in the background
    ///
    /// The request is never cancelled once issued; dropping the handle
    /// detaches it.
    #[must_use = "dropping the handle detaches the request"]
    pub fn spawn_completion(&self, question: String) -> JoinHandle<Option<DisplayAnswer>> {
        let assistant = self.clone();
        tokio::spawn(async move { assistant.request_completion(&question).await })
    }
}
