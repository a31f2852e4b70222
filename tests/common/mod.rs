//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use secrecy::SecretString;
use serde_json::Value;
use vocal_assistant::config::CompletionConfig;
use vocal_assistant::voice::{QueueMode, VoiceInput, VoiceOutput};
use vocal_assistant::{Assistant, CompletionClient};

pub const TEST_KEY: &str = "test-key";

/// What the mock endpoint answers to one request
#[derive(Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn answer(text: &str) -> Self {
        Self::ok(serde_json::json!({ "choices": [{ "text": text }] }).to_string())
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn error(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request seen by the mock endpoint
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

type ReplyFn = Arc<dyn Fn(&Value) -> MockReply + Send + Sync>;

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    reply: ReplyFn,
}

/// Completion endpoint on a random local port, recording every request
pub struct MockCompletionServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockCompletionServer {
    /// Start a server that always gives the same reply
    pub async fn fixed(reply: MockReply) -> Self {
        Self::start(move |_| reply.clone()).await
    }

    /// Start a server whose reply depends on the request body
    pub async fn start<F>(reply: F) -> Self
    where
        F: Fn(&Value) -> MockReply + Send + Sync + 'static,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: Arc::clone(&requests),
            reply: Arc::new(reply),
        };

        let app = Router::new()
            .route("/v1/completions", post(handle_completion))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn config(&self) -> CompletionConfig {
        CompletionConfig {
            base_url: self.base_url.clone(),
            ..CompletionConfig::default()
        }
    }

    pub fn client(&self) -> CompletionClient {
        client_for(&self.config())
    }
}

async fn handle_completion(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        authorization,
        body: json.clone(),
    });

    let reply = (state.reply)(&json);
    tokio::time::sleep(reply.delay).await;

    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

pub fn client_for(config: &CompletionConfig) -> CompletionClient {
    let key = SecretString::from(TEST_KEY.to_string());
    CompletionClient::new(config, Some(&key)).unwrap()
}

/// A base URL on which nothing listens
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Voice event, in the order the assistant caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Listen(String),
    Speak(String, QueueMode),
    Stop,
}

pub type VoiceLog = Arc<Mutex<Vec<VoiceEvent>>>;

/// Voice input replaying scripted recognition results
pub struct ScriptedInput {
    results: Mutex<VecDeque<Option<String>>>,
    log: VoiceLog,
}

#[async_trait]
impl VoiceInput for ScriptedInput {
    async fn listen(&self, prompt: &str) -> Option<String> {
        self.log
            .lock()
            .unwrap()
            .push(VoiceEvent::Listen(prompt.to_string()));
        self.results.lock().unwrap().pop_front().flatten()
    }
}

/// Voice output that only records
pub struct RecordingOutput {
    log: VoiceLog,
}

impl VoiceOutput for RecordingOutput {
    fn speak(&self, text: &str, mode: QueueMode) {
        self.log
            .lock()
            .unwrap()
            .push(VoiceEvent::Speak(text.to_string(), mode));
    }

    fn stop(&self) {
        self.log.lock().unwrap().push(VoiceEvent::Stop);
    }
}

/// Assistant wired to the mock endpoint and scripted voice adapters
pub fn test_assistant(
    client: CompletionClient,
    recognized: Vec<Option<&str>>,
) -> (Assistant, VoiceLog) {
    let log: VoiceLog = Arc::new(Mutex::new(Vec::new()));
    let input = ScriptedInput {
        results: Mutex::new(
            recognized
                .into_iter()
                .map(|r| r.map(ToString::to_string))
                .collect(),
        ),
        log: Arc::clone(&log),
    };
    let output = RecordingOutput {
        log: Arc::clone(&log),
    };

    let assistant = Assistant::new(
        client,
        Arc::new(input),
        Arc::new(output),
        "Parlez maintenant...",
    );
    (assistant, log)
}

/// Assistant wired to the mock endpoint and a caller-supplied voice output
pub fn assistant_with_output(
    client: CompletionClient,
    output: Arc<dyn VoiceOutput>,
) -> Assistant {
    let input = ScriptedInput {
        results: Mutex::new(VecDeque::new()),
        log: Arc::new(Mutex::new(Vec::new())),
    };
    Assistant::new(client, Arc::new(input), output, "Parlez maintenant...")
}

/// Texts handed to the voice output
pub fn spoken(log: &VoiceLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|event| match event {
            VoiceEvent::Speak(text, _) => Some(text.clone()),
            _ => None,
        })
        .collect()
}
