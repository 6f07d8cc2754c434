//! Shared helpers for integration tests: an in-process InvokeTool endpoint.
//!
//! - [`MockSandbox`]: axum server on `127.0.0.1:0` that records requests and
//!   answers through a pluggable handler
//! - [`MockReply`]: canned responses in the double-JSON envelope
//! - [`python_kernel`]: handler that runs the received code with a local
//!   `python3`, the way the sandbox kernel would

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use agentkit_sandbox::agentkit::{Config, SandboxToolBackend};
use axum::body::Bytes;
use axum::extract::{Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use futures::FutureExt;
use futures::future::BoxFuture;
use secrecy::SecretString;
use serde_json::{json, Value};

/// A request as seen by the mock endpoint.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub query: HashMap<String, String>,
    pub raw_query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    /// The decoded `OperationPayload` document.
    pub fn payload(&self) -> Value {
        let payload = self.json()["OperationPayload"]
            .as_str()
            .expect("OperationPayload is a string")
            .to_string();
        serde_json::from_str(&payload).expect("OperationPayload is JSON")
    }

    pub fn code(&self) -> String {
        self.payload()["code"]
            .as_str()
            .expect("payload has code")
            .to_string()
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Response produced by a handler.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl MockReply {
    /// A 200 response wrapping an execution result with a single output.
    pub fn result(success: bool, text: &str, ename: &str, evalue: &str) -> Self {
        let inner = json!({
            "success": success,
            "data": {
                "outputs": [{ "output_type": "stream", "text": text, "ename": ename, "evalue": evalue }]
            }
        });
        Self::envelope(inner.to_string())
    }

    pub fn success(text: &str) -> Self {
        Self::result(true, text, "", "")
    }

    pub fn failure(text: &str) -> Self {
        Self::result(false, text, "", "")
    }

    /// A 200 response whose `result.result` is `inner` verbatim.
    pub fn envelope(inner: String) -> Self {
        Self::raw(
            StatusCode::OK,
            serde_json::to_vec(&json!({ "result": { "result": inner } })).unwrap(),
        )
    }

    pub fn raw(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

pub type Handler = Arc<dyn Fn(RecordedRequest) -> BoxFuture<'static, MockReply> + Send + Sync>;

/// Wrap an async closure as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockReply> + Send + 'static,
{
    Arc::new(move |request: RecordedRequest| f(request).boxed())
}

/// Handler that returns the same reply for every request.
pub fn always(reply: MockReply) -> Handler {
    handler(move |_| {
        let reply = reply.clone();
        async move { reply }
    })
}

#[derive(Clone)]
struct ServerState {
    handler: Handler,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Running mock InvokeTool endpoint.
pub struct MockSandbox {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockSandbox {
    pub async fn start(handler: Handler) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock listener address");

        let state = ServerState {
            handler,
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = state.requests.clone();

        let app = Router::new().route("/", post(invoke)).with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{addr}"),
            requests,
        }
    }

    /// A backend with test credentials pointed at this server.
    pub fn backend(&self) -> SandboxToolBackend {
        self.backend_with(test_config())
    }

    pub fn backend_with(&self, config: Config) -> SandboxToolBackend {
        SandboxToolBackend::new(config)
            .expect("valid test config")
            .with_base_url(&self.url)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .pop()
            .expect("mock received at least one request")
    }
}

async fn invoke(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Vec<u8>) {
    let request = RecordedRequest {
        query,
        raw_query: raw_query.unwrap_or_default(),
        headers,
        body: body.to_vec(),
    };
    state.requests.lock().unwrap().push(request.clone());

    let reply = (state.handler)(request).await;
    (reply.status, reply.body)
}

pub fn test_config() -> Config {
    Config {
        access_key_id: "test-ak".to_string(),
        secret_access_key: SecretString::from("test-sk".to_string()),
        tool_id: "test-tool".to_string(),
        user_session_id: "test-session".to_string(),
        ..Default::default()
    }
}

/// Whether a local `python3` is available for script execution tests.
pub fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Handler that executes the received code with `python3` in `workdir`.
///
/// Exit status 0 maps to `success: true` with stdout as the output text;
/// anything else maps to `success: false` with the printed diagnostics, or
/// a `SystemExit` error output when nothing was printed.
pub fn python_kernel(workdir: PathBuf) -> Handler {
    handler(move |request: RecordedRequest| {
        let workdir = workdir.clone();
        async move {
            let code = request.code();
            let output = tokio::process::Command::new("python3")
                .arg("-c")
                .arg(&code)
                .current_dir(&workdir)
                .output()
                .await
                .expect("spawn python3");

            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();

            if output.status.success() {
                return MockReply::success(&stdout);
            }

            let text = format!("{stdout}{stderr}");
            if text.is_empty() {
                let code = output.status.code().unwrap_or(-1).to_string();
                MockReply::result(false, "", "SystemExit", &code)
            } else {
                MockReply::failure(&text)
            }
        }
    })
}
