//! Signed HTTP transport for InvokeTool / RunCode.

use chrono::Utc;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::agentkit::signing::{self, SigningInput};
use crate::agentkit::wire::{
    self, ExecutionOutcome, InvokeToolRequest, RUN_CODE_OPERATION, RunCodePayload,
};
use crate::error::TransportError;

const SERVICE: &str = "agentkit";
const ACTION: &str = "InvokeTool";
const API_VERSION: &str = "2025-10-30";

/// Identity and session scope attached to every request.
#[derive(Clone)]
pub struct SessionIdentity {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub region: String,
    pub tool_id: String,
    pub session_id: String,
    pub user_session_id: String,
    /// Sent as `Ttl` when positive.
    pub session_ttl: Option<u32>,
    /// Sent as the payload `timeout` when positive.
    pub execution_timeout: Option<u32>,
}

impl std::fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("tool_id", &self.tool_id)
            .field("session_id", &self.session_id)
            .field("user_session_id", &self.user_session_id)
            .field("session_ttl", &self.session_ttl)
            .field("execution_timeout", &self.execution_timeout)
            .finish_non_exhaustive()
    }
}

/// Sends scripts to the sandbox and decodes the result.
///
/// Holds no mutable state; the inner client is shared across concurrent
/// calls. Dropping the future returned by [`Transport::run_code`] aborts the
/// HTTP request, but a script already running in the sandbox keeps running
/// until it finishes or hits the execution timeout.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
    identity: SessionIdentity,
}

impl Transport {
    pub fn new(client: Client, base_url: impl Into<String>, identity: SessionIdentity) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Run a python script in the sandbox session.
    pub async fn run_code(&self, code: &str) -> Result<ExecutionOutcome, TransportError> {
        let payload = RunCodePayload::python(code, self.identity.execution_timeout).to_json()?;
        let request = InvokeToolRequest {
            tool_id: &self.identity.tool_id,
            session_id: &self.identity.session_id,
            user_session_id: &self.identity.user_session_id,
            operation_payload: payload,
            operation_type: RUN_CODE_OPERATION,
            ttl: self.identity.session_ttl.filter(|ttl| *ttl > 0),
        };
        let body = request.to_bytes()?;

        let response = self.invoke_tool(body).await?;
        wire::decode_response(&response)
    }

    async fn invoke_tool(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let query = signing::canonical_query(&[("Action", ACTION), ("Version", API_VERSION)]);
        let url = Url::parse(&format!("{}/?{}", self.base_url, query))
            .map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;
        let host = host_header(&url)?;

        let headers = signing::sign(&SigningInput {
            method: "POST",
            host: &host,
            query: &query,
            body: &body,
            access_key_id: &self.identity.access_key_id,
            secret_access_key: self.identity.secret_access_key.expose_secret(),
            region: &self.identity.region,
            service: SERVICE,
            timestamp: Utc::now(),
        });

        tracing::debug!(
            tool_id = %self.identity.tool_id,
            body_bytes = body.len(),
            "Invoking sandbox tool"
        );

        let mut builder = self.client.post(url);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }

        let response = builder
            .body(body)
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(TransportError::ReadBody)?;

        tracing::debug!(status = status.as_u16(), body_bytes = bytes.len(), "Sandbox tool responded");

        if status != reqwest::StatusCode::OK {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(bytes.to_vec())
    }
}

/// The `Host` header value the client will send for `url`.
fn host_header(url: &Url) -> Result<String, TransportError> {
    let host = url
        .host_str()
        .ok_or_else(|| TransportError::InvalidEndpoint(format!("missing host in {url}")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
