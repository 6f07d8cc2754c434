//! Wire types for the InvokeTool API.
//!
//! The request carries the script inside `OperationPayload`, itself a JSON
//! document serialized to a string. The response nests the same way: the
//! outer envelope's `result.result` is a string holding the execution
//! result as JSON.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub const RUN_CODE_OPERATION: &str = "RunCode";
pub const PYTHON3_KERNEL: &str = "python3";

/// Exit code reported for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code synthesized when the sandbox reports `success: false`.
pub const EXIT_FAILURE: i32 = -1;

/// The `OperationPayload` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunCodePayload<'a> {
    pub code: &'a str,
    #[serde(rename = "kernelName")]
    pub kernel_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
}

impl<'a> RunCodePayload<'a> {
    /// A python3 payload; a zero timeout is left to the server default.
    pub fn python(code: &'a str, timeout: Option<u32>) -> Self {
        Self {
            code,
            kernel_name: PYTHON3_KERNEL,
            timeout: timeout.filter(|t| *t > 0),
        }
    }

    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|source| TransportError::Marshal {
            what: "operation payload",
            source,
        })
    }
}

/// Body of an InvokeTool request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvokeToolRequest<'a> {
    #[serde(rename = "ToolId")]
    pub tool_id: &'a str,
    #[serde(rename = "SessionId")]
    pub session_id: &'a str,
    #[serde(rename = "UserSessionId")]
    pub user_session_id: &'a str,
    #[serde(rename = "OperationPayload")]
    pub operation_payload: String,
    #[serde(rename = "OperationType")]
    pub operation_type: &'static str,
    #[serde(rename = "Ttl", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl InvokeToolRequest<'_> {
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec(self).map_err(|source| TransportError::Marshal {
            what: "request",
            source,
        })
    }
}

/// Outer response envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub result: ResponseResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseResult {
    /// JSON-encoded [`ExecutionResult`].
    #[serde(default)]
    pub result: String,
}

/// Inner execution result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: ExecutionData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionData {
    #[serde(default)]
    pub outputs: Vec<KernelOutput>,
}

/// One kernel output: a stream chunk or an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelOutput {
    #[serde(default)]
    pub output_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ename: String,
    #[serde(default)]
    pub evalue: String,
}

/// A decoded script run: its first output and the synthesized exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub text: String,
    pub exit_code: i32,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }
}

impl From<ExecutionResult> for ExecutionOutcome {
    fn from(result: ExecutionResult) -> Self {
        let first = result.data.outputs.into_iter().next();

        if !result.success {
            let text = match first {
                Some(out) if !out.text.is_empty() => out.text,
                Some(out) if !out.ename.is_empty() => format!("{}: {}", out.ename, out.evalue),
                _ => String::new(),
            };
            return Self {
                text,
                exit_code: EXIT_FAILURE,
            };
        }

        Self {
            text: first.map(|out| out.text).unwrap_or_default(),
            exit_code: EXIT_SUCCESS,
        }
    }
}

/// Decode both envelope layers of a response body.
pub fn decode_response(body: &[u8]) -> Result<ExecutionOutcome, TransportError> {
    let envelope: ResponseEnvelope =
        serde_json::from_slice(body).map_err(TransportError::DecodeResponse)?;
    let result: ExecutionResult =
        serde_json::from_str(&envelope.result.result).map_err(TransportError::DecodeResult)?;
    Ok(result.into())
}
