//! Error types for the sandbox filesystem backend.
//!
//! Each layer has its own enum: configuration problems are caught at
//! construction, template and transport failures are wrapped by the
//! filesystem operations, and remote script failures carry the synthesized
//! exit code plus the diagnostic text printed by the script.

use thiserror::Error;

use crate::filesystem::Operation;

/// Errors raised while validating a backend configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was left empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Neither session identifier was provided.
    #[error("SessionID or UserSessionID is required, at least one must be provided")]
    MissingSession,

    /// The region is not one of the known endpoints.
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// A value could not be parsed.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Setting name (env var or field).
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// The default HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors raised while rendering a script template.
///
/// These indicate a defect in the template or in the parameters the
/// backend supplies, never a runtime condition of the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template references a parameter that was not supplied.
    #[error("missing parameter '{0}'")]
    MissingParameter(String),

    /// A `{` was opened but never closed.
    #[error("unclosed placeholder at byte {0}")]
    UnclosedPlaceholder(usize),

    /// A `{}` with no name.
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),

    /// A lone `}` outside a placeholder.
    #[error("unmatched '}}' at byte {0}")]
    UnmatchedBrace(usize),
}

/// Errors raised by the InvokeTool transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The operation payload or request body could not be serialized.
    #[error("failed to marshal {what}: {source}")]
    Marshal {
        /// Which document failed.
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The endpoint URL is malformed.
    #[error("bad request: {0}")]
    InvalidEndpoint(String),

    /// The HTTP request could not be sent.
    #[error("do request err: {0}")]
    Request(#[source] reqwest::Error),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// The server answered with a status other than 200.
    #[error("request failed with status code {0}")]
    Status(u16),

    /// The outer response envelope is not valid JSON of the expected shape.
    #[error("failed to unmarshal response: {0}")]
    DecodeResponse(#[source] serde_json::Error),

    /// The inner result document is not valid JSON of the expected shape.
    #[error("failed to unmarshal result data: {0}")]
    DecodeResult(#[source] serde_json::Error),
}

impl TransportError {
    /// Whether the failure happened before any response was received.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

/// Errors returned by filesystem operations.
///
/// Callers distinguish remote failures (file exists, not found, ambiguous
/// edit, permission denied) by the text in [`FilesystemError::ScriptFailed`].
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// A path that must be absolute was not.
    #[error("path must be an absolute path: {0}")]
    InvalidPath(String),

    /// A required argument was missing or inconsistent.
    #[error("{0}")]
    InvalidArgument(String),

    /// The script for an operation could not be rendered.
    #[error("failed to render {operation} template: {source}")]
    Render {
        operation: Operation,
        #[source]
        source: TemplateError,
    },

    /// The script could not be delivered or its result decoded.
    #[error("failed to execute {} script: {source}", .operation.subject())]
    Invoke {
        operation: Operation,
        #[source]
        source: TransportError,
    },

    /// The script ran and reported failure.
    #[error("{} {exit_code}: {output}", .operation.failure_prefix())]
    ScriptFailed {
        operation: Operation,
        exit_code: i32,
        output: String,
    },
}

impl FilesystemError {
    /// The synthesized exit code, for failures reported by the sandbox.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ScriptFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    /// Whether the request never reached a script (local validation).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidPath(_) | Self::InvalidArgument(_))
    }
}

/// Result type for filesystem operations.
pub type Result<T> = std::result::Result<T, FilesystemError>;
