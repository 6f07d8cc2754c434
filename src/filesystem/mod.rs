//! Filesystem backend contract.
//!
//! A [`Backend`] exposes the operations an agent needs to work inside a
//! sandbox: directory listing, paginated reads, create-only writes,
//! search-and-replace edits, literal grep, recursive glob and shell
//! execution. The remote implementation lives in [`crate::agentkit`].

pub mod path;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use path::format_path;

/// Default number of lines returned by [`Backend::read`] when no limit is given.
pub const DEFAULT_READ_LIMIT: i64 = 200;

/// The filesystem operations, used to label errors and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ls,
    Read,
    Write,
    Edit,
    Grep,
    Glob,
    Execute,
}

impl Operation {
    /// Short name used in render errors and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ls => "ls",
            Self::Read => "read",
            Self::Write => "write",
            Self::Edit => "edit",
            Self::Grep => "grep",
            Self::Glob => "glob",
            Self::Execute => "execute",
        }
    }

    /// Name of the script as it appears in "failed to execute ... script".
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Execute => "command",
            other => other.as_str(),
        }
    }

    /// Message prefix for a script that reported failure.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Self::Ls => "ls script exited with non-zero code",
            Self::Read => "read script exited with non-zero code",
            Self::Write => "write script exited with non-zero code",
            Self::Edit => "edit script exited with non-zero code",
            Self::Grep => "grep script exited with code",
            Self::Glob => "glob script exited with non-zero code",
            Self::Execute => "command exited with non-zero code",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory entry or glob match.
///
/// ls records carry only `path` and `is_dir`; glob records add `size` and
/// `mtime` (seconds since the epoch, fractional).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<f64>,
}

/// A single grep hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepMatch {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Line")]
    pub line: u64,
    #[serde(rename = "Content")]
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct LsInfoRequest {
    /// Directory to list. Empty means `/`.
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReadRequest {
    /// Absolute path of the file.
    pub file_path: String,
    /// Zero-based line offset. Negative values are treated as 0.
    pub offset: i64,
    /// Maximum number of lines. Non-positive values mean [`DEFAULT_READ_LIMIT`].
    pub limit: i64,
}

#[derive(Debug, Clone, Default)]
pub struct WriteRequest {
    /// Absolute path of the file to create.
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    /// Absolute path of the file to modify.
    pub file_path: String,
    pub old_string: String,
    pub new_string: String,
    /// Replace every occurrence instead of requiring exactly one.
    pub replace_all: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GrepRequest {
    /// Directory or file to search. Empty means the sandbox working directory.
    pub path: String,
    /// Literal (non-regex) search string.
    pub pattern: String,
    /// Optional `--include` glob, e.g. `*.rs`.
    pub glob: String,
}

#[derive(Debug, Clone, Default)]
pub struct GlobInfoRequest {
    /// Directory the pattern is evaluated from. Empty means `/`.
    pub path: String,
    /// Glob pattern; `**` matches recursively.
    pub pattern: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExecuteRequest {
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteResponse {
    pub output: String,
    pub exit_code: Option<i32>,
}

/// Filesystem operations available to an agent.
///
/// Implementations must be safe to call concurrently; every call is an
/// independent request.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List the entries of a directory, sorted by name.
    async fn ls_info(&self, req: LsInfoRequest) -> Result<Vec<FileInfo>>;

    /// Read a window of lines, each prefixed with its 1-indexed line number.
    async fn read(&self, req: ReadRequest) -> Result<String>;

    /// Create a new file. Fails if the file already exists.
    async fn write(&self, req: WriteRequest) -> Result<()>;

    /// Replace `old_string` with `new_string` in a file.
    async fn edit(&self, req: EditRequest) -> Result<()>;

    /// Search files for a literal string.
    async fn grep_raw(&self, req: GrepRequest) -> Result<Vec<GrepMatch>>;

    /// Find files matching a glob pattern.
    async fn glob_info(&self, req: GlobInfoRequest) -> Result<Vec<FileInfo>>;

    /// Run a shell command.
    async fn execute(&self, req: ExecuteRequest) -> Result<ExecuteResponse>;
}
