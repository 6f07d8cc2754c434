//! AgentKit sandbox tool backend.
//!
//! Runs filesystem operations inside a remote sandbox tool instance. Every
//! operation becomes a python script that is sent, signed, through the
//! AgentKit `InvokeTool` API as a `RunCode` operation.
//!
//! ```text
//!   SandboxToolBackend::read()
//!         │  validate + render READ template (base64 parameters)
//!         ▼
//!   Transport::run_code()
//!         │  OperationPayload {code, kernelName, timeout?}
//!         │  POST /?Action=InvokeTool&Version=2025-10-30  (HMAC-SHA256 signed)
//!         ▼
//!   {result: {result: "<json>"}}  ──►  {success, data.outputs[0]}
//!         │
//!         ▼
//!   ExecutionOutcome {text, exit_code: 0 | -1}  ──►  String / FilesystemError
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use agentkit_sandbox::agentkit::{Config, SandboxToolBackend};
//! use agentkit_sandbox::filesystem::{Backend, ReadRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SandboxToolBackend::new(Config {
//!     access_key_id: "ak".to_string(),
//!     secret_access_key: "sk".to_string().into(),
//!     tool_id: "tool-id".to_string(),
//!     user_session_id: "session-1".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let content = backend
//!     .read(ReadRequest {
//!         file_path: "/home/gem/notes.txt".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{content}");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod signing;
pub mod templates;
pub mod transport;
pub mod wire;

pub use backend::SandboxToolBackend;
pub use config::{Config, Region};
pub use transport::{SessionIdentity, Transport};
pub use wire::ExecutionOutcome;
