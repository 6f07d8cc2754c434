//! Filesystem backend for agents, running inside a remote AgentKit sandbox.
//!
//! - [`filesystem`]: the [`Backend`](filesystem::Backend) trait and its
//!   request/response types.
//! - [`agentkit`]: the sandbox tool implementation (signing, script
//!   templates, InvokeTool transport).
//! - [`error`]: error types for each layer.

pub mod agentkit;
pub mod error;
pub mod filesystem;

pub use agentkit::{Config, Region, SandboxToolBackend};
pub use error::{ConfigError, FilesystemError, TemplateError, TransportError};
pub use filesystem::Backend;
