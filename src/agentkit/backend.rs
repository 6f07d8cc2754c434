//! Filesystem backend that runs every operation as a script in the sandbox.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::agentkit::config::Config;
use crate::agentkit::templates::{self, ScriptParams};
use crate::agentkit::transport::{SessionIdentity, Transport};
use crate::error::{ConfigError, FilesystemError, Result};
use crate::filesystem::{
    Backend, DEFAULT_READ_LIMIT, EditRequest, ExecuteRequest, ExecuteResponse, FileInfo,
    GlobInfoRequest, GrepMatch, GrepRequest, LsInfoRequest, Operation, ReadRequest,
    WriteRequest, format_path,
};

/// A [`Backend`] backed by an AgentKit sandbox tool instance.
///
/// Each call renders a python script, ships it to the sandbox through a
/// signed InvokeTool request and maps the script's output back. Nothing is
/// cached between calls.
///
/// Paths inside the sandbox may be subject to permission restrictions;
/// operate within directories the sandbox user can write to.
#[derive(Debug, Clone)]
pub struct SandboxToolBackend {
    transport: Transport,
}

impl SandboxToolBackend {
    /// Validate `config` and build the backend.
    pub fn new(config: Config) -> std::result::Result<Self, ConfigError> {
        use secrecy::ExposeSecret;

        if config.access_key_id.is_empty() {
            return Err(ConfigError::MissingField("AccessKeyID"));
        }
        if config.secret_access_key.expose_secret().is_empty() {
            return Err(ConfigError::MissingField("SecretAccessKey"));
        }
        if config.tool_id.is_empty() {
            return Err(ConfigError::MissingField("ToolID"));
        }
        if config.session_id.is_empty() && config.user_session_id.is_empty() {
            return Err(ConfigError::MissingSession);
        }

        let region = config.resolve_region()?;
        let client = match config.http_client {
            Some(client) => client,
            None => default_client(config.request_timeout)?,
        };

        let identity = SessionIdentity {
            access_key_id: config.access_key_id,
            secret_access_key: config.secret_access_key,
            region: region.as_str().to_string(),
            tool_id: config.tool_id,
            session_id: config.session_id,
            user_session_id: config.user_session_id,
            session_ttl: config.session_ttl,
            execution_timeout: config.execution_timeout,
        };

        tracing::debug!(
            region = %region,
            tool_id = %identity.tool_id,
            "Created sandbox tool backend"
        );

        Ok(Self {
            transport: Transport::new(client, region.base_url(), identity),
        })
    }

    /// Send requests to `base_url` instead of the regional endpoint.
    ///
    /// The credential scope still uses the configured region.
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            transport: Transport::new(
                self.transport.client().clone(),
                base_url,
                self.transport.identity().clone(),
            ),
        }
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn identity(&self) -> &SessionIdentity {
        self.transport.identity()
    }

    /// Render, run and check a script; returns its output on success.
    async fn run_script(
        &self,
        operation: Operation,
        template: &str,
        params: ScriptParams,
    ) -> Result<String> {
        let script = templates::render(template, &params)
            .map_err(|source| FilesystemError::Render { operation, source })?;

        tracing::debug!(%operation, script_bytes = script.len(), "Running sandbox script");

        let outcome = self
            .transport
            .run_code(&script)
            .await
            .map_err(|source| FilesystemError::Invoke { operation, source })?;

        if !outcome.succeeded() {
            tracing::debug!(
                %operation,
                exit_code = outcome.exit_code,
                "Sandbox script reported failure"
            );
            return Err(FilesystemError::ScriptFailed {
                operation,
                exit_code: outcome.exit_code,
                output: outcome.text,
            });
        }

        Ok(outcome.text)
    }
}

fn default_client(timeout: Option<Duration>) -> std::result::Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Decode one JSON record per line, skipping lines that do not parse.
fn parse_records<T: DeserializeOwned>(output: &str) -> Vec<T> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

#[async_trait]
impl Backend for SandboxToolBackend {
    async fn ls_info(&self, req: LsInfoRequest) -> Result<Vec<FileInfo>> {
        let path = format_path(&req.path, "/", false)?;
        let params = ScriptParams::new().text("path", &path);

        let output = self.run_script(Operation::Ls, templates::LS, params).await?;
        Ok(parse_records(&output))
    }

    async fn read(&self, req: ReadRequest) -> Result<String> {
        let path = format_path(&req.file_path, "", true)?;
        let offset = req.offset.max(0);
        let limit = if req.limit <= 0 {
            DEFAULT_READ_LIMIT
        } else {
            req.limit
        };

        let params = ScriptParams::new()
            .text("file_path", &path)
            .int("offset", offset)
            .int("limit", limit);

        self.run_script(Operation::Read, templates::READ, params).await
    }

    async fn write(&self, req: WriteRequest) -> Result<()> {
        let path = format_path(&req.file_path, "", true)?;
        let params = ScriptParams::new()
            .text("file_path", &path)
            .text("content", &req.content);

        self.run_script(Operation::Write, templates::WRITE, params)
            .await?;
        Ok(())
    }

    async fn edit(&self, req: EditRequest) -> Result<()> {
        let path = format_path(&req.file_path, "", true)?;
        if req.old_string.is_empty() {
            return Err(FilesystemError::InvalidArgument(
                "old string is required".to_string(),
            ));
        }
        if req.old_string == req.new_string {
            return Err(FilesystemError::InvalidArgument(
                "new string must be different from old string".to_string(),
            ));
        }

        let params = ScriptParams::new()
            .text("file_path", &path)
            .text("old", &req.old_string)
            .text("new", &req.new_string)
            .flag("replace_all", req.replace_all);

        self.run_script(Operation::Edit, templates::EDIT, params)
            .await?;
        Ok(())
    }

    async fn grep_raw(&self, req: GrepRequest) -> Result<Vec<GrepMatch>> {
        let path = format_path(&req.path, "", false)?;
        let params = ScriptParams::new()
            .text("pattern", &req.pattern)
            .text("path", &path)
            .text("glob", &req.glob);

        let output = self
            .run_script(Operation::Grep, templates::GREP, params)
            .await?;

        let mut matches = Vec::new();
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match serde_json::from_str::<GrepMatch>(line) {
                Ok(m) => matches.push(m),
                Err(e) => {
                    tracing::warn!(error = %e, line, "Skipping malformed grep match line");
                }
            }
        }
        Ok(matches)
    }

    async fn glob_info(&self, req: GlobInfoRequest) -> Result<Vec<FileInfo>> {
        let path = format_path(&req.path, "/", false)?;
        let params = ScriptParams::new()
            .text("path", &path)
            .text("pattern", &req.pattern);

        let output = self
            .run_script(Operation::Glob, templates::GLOB, params)
            .await?;
        Ok(parse_records(&output))
    }

    async fn execute(&self, req: ExecuteRequest) -> Result<ExecuteResponse> {
        if req.command.is_empty() {
            return Err(FilesystemError::InvalidArgument(
                "command is required".to_string(),
            ));
        }

        let params = ScriptParams::new().text("command", &req.command);
        let output = self
            .run_script(Operation::Execute, templates::EXECUTE, params)
            .await?;

        Ok(ExecuteResponse {
            output,
            exit_code: Some(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn valid_config() -> Config {
        Config {
            access_key_id: "test-ak".to_string(),
            secret_access_key: SecretString::from("test-sk".to_string()),
            tool_id: "test-tool".to_string(),
            user_session_id: "test-session".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_with_all_fields() {
        let backend = SandboxToolBackend::new(Config {
            region: "cn-beijing".to_string(),
            session_ttl: Some(3600),
            execution_timeout: Some(60),
            ..valid_config()
        })
        .unwrap();

        let identity = backend.identity();
        assert_eq!(identity.access_key_id, "test-ak");
        assert_eq!(identity.tool_id, "test-tool");
        assert_eq!(identity.user_session_id, "test-session");
        assert_eq!(identity.region, "cn-beijing");
        assert_eq!(identity.session_ttl, Some(3600));
        assert_eq!(identity.execution_timeout, Some(60));
        assert_eq!(backend.base_url(), "https://agentkit.cn-beijing.volces.com");
    }

    #[test]
    fn test_new_defaults() {
        let backend = SandboxToolBackend::new(valid_config()).unwrap();
        assert_eq!(backend.identity().region, "cn-beijing");
        assert_eq!(backend.base_url(), "https://agentkit.cn-beijing.volces.com");
        assert_eq!(backend.identity().session_ttl, None);
        assert_eq!(backend.identity().execution_timeout, None);
    }

    #[test]
    fn test_new_shanghai() {
        let backend = SandboxToolBackend::new(Config {
            region: "cn-shanghai".to_string(),
            ..valid_config()
        })
        .unwrap();
        assert_eq!(backend.base_url(), "https://agentkit.cn-shanghai.volces.com");
    }

    #[test]
    fn test_new_missing_required_fields() {
        let cases = [
            (
                Config {
                    access_key_id: String::new(),
                    ..valid_config()
                },
                "AccessKeyID is required",
            ),
            (
                Config {
                    secret_access_key: SecretString::from(String::new()),
                    ..valid_config()
                },
                "SecretAccessKey is required",
            ),
            (
                Config {
                    tool_id: String::new(),
                    ..valid_config()
                },
                "ToolID is required",
            ),
            (
                Config {
                    user_session_id: String::new(),
                    ..valid_config()
                },
                "SessionID or UserSessionID is required",
            ),
        ];

        for (config, expected) in cases {
            let err = SandboxToolBackend::new(config).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "expected '{expected}', got '{err}'"
            );
        }
    }

    #[test]
    fn test_new_accepts_session_id_alone() {
        let backend = SandboxToolBackend::new(Config {
            session_id: "sid".to_string(),
            user_session_id: String::new(),
            ..valid_config()
        })
        .unwrap();
        assert_eq!(backend.identity().session_id, "sid");
    }

    #[test]
    fn test_new_invalid_region() {
        let err = SandboxToolBackend::new(Config {
            region: "invalid-region".to_string(),
            ..valid_config()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid region: invalid-region");
    }

    #[test]
    fn test_with_base_url_keeps_identity() {
        let backend = SandboxToolBackend::new(valid_config())
            .unwrap()
            .with_base_url("http://127.0.0.1:9999");
        assert_eq!(backend.base_url(), "http://127.0.0.1:9999");
        assert_eq!(backend.identity().region, "cn-beijing");
    }

    #[test]
    fn test_parse_records_skips_malformed_lines() {
        let output = "{\"path\": \"a\", \"is_dir\": false}\nnot json\n\n{\"path\": \"b\", \"is_dir\": true}\n";
        let files: Vec<FileInfo> = parse_records(output);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "a");
        assert!(files[1].is_dir);
    }

    #[tokio::test]
    async fn test_local_validation_happens_before_any_request() {
        // Port 9 (discard) is never contacted: every case fails locally.
        let backend = SandboxToolBackend::new(valid_config())
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        let err = backend
            .read(ReadRequest {
                file_path: "relative.txt".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("absolute path"));

        let err = backend
            .write(WriteRequest {
                file_path: "data/new.txt".to_string(),
                content: "x".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("absolute path"));

        let err = backend
            .edit(EditRequest {
                file_path: "/data/file.txt".to_string(),
                old_string: "same".to_string(),
                new_string: "same".to_string(),
                replace_all: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "new string must be different from old string");

        let err = backend
            .edit(EditRequest {
                file_path: "/data/file.txt".to_string(),
                new_string: "x".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "old string is required");

        let err = backend.execute(ExecuteRequest::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "command is required");
    }
}
