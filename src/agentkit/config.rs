//! Configuration for the AgentKit sandbox tool backend.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

const BEIJING_BASE_URL: &str = "https://agentkit.cn-beijing.volces.com";
const SHANGHAI_BASE_URL: &str = "https://agentkit.cn-shanghai.volces.com";

/// Region hosting the sandbox tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    #[default]
    Beijing,
    ShangHai,
}

impl Region {
    /// Region identifier used in the credential scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beijing => "cn-beijing",
            Self::ShangHai => "cn-shanghai",
        }
    }

    /// Base URL of the AgentKit endpoint for this region.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Beijing => BEIJING_BASE_URL,
            Self::ShangHai => SHANGHAI_BASE_URL,
        }
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cn-beijing" => Ok(Self::Beijing),
            "cn-shanghai" => Ok(Self::ShangHai),
            other => Err(ConfigError::InvalidRegion(other.to_string())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for [`SandboxToolBackend`](super::SandboxToolBackend).
///
/// `access_key_id`, `secret_access_key` and `tool_id` are required, as is at
/// least one of `session_id` / `user_session_id`. Everything else has a
/// default. Validation happens in
/// [`SandboxToolBackend::new`](super::SandboxToolBackend::new).
#[derive(Clone)]
pub struct Config {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    /// ID of the sandbox tool.
    pub tool_id: String,
    /// Region identifier, e.g. `cn-beijing`. Empty means Beijing.
    pub region: String,
    /// Session instance to run in. The server creates one when it does not
    /// exist. Session IDs die with the tool lifecycle, so prefer
    /// `user_session_id`.
    pub session_id: String,
    /// User-scoped session instance, for context isolation between callers.
    pub user_session_id: String,
    /// Time-to-live of a newly created session, in seconds (60-86400).
    /// `None` or `Some(0)` leaves the server default (1800) in place.
    pub session_ttl: Option<u32>,
    /// Server-side code execution timeout, in seconds. `None` or `Some(0)`
    /// leaves the server default in place.
    pub execution_timeout: Option<u32>,
    /// Client used to send requests. When set, `request_timeout` is ignored.
    pub http_client: Option<reqwest::Client>,
    /// Overall timeout for the default client.
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: SecretString::from(String::new()),
            tool_id: String::new(),
            region: String::new(),
            session_id: String::new(),
            user_session_id: String::new(),
            session_ttl: None,
            execution_timeout: None,
            http_client: None,
            request_timeout: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("tool_id", &self.tool_id)
            .field("region", &self.region)
            .field("session_id", &self.session_id)
            .field("user_session_id", &self.user_session_id)
            .field("session_ttl", &self.session_ttl)
            .field("execution_timeout", &self.execution_timeout)
            .field("http_client", &self.http_client.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Build a config from `VOLC_*` environment variables.
    ///
    /// Reads `VOLC_ACCESS_KEY_ID`, `VOLC_SECRET_ACCESS_KEY`, `VOLC_TOOL_ID`,
    /// `VOLC_REGION`, `VOLC_SESSION_ID`, `VOLC_USER_SESSION_ID`,
    /// `VOLC_SESSION_TTL` and `VOLC_EXECUTION_TIMEOUT`. Missing variables are
    /// left empty; required fields are checked when the backend is built.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            access_key_id: optional_env("VOLC_ACCESS_KEY_ID")?.unwrap_or_default(),
            secret_access_key: SecretString::from(
                optional_env("VOLC_SECRET_ACCESS_KEY")?.unwrap_or_default(),
            ),
            tool_id: optional_env("VOLC_TOOL_ID")?.unwrap_or_default(),
            region: optional_env("VOLC_REGION")?.unwrap_or_default(),
            session_id: optional_env("VOLC_SESSION_ID")?.unwrap_or_default(),
            user_session_id: optional_env("VOLC_USER_SESSION_ID")?.unwrap_or_default(),
            session_ttl: parse_optional_u32("VOLC_SESSION_TTL")?,
            execution_timeout: parse_optional_u32("VOLC_EXECUTION_TIMEOUT")?,
            http_client: None,
            request_timeout: None,
        })
    }

    /// Resolve the configured region, defaulting to Beijing.
    pub fn resolve_region(&self) -> Result<Region, ConfigError> {
        if self.region.is_empty() {
            return Ok(Region::default());
        }
        self.region.parse()
    }
}

/// Read an env var, treating unset and empty as `None`.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

fn parse_optional_u32(key: &str) -> Result<Option<u32>, ConfigError> {
    optional_env(key)?
        .map(|raw| {
            raw.trim().parse::<u32>().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{raw}' is not a non-negative integer: {e}"),
            })
        })
        .transpose()
}
