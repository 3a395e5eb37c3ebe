// ABOUTME: Environment-driven configuration for responders, orchestrators and the gateway
// ABOUTME: Reads a .env file first, then typed settings with documented defaults

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("Missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Approve,
    Reject,
}

#[derive(Debug, Clone)]
pub struct VotingConfig {
    /// Applied independently to every outbound vote call
    pub call_timeout: Duration,
    pub handler_delay: Duration,
    pub handler: HandlerKind,
    pub responder_bind: SocketAddr,
    pub api_bind: SocketAddr,
    pub directory_path: PathBuf,
    pub remote_signer_url: Option<String>,
    pub local_identity: Option<String>,
    /// Empty means the relay copies every end-to-end header
    pub relay_forward_headers: Vec<String>,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_millis(5000),
            handler_delay: Duration::from_millis(1000),
            handler: HandlerKind::Approve,
            responder_bind: SocketAddr::from(([0, 0, 0, 0], 7001)),
            api_bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            directory_path: PathBuf::from("directory.json"),
            remote_signer_url: None,
            local_identity: None,
            relay_forward_headers: Vec::new(),
        }
    }
}

impl VotingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let call_timeout = match lookup("VOTE_CALL_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_millis("VOTE_CALL_TIMEOUT_MS", &v)?),
            None => defaults.call_timeout,
        };
        if call_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "VOTE_CALL_TIMEOUT_MS",
                value: "0".to_string(),
            });
        }

        let handler_delay = match lookup("VOTE_HANDLER_DELAY_MS") {
            Some(v) => Duration::from_millis(parse_millis("VOTE_HANDLER_DELAY_MS", &v)?),
            None => defaults.handler_delay,
        };

        let handler = match lookup("VOTING_HANDLER").as_deref() {
            None | Some("approve") => HandlerKind::Approve,
            Some("reject") => HandlerKind::Reject,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "VOTING_HANDLER",
                    value: other.to_string(),
                })
            }
        };

        let responder_bind = match lookup("RESPONDER_BIND_ADDR") {
            Some(v) => parse_addr("RESPONDER_BIND_ADDR", &v)?,
            None => defaults.responder_bind,
        };
        let api_bind = match lookup("API_BIND_ADDR") {
            Some(v) => parse_addr("API_BIND_ADDR", &v)?,
            None => defaults.api_bind,
        };

        let relay_forward_headers = lookup("RELAY_FORWARD_HEADERS")
            .map(|v| {
                v.split(',')
                    .map(|h| h.trim().to_ascii_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            call_timeout,
            handler_delay,
            handler,
            responder_bind,
            api_bind,
            directory_path: lookup("DIRECTORY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.directory_path),
            remote_signer_url: lookup("REMOTE_SIGNER_URL").filter(|v| !v.is_empty()),
            local_identity: lookup("LOCAL_IDENTITY").filter(|v| !v.is_empty()),
            relay_forward_headers,
        })
    }

    pub fn require_local_identity(&self) -> Result<&str, ConfigError> {
        self.local_identity
            .as_deref()
            .ok_or(ConfigError::Missing("LOCAL_IDENTITY"))
    }

    pub fn require_remote_signer_url(&self) -> Result<&str, ConfigError> {
        self.remote_signer_url
            .as_deref()
            .ok_or(ConfigError::Missing("REMOTE_SIGNER_URL"))
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_addr(key: &'static str, value: &str) -> Result<SocketAddr, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
