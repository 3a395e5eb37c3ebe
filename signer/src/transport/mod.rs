// ABOUTME: Delivers one vote request to one remote identity and returns its decision
// ABOUTME: Direct and relayed delivery are selected by the resolved target variant

pub mod direct;
pub mod relayed;

use async_trait::async_trait;
use keyvote_core::directory::VoteTarget;
use keyvote_core::types::VoteRequest;
use reqwest::header::{HeaderMap, HeaderName, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use thiserror::Error;

pub use direct::DirectTransport;
pub use relayed::RelayedTransport;

pub const MSGPACK_CONTENT_TYPE: &str = "application/msgpack";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("peer answered HTTP {0}")]
    Status(u16),
    #[error("malformed vote response: {0}")]
    Decode(String),
    #[error("failed to encode vote request: {0}")]
    Encode(String),
    #[error("vote response for task {got}, expected {expected}")]
    TaskMismatch { expected: String, got: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Connect(e.to_string())
        }
    }
}

#[async_trait]
pub trait VoteTransport: Send + Sync {
    /// Returns the remote identity's decision. A transport error is never a "no" vote.
    async fn request_vote(
        &self,
        target: &VoteTarget,
        request: &VoteRequest,
        headers: &HeaderMap,
    ) -> Result<bool, TransportError>;
}

/// Network transport dispatching on the target variant
#[derive(Clone)]
pub struct NetworkTransport {
    direct: DirectTransport,
    relayed: RelayedTransport,
}

impl NetworkTransport {
    pub fn new(direct: DirectTransport, relayed: RelayedTransport) -> Self {
        Self { direct, relayed }
    }

    /// Both strategies share one HTTP client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            direct: DirectTransport::new(client.clone()),
            relayed: RelayedTransport::new(client),
        }
    }
}

#[async_trait]
impl VoteTransport for NetworkTransport {
    async fn request_vote(
        &self,
        target: &VoteTarget,
        request: &VoteRequest,
        headers: &HeaderMap,
    ) -> Result<bool, TransportError> {
        match target {
            VoteTarget::Direct { endpoint } => self.direct.send(endpoint, request).await,
            VoteTarget::Relayed {
                relay_url,
                identity,
            } => self.relayed.send(relay_url, identity, request, headers).await,
        }
    }
}

const HOP_BY_HOP: [&str; 8] = [
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "proxy-connection",
];

/// Headers that survive a hop: end-to-end headers only, optionally restricted to an allowlist
pub fn forwardable_headers(source: &HeaderMap, allowlist: &[String]) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in source.iter() {
        if is_hop_specific(name) {
            continue;
        }
        if !allowlist.is_empty() && !allowlist.iter().any(|allowed| allowed == name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

fn is_hop_specific(name: &HeaderName) -> bool {
    name == HOST
        || name == CONTENT_LENGTH
        || name == CONTENT_TYPE
        || name == CONNECTION
        || HOP_BY_HOP.contains(&name.as_str())
}
