// ABOUTME: Identity directory collaborator: resolves identity names to network targets
// ABOUTME: The vote target variant is chosen by which addressing fields the directory populated

pub mod static_directory;

use crate::types::QuorumConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use static_directory::StaticDirectory;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("not found")]
    NotFound(String),
    #[error("Identity {0} has no address")]
    Unaddressable(String),
    #[error("Identity {0} has no quorum configuration")]
    NoQuorum(String),
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to load directory: {0}")]
    Load(String),
}

/// Where a vote request for one identity is sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteTarget {
    /// Peer responder reachable over an authenticated channel
    Direct { endpoint: String },
    /// Peer only reachable through a deployment proxy relay
    Relayed { relay_url: String, identity: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub name: String,
    /// HTTP address of the deployment proxy fronting this identity
    #[serde(default)]
    pub address: Option<String>,
    /// Directly reachable responder endpoint
    #[serde(default)]
    pub transport_address: Option<String>,
    #[serde(default)]
    pub quorum: Option<QuorumConfig>,
}

impl ResolvedIdentity {
    pub fn target(&self) -> Result<VoteTarget, DirectoryError> {
        match (&self.transport_address, &self.address) {
            (Some(endpoint), _) => Ok(VoteTarget::Direct {
                endpoint: endpoint.trim_end_matches('/').to_string(),
            }),
            (None, Some(relay_url)) => Ok(VoteTarget::Relayed {
                relay_url: relay_url.trim_end_matches('/').to_string(),
                identity: self.name.clone(),
            }),
            (None, None) => Err(DirectoryError::Unaddressable(self.name.clone())),
        }
    }
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn resolve_identity(&self, name: &str) -> Result<ResolvedIdentity, DirectoryError>;

    async fn lookup_quorum_config(&self, identity: &str) -> Result<QuorumConfig, DirectoryError> {
        self.resolve_identity(identity)
            .await?
            .quorum
            .ok_or_else(|| DirectoryError::NoQuorum(identity.to_string()))
    }
}
