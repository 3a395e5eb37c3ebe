// ABOUTME: In-memory identity directory loaded from a JSON document
// ABOUTME: Used by the binaries and as the directory behind the vote relay

use super::{DirectoryError, IdentityDirectory, ResolvedIdentity};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    identities: Vec<ResolvedIdentity>,
}

#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    identities: HashMap<String, ResolvedIdentity>,
}

impl StaticDirectory {
    pub fn new(identities: impl IntoIterator<Item = ResolvedIdentity>) -> Self {
        Self {
            identities: identities
                .into_iter()
                .map(|identity| (identity.name.clone(), identity))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let file: DirectoryFile =
            serde_json::from_str(json).map_err(|e| DirectoryError::Load(e.to_string()))?;
        Ok(Self::new(file.identities))
    }

    pub async fn load(path: &Path) -> Result<Self, DirectoryError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DirectoryError::Load(format!("{}: {}", path.display(), e)))?;
        let directory = Self::from_json(&contents)?;
        info!("Loaded {} identities from {}", directory.len(), path.display());
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[async_trait]
impl IdentityDirectory for StaticDirectory {
    async fn resolve_identity(&self, name: &str) -> Result<ResolvedIdentity, DirectoryError> {
        debug!("Resolving identity {}", name);
        self.identities
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))
    }
}
