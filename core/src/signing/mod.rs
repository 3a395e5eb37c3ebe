use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Remote signer rejected the request: {0}")]
    Rejected(String),
    #[error("Remote signer unreachable: {0}")]
    Network(String),
    #[error("Malformed signer response: {0}")]
    Malformed(String),
}

/// The key-custody node's signing operation
#[async_trait]
pub trait RemoteSigner: Send + Sync {
    async fn remote_sign(&self, message: &[u8], identity: &str) -> Result<Vec<u8>, SigningError>;
}
