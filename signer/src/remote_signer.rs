// ABOUTME: HTTP adapter for the key-custody node's signing operation
// ABOUTME: POSTs {identity, message} to the custody service and returns the raw signature bytes

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use keyvote_core::signing::{RemoteSigner, SigningError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

#[derive(Debug, Serialize)]
struct SignBody<'a> {
    identity: &'a str,
    message: String,
}

#[derive(Debug, Deserialize)]
struct SignReply {
    signature: String,
}

pub struct HttpRemoteSigner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteSigner {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RemoteSigner for HttpRemoteSigner {
    async fn remote_sign(&self, message: &[u8], identity: &str) -> Result<Vec<u8>, SigningError> {
        debug!("Requesting signature over {} bytes for {}", message.len(), identity);

        let response = self
            .client
            .post(format!("{}/sign", self.base_url))
            .json(&SignBody {
                identity,
                message: BASE64.encode(message),
            })
            .send()
            .await
            .map_err(|e| {
                error!("Remote signer request failed: {}", e);
                SigningError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SigningError::Rejected(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let reply: SignReply = response
            .json()
            .await
            .map_err(|e| SigningError::Malformed(e.to_string()))?;

        BASE64
            .decode(reply.signature.as_bytes())
            .map_err(|e| SigningError::Malformed(e.to_string()))
    }
}
