// ABOUTME: Direct vote delivery to a peer responder over its authenticated channel
// ABOUTME: Carries the vote request as MessagePack; channel security comes from the supplied client

use super::{TransportError, MSGPACK_CONTENT_TYPE};
use keyvote_core::types::{VoteRequest, VoteResponse};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

#[derive(Clone)]
pub struct DirectTransport {
    client: reqwest::Client,
}

impl DirectTransport {
    /// `client` is expected to be configured with the deployment's TLS identity and roots
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn send(&self, endpoint: &str, request: &VoteRequest) -> Result<bool, TransportError> {
        let body = rmp_serde::to_vec_named(request).map_err(|e| TransportError::Encode(e.to_string()))?;
        let url = format!("{}/vote", endpoint);

        debug!(url = %url, task_id = %request.task_id, "Sending direct vote request");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let vote: VoteResponse =
            rmp_serde::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))?;

        if vote.task_id != request.task_id {
            return Err(TransportError::TaskMismatch {
                expected: request.task_id.clone(),
                got: vote.task_id,
            });
        }

        Ok(vote.approved)
    }
}
