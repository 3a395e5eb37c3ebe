// ABOUTME: Relayed vote delivery through a deployment proxy that forwards to the peer's listener
// ABOUTME: Marks the request as forwarded and copies the caller's headers onto the relay call

use super::{forwardable_headers, TransportError};
use keyvote_core::types::{VoteRequest, VoteRequestWire, VoteResponse};
use reqwest::header::HeaderMap;
use tracing::debug;

#[derive(Clone)]
pub struct RelayedTransport {
    client: reqwest::Client,
}

impl RelayedTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn send(
        &self,
        relay_url: &str,
        identity: &str,
        request: &VoteRequest,
        caller_headers: &HeaderMap,
    ) -> Result<bool, TransportError> {
        let wire = VoteRequestWire::from(&request.forwarded());
        let url = relay_vote_url(relay_url, identity)?;

        debug!(
            url = %url,
            task_id = %request.task_id,
            copied_headers = caller_headers.len(),
            "Sending relayed vote request"
        );

        let response = self
            .client
            .post(url)
            .headers(forwardable_headers(caller_headers, &[]))
            .json(&wire)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let vote: VoteResponse = response.json().await?;
        if vote.task_id != request.task_id {
            return Err(TransportError::TaskMismatch {
                expected: request.task_id.clone(),
                got: vote.task_id,
            });
        }

        Ok(vote.approved)
    }
}

/// Identity names are opaque, so the name is appended as one percent-encoded segment
fn relay_vote_url(relay_url: &str, identity: &str) -> Result<reqwest::Url, TransportError> {
    let mut url = reqwest::Url::parse(relay_url)
        .map_err(|e| TransportError::Encode(format!("invalid relay url {}: {}", relay_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| TransportError::Encode(format!("relay url {} cannot carry a path", relay_url)))?
        .pop_if_empty()
        .extend(["api", "relay", "vote", identity]);
    Ok(url)
}
