// ABOUTME: Vote relay: forwards a vote request to an identity's real listener
// ABOUTME: Copies the caller's end-to-end headers so tracing and authorization survive the hop

use super::ApiError;
use crate::state::KeyvoteState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use keyvote_core::directory::{DirectoryError, VoteTarget};
use keyvote_core::types::{VoteRequestWire, VoteResponse};
use keyvote_signer::transport::forwardable_headers;
use std::sync::Arc;
use tracing::{debug, warn};

pub async fn relay_vote(
    State(state): State<Arc<KeyvoteState>>,
    Path(identity): Path<String>,
    headers: HeaderMap,
    Json(wire): Json<VoteRequestWire>,
) -> Result<Json<VoteResponse>, ApiError> {
    let resolved = state.directory.resolve_identity(&identity).await.map_err(|e| match e {
        DirectoryError::NotFound(_) => ApiError::BadRequest(format!("unknown identity {}", identity)),
        other => ApiError::Upstream(other.to_string()),
    })?;

    // Only one relay hop: the listener must be directly reachable from here
    let endpoint = match resolved.target().map_err(|e| ApiError::Upstream(e.to_string()))? {
        VoteTarget::Direct { endpoint } => endpoint,
        VoteTarget::Relayed { .. } => {
            warn!("Identity {} is not directly reachable from this relay", identity);
            return Err(ApiError::Upstream(format!(
                "identity {} is not directly reachable from this relay",
                identity
            )));
        }
    };

    let task_id = wire.task_id.clone();
    debug!(
        "Relaying task {} to {} at {} (forwarded: {})",
        task_id, identity, endpoint, wire.is_forwarded
    );

    let response = state
        .client
        .post(format!("{}/vote/json", endpoint))
        .headers(forwardable_headers(&headers, &state.relay_forward_headers))
        .timeout(state.call_timeout)
        .json(&wire)
        .send()
        .await
        .map_err(|e| ApiError::Upstream(format!("relay to {} failed: {}", identity, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Upstream(format!(
            "listener for {} answered HTTP {}",
            identity,
            status.as_u16()
        )));
    }

    let vote: VoteResponse = response
        .json()
        .await
        .map_err(|e| ApiError::Upstream(format!("malformed vote response from {}: {}", identity, e)))?;

    if vote.task_id != task_id {
        return Err(ApiError::Upstream(format!(
            "listener for {} answered for task {}",
            identity, vote.task_id
        )));
    }

    Ok(Json(vote))
}
