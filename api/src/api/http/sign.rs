// ABOUTME: Signing endpoint: plain or vote-gated signing through the sign facade
// ABOUTME: Expected outcomes return 200 with a tagged result; infrastructure faults map to 4xx/5xx

use super::ApiError;
use crate::state::KeyvoteState;
use axum::{extract::State, http::HeaderMap, Json};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use keyvote_core::directory::DirectoryError;
use keyvote_signer::{SignError, SignRequest, SignResult};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SignBody {
    /// Base64 encoded message
    pub message: String,
    pub identity: String,
    #[serde(default)]
    pub enable_voting: bool,
    #[serde(default)]
    pub local_approval: Option<bool>,
    #[serde(default)]
    pub is_forwarded: bool,
}

impl From<SignError> for ApiError {
    fn from(e: SignError) -> Self {
        match e {
            SignError::Validation(e) => ApiError::BadRequest(e.to_string()),
            SignError::Directory(DirectoryError::NotFound(identity)) => {
                ApiError::BadRequest(format!("unknown identity {}", identity))
            }
            SignError::Directory(e) => ApiError::Upstream(e.to_string()),
            SignError::Signing(e) => ApiError::Upstream(e.to_string()),
        }
    }
}

/// Signs a message, optionally gated on a quorum vote.
///
/// `is_forwarded` and `local_approval` are taken at face value: a forwarded
/// request with local approval is signed on this instance's vote alone. This
/// endpoint must only be reachable through a trusted relay or an
/// authenticating layer that strips or verifies those fields.
pub async fn sign(
    State(state): State<Arc<KeyvoteState>>,
    headers: HeaderMap,
    Json(body): Json<SignBody>,
) -> Result<Json<SignResult>, ApiError> {
    let message = BASE64
        .decode(body.message.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("message is not valid base64: {}", e)))?;

    tracing::info!(
        "Sign request for {} (voting: {}, forwarded: {})",
        body.identity,
        body.enable_voting,
        body.is_forwarded
    );

    let result = state
        .facade
        .sign(SignRequest {
            message,
            identity: body.identity,
            enable_voting: body.enable_voting,
            local_approval: body.local_approval,
            is_forwarded: body.is_forwarded,
            headers,
        })
        .await?;

    Ok(Json(result))
}
