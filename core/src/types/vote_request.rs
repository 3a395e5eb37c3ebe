// ABOUTME: Vote request passed from an orchestrator to every candidate's responder
// ABOUTME: Includes the JSON wire payload (base64 message) and the vote response

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("Invalid base64 message: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A single voting round's request, shared by every candidate of that round.
///
/// Requests are never mutated once built. Relaying produces a copy with
/// `is_forwarded` set (see [`VoteRequest::forwarded`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub task_id: String,
    #[serde(with = "serde_bytes")]
    pub message: Vec<u8>,
    pub required_votes: u32,
    pub total_participants: u32,
    pub originating_identity: String,
    pub is_forwarded: bool,
}

impl VoteRequest {
    pub fn new(
        message: Vec<u8>,
        originating_identity: &str,
        required_votes: u32,
        total_participants: u32,
        is_forwarded: bool,
    ) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            message,
            required_votes,
            total_participants,
            originating_identity: originating_identity.to_string(),
            is_forwarded,
        }
    }

    /// Copy of this request marked as relayed
    pub fn forwarded(&self) -> Self {
        Self {
            is_forwarded: true,
            ..self.clone()
        }
    }
}

/// JSON payload used by the relay and the HTTP voting endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequestWire {
    pub task_id: String,
    /// Base64 (standard alphabet) encoded message
    pub message: String,
    pub required_votes: u32,
    pub total_participants: u32,
    pub app_id: String,
    pub is_forwarded: bool,
}

impl From<&VoteRequest> for VoteRequestWire {
    fn from(request: &VoteRequest) -> Self {
        Self {
            task_id: request.task_id.clone(),
            message: BASE64.encode(&request.message),
            required_votes: request.required_votes,
            total_participants: request.total_participants,
            app_id: request.originating_identity.clone(),
            is_forwarded: request.is_forwarded,
        }
    }
}

impl TryFrom<VoteRequestWire> for VoteRequest {
    type Error = WireError;

    fn try_from(wire: VoteRequestWire) -> Result<Self, Self::Error> {
        Ok(Self {
            task_id: wire.task_id,
            message: BASE64.decode(wire.message.as_bytes())?,
            required_votes: wire.required_votes,
            total_participants: wire.total_participants,
            originating_identity: wire.app_id,
            is_forwarded: wire.is_forwarded,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub approved: bool,
    pub task_id: String,
}
