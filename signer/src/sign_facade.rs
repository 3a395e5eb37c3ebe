// ABOUTME: Single signing entry point covering plain and vote-gated signing
// ABOUTME: Expected outcomes come back as a SignResult; only infrastructure faults are errors

use crate::orchestrator::{VoteContext, VotingOrchestrator};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use keyvote_core::directory::{DirectoryError, IdentityDirectory};
use keyvote_core::signing::{RemoteSigner, SigningError};
use keyvote_core::types::{ValidationError, VotingOutcome, VotingResult};
use reqwest::header::HeaderMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),
}

#[derive(Debug, Clone, Default)]
pub struct SignRequest {
    pub message: Vec<u8>,
    pub identity: String,
    pub enable_voting: bool,
    pub local_approval: Option<bool>,
    pub is_forwarded: bool,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignResult {
    Signed {
        #[serde(serialize_with = "as_base64")]
        signature: Vec<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<VotingOutcome>,
    },
    QuorumNotReached {
        outcome: VotingOutcome,
    },
    SignatureFailed {
        error: String,
        outcome: VotingOutcome,
    },
}

impl SignResult {
    pub fn signature(&self) -> Option<&[u8]> {
        match self {
            SignResult::Signed { signature, .. } => Some(signature),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&VotingOutcome> {
        match self {
            SignResult::Signed { outcome, .. } => outcome.as_ref(),
            SignResult::QuorumNotReached { outcome } | SignResult::SignatureFailed { outcome, .. } => Some(outcome),
        }
    }

    fn from_outcome(outcome: VotingOutcome) -> Self {
        match outcome.result {
            VotingResult::Approved => match outcome.signature.clone() {
                Some(signature) => SignResult::Signed {
                    signature,
                    outcome: Some(outcome),
                },
                None => SignResult::SignatureFailed {
                    error: "approved outcome carried no signature".to_string(),
                    outcome,
                },
            },
            VotingResult::Rejected => SignResult::QuorumNotReached { outcome },
            VotingResult::SignatureFailed => SignResult::SignatureFailed {
                error: outcome
                    .signing_error
                    .clone()
                    .unwrap_or_else(|| "signing failed".to_string()),
                outcome,
            },
        }
    }
}

fn as_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(bytes))
}

pub struct SignFacade {
    orchestrator: Arc<VotingOrchestrator>,
    directory: Arc<dyn IdentityDirectory>,
    signer: Arc<dyn RemoteSigner>,
}

impl SignFacade {
    pub fn new(
        orchestrator: Arc<VotingOrchestrator>,
        directory: Arc<dyn IdentityDirectory>,
        signer: Arc<dyn RemoteSigner>,
    ) -> Self {
        Self {
            orchestrator,
            directory,
            signer,
        }
    }

    pub async fn sign(&self, request: SignRequest) -> Result<SignResult, SignError> {
        if !request.enable_voting {
            tracing::debug!("Plain signing for {}", request.identity);
            let signature = self.signer.remote_sign(&request.message, &request.identity).await?;
            return Ok(SignResult::Signed {
                signature,
                outcome: None,
            });
        }

        let quorum = self.directory.lookup_quorum_config(&request.identity).await?;
        let context = VoteContext {
            is_forwarded: request.is_forwarded,
            local_approval: request.local_approval,
            headers: request.headers,
        };

        let outcome = self
            .orchestrator
            .run_vote(
                &request.message,
                &request.identity,
                &quorum.candidates,
                quorum.required_votes,
                &context,
            )
            .await?;

        Ok(SignResult::from_outcome(outcome))
    }
}
