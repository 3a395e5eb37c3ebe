// ABOUTME: Voting orchestrator: fans a vote out to every candidate, waits for all, applies M-of-N
// ABOUTME: Signs only when quorum is met; forwarded requests short-circuit to the local vote

use crate::responder::VoteResponder;
use crate::transport::VoteTransport;
use chrono::Utc;
use futures::future::join_all;
use keyvote_core::directory::{IdentityDirectory, VoteTarget};
use keyvote_core::signing::RemoteSigner;
use keyvote_core::types::quorum::validate_quorum;
use keyvote_core::types::{ValidationError, VoteDecision, VoteRequest, VotingOutcome, VotingResult};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Inbound context a round runs under
#[derive(Debug, Clone, Default)]
pub struct VoteContext {
    /// Set when this round was itself reached through a relay
    pub is_forwarded: bool,
    /// The initiator's own vote; when absent the local voting handler decides
    pub local_approval: Option<bool>,
    /// Caller headers the relayed transport copies onto forwarded calls
    pub headers: HeaderMap,
}

pub struct VotingOrchestrator {
    directory: Arc<dyn IdentityDirectory>,
    transport: Arc<dyn VoteTransport>,
    signer: Arc<dyn RemoteSigner>,
    responder: Arc<VoteResponder>,
    call_timeout: Duration,
}

impl VotingOrchestrator {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        transport: Arc<dyn VoteTransport>,
        signer: Arc<dyn RemoteSigner>,
        responder: Arc<VoteResponder>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            transport,
            signer,
            responder,
            call_timeout,
        }
    }

    /// Runs one voting round.
    ///
    /// Only pre-flight validation fails the call, before any I/O. Unresolvable
    /// candidates, unreachable peers and a failed signing call are all reported
    /// inside the returned outcome.
    pub async fn run_vote(
        &self,
        message: &[u8],
        initiating_identity: &str,
        candidates: &[String],
        required_votes: u32,
        context: &VoteContext,
    ) -> Result<VotingOutcome, ValidationError> {
        validate_quorum(candidates, required_votes)?;

        let request = VoteRequest::new(
            message.to_vec(),
            initiating_identity,
            required_votes,
            candidates.len() as u32,
            context.is_forwarded,
        );

        if request.is_forwarded {
            return Ok(self.run_forwarded(&request, initiating_identity, context).await);
        }

        info!(
            task_id = %request.task_id,
            initiator = %initiating_identity,
            candidates = candidates.len(),
            required_votes,
            "Starting voting round"
        );

        let mut resolution_failures = Vec::new();
        let mut ballots = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if candidate == initiating_identity {
                ballots.push(Ballot::Local(candidate.clone()));
                continue;
            }
            match self.resolve_target(candidate).await {
                Ok(target) => ballots.push(Ballot::Remote(candidate.clone(), target)),
                Err(error) => {
                    warn!(task_id = %request.task_id, candidate = %candidate, %error, "Candidate unresolvable");
                    resolution_failures.push(VoteDecision::failed(candidate, error));
                }
            }
        }

        // Join-all: every call finishes (or times out) before the tally
        let decisions = join_all(
            ballots
                .iter()
                .map(|ballot| self.cast(ballot, &request, context)),
        )
        .await;

        let successful_votes = decisions.iter().filter(|d| d.is_approval()).count() as u32;

        Ok(self
            .conclude(
                &request,
                initiating_identity,
                candidates.len() as u32,
                required_votes,
                successful_votes,
                decisions,
                resolution_failures,
            )
            .await)
    }

    /// Loop guard: a forwarded request never fans out again, only the local vote counts
    async fn run_forwarded(&self, request: &VoteRequest, initiating_identity: &str, context: &VoteContext) -> VotingOutcome {
        info!(
            task_id = %request.task_id,
            initiator = %initiating_identity,
            "Forwarded request, skipping fan-out"
        );

        let local = self
            .cast(&Ballot::Local(initiating_identity.to_string()), request, context)
            .await;
        let successful_votes = u32::from(local.is_approval());

        self.conclude(request, initiating_identity, 1, 1, successful_votes, vec![local], Vec::new())
            .await
    }

    async fn resolve_target(&self, candidate: &str) -> Result<VoteTarget, String> {
        let resolved = self
            .directory
            .resolve_identity(candidate)
            .await
            .map_err(|e| e.to_string())?;
        resolved.target().map_err(|e| e.to_string())
    }

    async fn cast(&self, ballot: &Ballot, request: &VoteRequest, context: &VoteContext) -> VoteDecision {
        match ballot {
            Ballot::Local(identity) => {
                if let Some(approved) = context.local_approval {
                    return VoteDecision::answered(identity, approved);
                }
                match tokio::time::timeout(self.call_timeout, self.responder.respond(request)).await {
                    Ok(reply) if reply.success => VoteDecision::answered(identity, reply.approved),
                    Ok(reply) => VoteDecision::failed(
                        identity,
                        reply.error.unwrap_or_else(|| "voting handler failed".to_string()),
                    ),
                    Err(_) => VoteDecision::failed(identity, "timed out"),
                }
            }
            Ballot::Remote(identity, target) => {
                let call = self.transport.request_vote(target, request, &context.headers);
                match tokio::time::timeout(self.call_timeout, call).await {
                    Ok(Ok(approved)) => {
                        debug!(task_id = %request.task_id, candidate = %identity, approved, "Vote received");
                        VoteDecision::answered(identity, approved)
                    }
                    Ok(Err(e)) => {
                        warn!(task_id = %request.task_id, candidate = %identity, error = %e, "Vote call failed");
                        VoteDecision::failed(identity, e.to_string())
                    }
                    Err(_) => {
                        warn!(task_id = %request.task_id, candidate = %identity, "Vote call timed out");
                        VoteDecision::failed(identity, "timed out")
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn conclude(
        &self,
        request: &VoteRequest,
        initiating_identity: &str,
        total_targets: u32,
        required_votes: u32,
        successful_votes: u32,
        decisions: Vec<VoteDecision>,
        resolution_failures: Vec<VoteDecision>,
    ) -> VotingOutcome {
        let mut outcome = VotingOutcome {
            task_id: request.task_id.clone(),
            total_targets,
            successful_votes,
            required_votes,
            complete: true,
            result: VotingResult::Rejected,
            decisions,
            resolution_failures,
            signature: None,
            signing_error: None,
            finished_at: Utc::now(),
        };

        if !outcome.quorum_met() {
            info!(
                task_id = %request.task_id,
                successful_votes,
                required_votes,
                "Quorum not reached"
            );
            return outcome;
        }

        match self.signer.remote_sign(&request.message, initiating_identity).await {
            Ok(signature) => {
                info!(task_id = %request.task_id, successful_votes, "Quorum reached, message signed");
                outcome.result = VotingResult::Approved;
                outcome.signature = Some(signature);
            }
            Err(e) => {
                warn!(task_id = %request.task_id, error = %e, "Quorum reached but signing failed");
                outcome.result = VotingResult::SignatureFailed;
                outcome.signing_error = Some(e.to_string());
            }
        }
        outcome.finished_at = Utc::now();
        outcome
    }
}

enum Ballot {
    Local(String),
    Remote(String, VoteTarget),
}
