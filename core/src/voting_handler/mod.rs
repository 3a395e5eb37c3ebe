// ABOUTME: Pluggable vote decision strategy used by the vote responder
// ABOUTME: Ships closure, delayed-approval (demo) and reject-all (fail-closed) handlers

use crate::types::VoteRequest;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VotingHandlerError {
    #[error("Voting handler failed: {0}")]
    Failed(String),
}

/// Decides whether this identity approves a vote request.
///
/// Implementations may be invoked concurrently for distinct tasks and must
/// not start a voting round of their own.
#[async_trait]
pub trait VotingHandler: Send + Sync {
    async fn decide(&self, request: &VoteRequest) -> Result<bool, VotingHandlerError>;
}

/// Wraps a plain decision function
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> VotingHandler for FnHandler<F>
where
    F: Fn(&VoteRequest) -> bool + Send + Sync,
{
    async fn decide(&self, request: &VoteRequest) -> Result<bool, VotingHandlerError> {
        Ok((self.0)(request))
    }
}

/// Approves everything after a short delay. Demo and test use only.
pub struct DelayedApprovalHandler {
    delay: Duration,
}

impl DelayedApprovalHandler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl VotingHandler for DelayedApprovalHandler {
    async fn decide(&self, request: &VoteRequest) -> Result<bool, VotingHandlerError> {
        tracing::debug!(
            "Approving task {} for {} after {:?}",
            request.task_id,
            request.originating_identity,
            self.delay
        );
        tokio::time::sleep(self.delay).await;
        Ok(true)
    }
}

/// Rejects every request. This is what a responder answers with when no
/// handler has been registered.
pub struct RejectAllHandler;

#[async_trait]
impl VotingHandler for RejectAllHandler {
    async fn decide(&self, _request: &VoteRequest) -> Result<bool, VotingHandlerError> {
        Ok(false)
    }
}
