// ABOUTME: Result of one voting round, with the full per-candidate audit trail
// ABOUTME: A signature is only ever present when quorum was met and signing succeeded

use super::vote_decision::VoteDecision;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VotingResult {
    Approved,
    Rejected,
    SignatureFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VotingOutcome {
    pub task_id: String,
    /// Size of the original candidate set, unresolved candidates included
    pub total_targets: u32,
    pub successful_votes: u32,
    pub required_votes: u32,
    /// Every dispatched call finished before the tally was taken
    pub complete: bool,
    pub result: VotingResult,
    /// One entry per resolved candidate
    pub decisions: Vec<VoteDecision>,
    /// Candidates that could not be resolved, recorded as failed votes
    pub resolution_failures: Vec<VoteDecision>,
    #[serde(serialize_with = "serialize_signature")]
    pub signature: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl VotingOutcome {
    pub fn quorum_met(&self) -> bool {
        self.successful_votes >= self.required_votes
    }

    /// Every decision of the round, resolved or not
    pub fn all_decisions(&self) -> impl Iterator<Item = &VoteDecision> {
        self.decisions.iter().chain(self.resolution_failures.iter())
    }
}

fn serialize_signature<S: Serializer>(signature: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match signature {
        Some(bytes) => serializer.serialize_some(&BASE64.encode(bytes)),
        None => serializer.serialize_none(),
    }
}
