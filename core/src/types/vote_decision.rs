use serde::{Deserialize, Serialize};

/// One candidate's contribution to a voting round.
///
/// `success` says whether the call completed at all; `approved` is only
/// meaningful when it did. An unreachable candidate is `success: false`,
/// a candidate that answered "no" is `success: true, approved: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDecision {
    pub identity: String,
    pub success: bool,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VoteDecision {
    pub fn answered(identity: &str, approved: bool) -> Self {
        Self {
            identity: identity.to_string(),
            success: true,
            approved,
            error: None,
        }
    }

    pub fn failed(identity: &str, error: impl Into<String>) -> Self {
        Self {
            identity: identity.to_string(),
            success: false,
            approved: false,
            error: Some(error.into()),
        }
    }

    /// Counts toward the quorum
    pub fn is_approval(&self) -> bool {
        self.success && self.approved
    }
}
