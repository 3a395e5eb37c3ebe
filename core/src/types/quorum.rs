// ABOUTME: M-of-N quorum configuration for a signing identity
// ABOUTME: Validates thresholds and candidate sets before any vote is dispatched

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Candidate set is empty")]
    NoCandidates,
    #[error("Required votes must be at least 1")]
    ZeroRequiredVotes,
    #[error("Required votes ({required}) exceed candidate count ({candidates})")]
    ThresholdTooHigh { required: u32, candidates: usize },
    #[error("Candidate {0} appears more than once")]
    DuplicateCandidate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumConfig {
    pub candidates: Vec<String>,
    pub required_votes: u32,
}

impl QuorumConfig {
    pub fn new(candidates: Vec<String>, required_votes: u32) -> Self {
        Self {
            candidates,
            required_votes,
        }
    }

    pub fn total_participants(&self) -> u32 {
        self.candidates.len() as u32
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_quorum(&self.candidates, self.required_votes)
    }
}

/// Checks `1 <= required_votes <= |candidates|` over a non-empty, duplicate-free set
pub fn validate_quorum(candidates: &[String], required_votes: u32) -> Result<(), ValidationError> {
    if candidates.is_empty() {
        return Err(ValidationError::NoCandidates);
    }
    if required_votes == 0 {
        return Err(ValidationError::ZeroRequiredVotes);
    }
    if required_votes as usize > candidates.len() {
        return Err(ValidationError::ThresholdTooHigh {
            required: required_votes,
            candidates: candidates.len(),
        });
    }

    let mut seen = std::collections::HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        if !seen.insert(candidate.as_str()) {
            return Err(ValidationError::DuplicateCandidate(candidate.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_thresholds() {
        let candidates = names(&["a", "b", "c"]);
        for required in 1..=3 {
            assert!(validate_quorum(&candidates, required).is_ok());
        }
    }

    #[test]
    fn test_rejects_empty_and_out_of_range() {
        assert_eq!(validate_quorum(&[], 1), Err(ValidationError::NoCandidates));
        assert_eq!(
            validate_quorum(&names(&["a"]), 0),
            Err(ValidationError::ZeroRequiredVotes)
        );
        assert_eq!(
            validate_quorum(&names(&["a", "b"]), 3),
            Err(ValidationError::ThresholdTooHigh {
                required: 3,
                candidates: 2
            })
        );
    }

    #[test]
    fn test_rejects_duplicates() {
        let config = QuorumConfig::new(names(&["a", "b", "a"]), 2);
        assert_eq!(
            config.validate(),
            Err(ValidationError::DuplicateCandidate("a".to_string()))
        );
    }
}
