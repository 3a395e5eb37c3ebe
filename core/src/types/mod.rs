pub mod outcome;
pub mod quorum;
pub mod vote_decision;
pub mod vote_request;

pub use outcome::{VotingOutcome, VotingResult};
pub use quorum::{QuorumConfig, ValidationError};
pub use vote_decision::VoteDecision;
pub use vote_request::{VoteRequest, VoteRequestWire, VoteResponse, WireError};
