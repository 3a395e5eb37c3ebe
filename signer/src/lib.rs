// ABOUTME: Library interface for quorum-gated signing: orchestrator, transports and responder
// ABOUTME: Used by the responder daemon binary, the API gateway and tests

pub mod orchestrator;
pub mod remote_signer;
pub mod responder;
pub mod sign_facade;
pub mod transport;

// Re-export main types for convenience
pub use orchestrator::{VoteContext, VotingOrchestrator};
pub use remote_signer::HttpRemoteSigner;
pub use responder::{ResponderReply, VoteResponder};
pub use sign_facade::{SignError, SignFacade, SignRequest, SignResult};
pub use transport::{NetworkTransport, TransportError, VoteTransport};
