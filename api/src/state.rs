use keyvote_core::directory::IdentityDirectory;
use keyvote_signer::{SignFacade, VoteResponder};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Keyvote state not initialized")]
    NotInitialized,
}

pub struct KeyvoteState {
    pub facade: Arc<SignFacade>,
    pub directory: Arc<dyn IdentityDirectory>,
    /// This instance's own responder, answering peers' votes
    pub responder: Arc<VoteResponder>,
    /// Client the relay forwards vote requests with
    pub client: reqwest::Client,
    pub relay_forward_headers: Vec<String>,
    pub call_timeout: Duration,
}

pub static KEYVOTE_STATE: OnceCell<Arc<KeyvoteState>> = OnceCell::new();

pub fn get_keyvote_state() -> Result<&'static Arc<KeyvoteState>, StateError> {
    KEYVOTE_STATE.get().ok_or(StateError::NotInitialized)
}
