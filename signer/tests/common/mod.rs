// ABOUTME: Shared fakes for orchestrator, facade and responder tests
// ABOUTME: Scripted transport, counting signer and a directory builder

#![allow(dead_code)]

use async_trait::async_trait;
use keyvote_core::directory::{ResolvedIdentity, StaticDirectory, VoteTarget};
use keyvote_core::signing::{RemoteSigner, SigningError};
use keyvote_core::types::{QuorumConfig, VoteRequest};
use keyvote_signer::transport::{TransportError, VoteTransport};
use keyvote_signer::{VoteResponder, VotingOrchestrator};
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CALL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum Peer {
    Approve,
    Reject,
    Fail,
    /// Never answers; only the per-call timeout ends it
    Hang,
    ApproveAfter(Duration),
}

/// Transport whose peers answer from a script keyed by identity
#[derive(Default)]
pub struct ScriptedTransport {
    script: HashMap<String, Peer>,
    pub calls: AtomicUsize,
    pub completed: AtomicUsize,
    pub seen: Mutex<Vec<VoteRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: &[(&str, Peer)]) -> Self {
        Self {
            script: script.iter().map(|(name, peer)| (name.to_string(), peer.clone())).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoteTransport for ScriptedTransport {
    async fn request_vote(
        &self,
        target: &VoteTarget,
        request: &VoteRequest,
        _headers: &HeaderMap,
    ) -> Result<bool, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.clone());

        let identity = match target {
            VoteTarget::Direct { endpoint } => endpoint.trim_start_matches("direct://").to_string(),
            VoteTarget::Relayed { identity, .. } => identity.clone(),
        };

        let result = match self.script.get(&identity).cloned().unwrap_or(Peer::Fail) {
            Peer::Approve => Ok(true),
            Peer::Reject => Ok(false),
            Peer::Fail => Err(TransportError::Connect("connection refused".to_string())),
            Peer::Hang => std::future::pending::<Result<bool, TransportError>>().await,
            Peer::ApproveAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(true)
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

#[derive(Default)]
pub struct CountingSigner {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingSigner {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSigner for CountingSigner {
    async fn remote_sign(&self, message: &[u8], identity: &str) -> Result<Vec<u8>, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SigningError::Rejected("custody node refused".to_string()));
        }
        let mut signature = identity.as_bytes().to_vec();
        signature.extend_from_slice(message);
        Ok(signature)
    }
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Directory where every listed identity is directly addressable as `direct://<name>`,
/// except those in `relayed`, which sit behind `https://proxy.example`
pub fn directory(identities: &[&str], relayed: &[&str], quorum: Option<(&str, QuorumConfig)>) -> StaticDirectory {
    StaticDirectory::new(identities.iter().map(|name| {
        let behind_proxy = relayed.contains(name);
        ResolvedIdentity {
            name: name.to_string(),
            address: behind_proxy.then(|| "https://proxy.example".to_string()),
            transport_address: (!behind_proxy).then(|| format!("direct://{}", name)),
            quorum: quorum
                .as_ref()
                .filter(|(owner, _)| owner == name)
                .map(|(_, config)| config.clone()),
        }
    }))
}

pub fn orchestrator(
    directory: StaticDirectory,
    transport: Arc<ScriptedTransport>,
    signer: Arc<CountingSigner>,
    responder: Arc<VoteResponder>,
) -> VotingOrchestrator {
    VotingOrchestrator::new(Arc::new(directory), transport, signer, responder, CALL_TIMEOUT)
}
