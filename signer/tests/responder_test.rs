// ABOUTME: Tests for the vote responder's handler cell and its HTTP listener
// ABOUTME: Covers fail-closed default, atomic handler swap, faults and listener rebinding

use async_trait::async_trait;
use keyvote_core::directory::VoteTarget;
use keyvote_core::types::VoteRequest;
use keyvote_core::voting_handler::{FnHandler, RejectAllHandler, VotingHandler, VotingHandlerError};
use keyvote_signer::transport::{NetworkTransport, TransportError, VoteTransport};
use keyvote_signer::VoteResponder;
use reqwest::header::HeaderMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

fn request() -> VoteRequest {
    VoteRequest::new(b"rotate".to_vec(), "org-a", 1, 2, false)
}

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

struct FaultyHandler;

#[async_trait]
impl VotingHandler for FaultyHandler {
    async fn decide(&self, _request: &VoteRequest) -> Result<bool, VotingHandlerError> {
        Err(VotingHandlerError::Failed("policy store offline".to_string()))
    }
}

/// Approves once released, so a test can hold a request in flight
struct GatedHandler {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    entered: Mutex<Option<oneshot::Sender<()>>>,
}

#[async_trait]
impl VotingHandler for GatedHandler {
    async fn decide(&self, _request: &VoteRequest) -> Result<bool, VotingHandlerError> {
        if let Some(entered) = self.entered.lock().await.take() {
            let _ = entered.send(());
        }
        let gate = self.gate.lock().await.take();
        if let Some(gate) = gate {
            gate.await.ok();
        }
        Ok(true)
    }
}

#[tokio::test]
async fn test_no_handler_fails_closed() {
    let responder = VoteResponder::new();

    let reply = responder.respond(&request()).await;

    assert!(reply.success);
    assert!(!reply.approved);
    assert!(!responder.has_handler().await);
}

#[tokio::test]
async fn test_handler_fault_is_not_a_rejection() {
    let responder = VoteResponder::with_handler(Arc::new(FaultyHandler));

    let reply = responder.respond(&request()).await;

    assert!(!reply.success);
    assert!(reply.error.unwrap().contains("policy store offline"));
}

#[tokio::test]
async fn test_swap_applies_to_later_requests() {
    let responder = VoteResponder::with_handler(Arc::new(FnHandler(|_: &VoteRequest| true)));
    assert!(responder.respond(&request()).await.approved);

    let previous = responder.set_voting_handler(Arc::new(RejectAllHandler)).await;

    assert!(previous.is_some());
    assert!(!responder.respond(&request()).await.approved);

    responder.clear_voting_handler().await;
    assert!(!responder.has_handler().await);
}

#[tokio::test]
async fn test_in_flight_request_keeps_its_handler() {
    let (release_tx, release_rx) = oneshot::channel();
    let (entered_tx, entered_rx) = oneshot::channel();
    let responder = Arc::new(VoteResponder::with_handler(Arc::new(GatedHandler {
        gate: Mutex::new(Some(release_rx)),
        entered: Mutex::new(Some(entered_tx)),
    })));

    let in_flight = {
        let responder = responder.clone();
        tokio::spawn(async move { responder.respond(&request()).await })
    };
    entered_rx.await.unwrap();

    responder.set_voting_handler(Arc::new(RejectAllHandler)).await;
    release_tx.send(()).unwrap();

    assert!(in_flight.await.unwrap().approved);
    assert!(!responder.respond(&request()).await.approved);
}

#[tokio::test]
async fn test_deterministic_handler_is_idempotent() {
    let responder = VoteResponder::with_handler(Arc::new(FnHandler(|req: &VoteRequest| req.message.len() % 2 == 0)));
    let req = request();

    let answers: Vec<bool> = futures::future::join_all((0..5).map(|_| responder.respond(&req)))
        .await
        .into_iter()
        .map(|reply| reply.approved)
        .collect();

    assert!(answers.iter().all(|a| *a == answers[0]));
}

#[tokio::test]
async fn test_direct_transport_against_listener() {
    // Arrange
    let responder = Arc::new(VoteResponder::with_handler(Arc::new(FnHandler(|req: &VoteRequest| {
        req.message == b"rotate"
    }))));
    let addr = responder.bind(loopback()).await.unwrap();
    let transport = NetworkTransport::from_client(reqwest::Client::new());
    let target = VoteTarget::Direct {
        endpoint: format!("http://{}", addr),
    };

    // Act
    let approve = transport.request_vote(&target, &request(), &HeaderMap::new()).await;
    let reject = transport
        .request_vote(
            &target,
            &VoteRequest::new(b"drain".to_vec(), "org-a", 1, 2, false),
            &HeaderMap::new(),
        )
        .await;

    // Assert
    assert!(approve.unwrap());
    assert!(!reject.unwrap());

    responder.shutdown().await;
}

#[tokio::test]
async fn test_handler_fault_surfaces_as_transport_error() {
    let responder = Arc::new(VoteResponder::with_handler(Arc::new(FaultyHandler)));
    let addr = responder.bind(loopback()).await.unwrap();
    let transport = NetworkTransport::from_client(reqwest::Client::new());

    let err = transport
        .request_vote(
            &VoteTarget::Direct {
                endpoint: format!("http://{}", addr),
            },
            &request(),
            &HeaderMap::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Status(500)));
    responder.shutdown().await;
}

#[tokio::test]
async fn test_json_endpoint_answers_wire_payload() {
    let responder = Arc::new(VoteResponder::with_handler(Arc::new(FnHandler(|_: &VoteRequest| true))));
    let addr = responder.bind(loopback()).await.unwrap();

    let response = reqwest::Client::new()
        .post(format!("http://{}/vote/json", addr))
        .json(&serde_json::json!({
            "task_id": "task-9",
            "message": "cm90YXRl",
            "required_votes": 1,
            "total_participants": 1,
            "app_id": "org-a",
            "is_forwarded": true
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "approved": true, "task_id": "task-9" }));

    responder.shutdown().await;
}

#[tokio::test]
async fn test_rebind_replaces_listener() {
    let responder = Arc::new(VoteResponder::with_handler(Arc::new(FnHandler(|_: &VoteRequest| true))));
    let first = responder.bind(loopback()).await.unwrap();

    let second = responder.bind(loopback()).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(responder.local_addr().await, Some(second));

    let client = reqwest::Client::new();
    let health = client.get(format!("http://{}/health", second)).send().await.unwrap();
    assert!(health.status().is_success());
    assert!(client.get(format!("http://{}/health", first)).send().await.is_err());

    responder.shutdown().await;
    assert!(!responder.is_bound().await);
}
