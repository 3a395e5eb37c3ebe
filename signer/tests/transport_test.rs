// ABOUTME: Tests for the relayed vote transport against a capturing relay on loopback
// ABOUTME: Verifies the forwarded flag, the JSON payload and header copying

use axum::{
    extract::{Path, State},
    http::HeaderMap as AxumHeaderMap,
    routing::post,
    Json, Router,
};
use keyvote_core::directory::VoteTarget;
use keyvote_core::types::{VoteRequest, VoteRequestWire, VoteResponse};
use keyvote_signer::transport::{NetworkTransport, TransportError, VoteTransport};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
struct Captured {
    identity: Option<String>,
    headers: Option<AxumHeaderMap>,
    body: Option<VoteRequestWire>,
}

async fn capture(
    State(captured): State<Arc<Mutex<Captured>>>,
    Path(identity): Path<String>,
    headers: AxumHeaderMap,
    Json(body): Json<VoteRequestWire>,
) -> Json<VoteResponse> {
    let task_id = body.task_id.clone();
    let mut slot = captured.lock().unwrap();
    slot.identity = Some(identity);
    slot.headers = Some(headers);
    slot.body = Some(body);
    Json(VoteResponse { approved: true, task_id })
}

async fn spawn_relay(captured: Arc<Mutex<Captured>>) -> String {
    let app = Router::new()
        .route("/api/relay/vote/:identity", post(capture))
        .with_state(captured);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_relayed_transport_marks_forwarded_and_copies_headers() {
    // Arrange
    let captured = Arc::new(Mutex::new(Captured::default()));
    let relay_url = spawn_relay(captured.clone()).await;
    let transport = NetworkTransport::from_client(reqwest::Client::new());
    let request = VoteRequest::new(b"rotate".to_vec(), "org-a", 2, 3, false);

    let mut caller_headers = HeaderMap::new();
    caller_headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer org-a-token"));
    caller_headers.insert("x-request-id", HeaderValue::from_static("req-42"));

    // Act
    let approved = transport
        .request_vote(
            &VoteTarget::Relayed {
                relay_url,
                identity: "org-b".to_string(),
            },
            &request,
            &caller_headers,
        )
        .await
        .unwrap();

    // Assert
    assert!(approved);
    assert!(!request.is_forwarded);

    let captured = captured.lock().unwrap();
    assert_eq!(captured.identity.as_deref(), Some("org-b"));

    let body = captured.body.as_ref().unwrap();
    assert!(body.is_forwarded);
    assert_eq!(body.message, "cm90YXRl");
    assert_eq!(body.app_id, "org-a");
    assert_eq!(body.task_id, request.task_id);

    let headers = captured.headers.as_ref().unwrap();
    assert_eq!(headers.get("authorization").unwrap(), "Bearer org-a-token");
    assert_eq!(headers.get("x-request-id").unwrap(), "req-42");
}

#[tokio::test]
async fn test_relayed_transport_keeps_identity_names_intact() {
    for identity in ["ops team/eu", "org#1", "a?b"] {
        // Arrange
        let captured = Arc::new(Mutex::new(Captured::default()));
        let relay_url = spawn_relay(captured.clone()).await;
        let transport = NetworkTransport::from_client(reqwest::Client::new());
        let request = VoteRequest::new(b"rotate".to_vec(), "org-a", 1, 1, false);

        // Act
        let approved = transport
            .request_vote(
                &VoteTarget::Relayed {
                    relay_url,
                    identity: identity.to_string(),
                },
                &request,
                &HeaderMap::new(),
            )
            .await
            .unwrap();

        // Assert: the relay resolved exactly the candidate that was asked
        assert!(approved);
        assert_eq!(captured.lock().unwrap().identity.as_deref(), Some(identity));
    }
}

#[tokio::test]
async fn test_relayed_transport_rejects_invalid_relay_url() {
    let transport = NetworkTransport::from_client(reqwest::Client::new());
    let err = transport
        .request_vote(
            &VoteTarget::Relayed {
                relay_url: "proxy without scheme".to_string(),
                identity: "org-b".to_string(),
            },
            &VoteRequest::new(b"m".to_vec(), "org-a", 1, 1, false),
            &HeaderMap::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Encode(_)));
}

#[tokio::test]
async fn test_unreachable_peer_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = NetworkTransport::from_client(reqwest::Client::new());
    let err = transport
        .request_vote(
            &VoteTarget::Direct {
                endpoint: format!("http://{}", addr),
            },
            &VoteRequest::new(b"m".to_vec(), "org-a", 1, 1, false),
            &HeaderMap::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Connect(_)));
}
