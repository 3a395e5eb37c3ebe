// ABOUTME: Vote responder: answers peers' vote requests with the registered voting handler
// ABOUTME: Owns the swappable handler cell and the long-lived HTTP listener

use crate::transport::MSGPACK_CONTENT_TYPE;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use keyvote_core::types::{VoteRequest, VoteRequestWire, VoteResponse};
use keyvote_core::voting_handler::VotingHandler;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// Outcome of one inbound vote as seen by this responder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderReply {
    /// The handler ran without faulting
    pub success: bool,
    pub approved: bool,
    pub error: Option<String>,
}

struct ListenerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!(target: "keyvote_signer::responder", "Listener task on {} panicked: {}", self.addr, e);
        }
    }
}

/// Inbound side of the voting protocol, one per process.
///
/// With no handler registered every request is answered `approved: false`.
/// Fail-closed is the documented default, not an accident of a missing handler.
pub struct VoteResponder {
    handler: RwLock<Option<Arc<dyn VotingHandler>>>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl Default for VoteResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteResponder {
    pub fn new() -> Self {
        Self {
            handler: RwLock::new(None),
            listener: Mutex::new(None),
        }
    }

    pub fn with_handler(handler: Arc<dyn VotingHandler>) -> Self {
        Self {
            handler: RwLock::new(Some(handler)),
            listener: Mutex::new(None),
        }
    }

    /// Swaps the active handler. Requests already running keep the handler
    /// they started with; the previous handler is returned.
    pub async fn set_voting_handler(&self, handler: Arc<dyn VotingHandler>) -> Option<Arc<dyn VotingHandler>> {
        let previous = self.handler.write().await.replace(handler);
        tracing::info!(target: "keyvote_signer::responder", "Voting handler replaced");
        previous
    }

    pub async fn clear_voting_handler(&self) -> Option<Arc<dyn VotingHandler>> {
        self.handler.write().await.take()
    }

    pub async fn has_handler(&self) -> bool {
        self.handler.read().await.is_some()
    }

    pub async fn respond(&self, request: &VoteRequest) -> ResponderReply {
        // Snapshot so a concurrent swap cannot change the handler mid-request
        let handler = self.handler.read().await.clone();

        let Some(handler) = handler else {
            tracing::warn!(
                target: "keyvote_signer::responder",
                "No voting handler registered, rejecting task {}",
                request.task_id
            );
            return ResponderReply {
                success: true,
                approved: false,
                error: None,
            };
        };

        match handler.decide(request).await {
            Ok(approved) => {
                tracing::info!(
                    target: "keyvote_signer::responder",
                    "Task {} from {}: approved={}",
                    request.task_id,
                    request.originating_identity,
                    approved
                );
                ResponderReply {
                    success: true,
                    approved,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(
                    target: "keyvote_signer::responder",
                    "Voting handler failed for task {}: {}",
                    request.task_id,
                    e
                );
                ResponderReply {
                    success: false,
                    approved: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/vote", post(vote_msgpack))
            .route("/vote/json", post(vote_json))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    /// Starts listening on `addr` and returns the bound address.
    ///
    /// If a listener is already running, the new one is bound first and the old
    /// one is then shut down gracefully, so there is no window without a listener.
    pub async fn bind(self: &Arc<Self>, addr: SocketAddr) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = self.router();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await;
            if let Err(e) = result {
                tracing::error!(target: "keyvote_signer::responder", "Vote listener on {} failed: {}", local_addr, e);
            }
        });

        let previous = self.listener.lock().await.replace(ListenerHandle {
            addr: local_addr,
            shutdown: shutdown_tx,
            task,
        });

        tracing::info!(target: "keyvote_signer::responder", "Vote responder listening on {}", local_addr);

        if let Some(old) = previous {
            tracing::info!(target: "keyvote_signer::responder", "Retiring previous listener on {}", old.addr);
            old.stop().await;
        }

        Ok(local_addr)
    }

    /// Stops the listener. Outbound calls this process started as an initiator are unaffected.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            tracing::info!(target: "keyvote_signer::responder", "Shutting down vote listener on {}", handle.addr);
            handle.stop().await;
        }
    }

    pub async fn is_bound(&self) -> bool {
        self.listener.lock().await.is_some()
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().await.as_ref().map(|h| h.addr)
    }
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn vote_msgpack(State(responder): State<Arc<VoteResponder>>, body: Bytes) -> Response {
    let request: VoteRequest = match rmp_serde::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(target: "keyvote_signer::responder", "Malformed vote request: {}", e);
            return (StatusCode::BAD_REQUEST, format!("malformed vote request: {}", e)).into_response();
        }
    };

    let reply = responder.respond(&request).await;
    if !reply.success {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            reply.error.unwrap_or_else(|| "voting handler failed".to_string()),
        )
            .into_response();
    }

    let vote = VoteResponse {
        approved: reply.approved,
        task_id: request.task_id,
    };
    match rmp_serde::to_vec_named(&vote) {
        Ok(bytes) => ([(header::CONTENT_TYPE, MSGPACK_CONTENT_TYPE)], bytes).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn vote_json(State(responder): State<Arc<VoteResponder>>, Json(wire): Json<VoteRequestWire>) -> Response {
    let request = match VoteRequest::try_from(wire) {
        Ok(request) => request,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": e.to_string() }))).into_response();
        }
    };

    let reply = responder.respond(&request).await;
    if !reply.success {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": reply.error })),
        )
            .into_response();
    }

    Json(VoteResponse {
        approved: reply.approved,
        task_id: request.task_id,
    })
    .into_response()
}
