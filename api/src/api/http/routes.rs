use super::{relay, sign};
use crate::state::KeyvoteState;
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Build routes with explicit state
pub fn routes(state: Arc<KeyvoteState>) -> Router {
    tracing::debug!("Building routes");

    let api_routes = Router::new()
        .route("/sign", post(sign::sign))
        .route("/relay/vote/:identity", post(relay::relay_vote))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
}
