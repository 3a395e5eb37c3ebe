// ABOUTME: Vote responder daemon for one identity, with an HTTP health endpoint
// ABOUTME: Answers peers' vote requests with the configured voting handler until shut down

use keyvote_core::config::{HandlerKind, VotingConfig};
use keyvote_core::voting_handler::{DelayedApprovalHandler, RejectAllHandler, VotingHandler};
use keyvote_signer::VoteResponder;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n\n================================================");
    println!("🗳️  Keyvote Responder Starting...");

    let config = VotingConfig::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let identity = config.require_local_identity()?.to_string();

    let handler: Arc<dyn VotingHandler> = match config.handler {
        HandlerKind::Approve => {
            tracing::warn!(
                target: "keyvote_signer::daemon",
                "Using the demo approve-after-delay handler ({:?})",
                config.handler_delay
            );
            Arc::new(DelayedApprovalHandler::new(config.handler_delay))
        }
        HandlerKind::Reject => Arc::new(RejectAllHandler),
    };

    let responder = Arc::new(VoteResponder::with_handler(handler));
    let addr = responder.bind(config.responder_bind).await?;

    println!("✔︎ Responder for {} listening on {}", identity, addr);
    println!("🤙 Keyvote responder ready");

    signal::ctrl_c().await?;

    println!("\n🛑 Received shutdown signal, cleaning up...");
    responder.shutdown().await;
    println!("✔︎ Responder shutdown complete");

    Ok(())
}
