use keyvote_api::api::http::routes::routes;
use keyvote_api::state::{get_keyvote_state, KeyvoteState, KEYVOTE_STATE};
use keyvote_core::config::{HandlerKind, VotingConfig};
use keyvote_core::directory::{IdentityDirectory, StaticDirectory};
use keyvote_core::signing::RemoteSigner;
use keyvote_core::voting_handler::{DelayedApprovalHandler, RejectAllHandler, VotingHandler};
use keyvote_signer::{HttpRemoteSigner, NetworkTransport, SignFacade, VoteResponder, VotingOrchestrator};
use std::env;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n\n================================================");
    println!("🔑 Keyvote API Starting...");

    let config = VotingConfig::from_env()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let is_production = env::var("RUST_ENV").unwrap_or_default() == "production";

    if is_production {
        // JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init();
        eprintln!("✔︎ Structured JSON logging enabled (production mode)");
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        println!("✔︎ Human-readable logging enabled (development mode)");
    }

    let identity = config.require_local_identity()?.to_string();
    let directory: Arc<dyn IdentityDirectory> = Arc::new(StaticDirectory::load(&config.directory_path).await?);
    println!("✔︎ Identity directory loaded from {}", config.directory_path.display());

    let client = reqwest::Client::builder().build()?;
    let signer: Arc<dyn RemoteSigner> =
        Arc::new(HttpRemoteSigner::new(client.clone(), config.require_remote_signer_url()?));

    let handler: Arc<dyn VotingHandler> = match config.handler {
        HandlerKind::Approve => Arc::new(DelayedApprovalHandler::new(config.handler_delay)),
        HandlerKind::Reject => Arc::new(RejectAllHandler),
    };
    let responder = Arc::new(VoteResponder::with_handler(handler));
    let responder_addr = responder.bind(config.responder_bind).await?;
    println!("✔︎ Vote responder for {} listening on {}", identity, responder_addr);

    let orchestrator = Arc::new(VotingOrchestrator::new(
        directory.clone(),
        Arc::new(NetworkTransport::from_client(client.clone())),
        signer.clone(),
        responder.clone(),
        config.call_timeout,
    ));

    let state = Arc::new(KeyvoteState {
        facade: Arc::new(SignFacade::new(orchestrator, directory.clone(), signer)),
        directory,
        responder,
        client,
        relay_forward_headers: config.relay_forward_headers.clone(),
        call_timeout: config.call_timeout,
    });

    KEYVOTE_STATE
        .set(state.clone())
        .map_err(|_| "Failed to set KeyvoteState")?;

    // Setup shutdown signal handler
    tokio::spawn(async {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n\n================================================");
                println!("🫡 Shutdown signal received, cleaning up...");
                if let Ok(state) = get_keyvote_state() {
                    state.responder.shutdown().await;
                }
                println!("✔︎ Vote responder closed");
                println!("================================================");
                std::process::exit(0);
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                std::process::exit(1);
            }
        }
    });

    let app = routes(state);

    let listener = tokio::net::TcpListener::bind(config.api_bind).await?;
    println!("✔︎ API listening on {}", listener.local_addr()?);
    println!("🤙 Keyvote API ready!");
    println!("================================================");

    axum::serve(listener, app).await?;

    Ok(())
}
