use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accesshealth_api::router::create_router;
use shared_config::AppConfig;
use shared_events::{BroadcastPublisher, EventPublisher, FanoutPublisher, WebhookPublisher};
use shared_storage::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AccessHealth API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    let store = Arc::new(MemoryStore::new());
    let events = build_publisher(&config);

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = create_router(config.clone(), store, events)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind {}", addr))?;
    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}

/// Transition events always feed the in-process broadcast channel; when a
/// webhook endpoint is configured they are forwarded there as well.
fn build_publisher(config: &AppConfig) -> Arc<dyn EventPublisher> {
    let broadcast = Arc::new(BroadcastPublisher::new(64));
    match &config.event_webhook_url {
        Some(url) => {
            info!("Forwarding transition events to {}", url);
            Arc::new(FanoutPublisher::new(vec![
                broadcast,
                Arc::new(WebhookPublisher::new(url.clone())),
            ]))
        }
        None => broadcast,
    }
}
