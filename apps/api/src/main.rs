mod config;
mod errors;
mod llm_client;
mod review;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::errors::panic_response;
use crate::llm_client::{Provider, ProviderRegistry};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume reviewer v{}", env!("CARGO_PKG_VERSION"));

    // Missing credentials only disable a provider; they are reported, not fatal.
    let providers = ProviderRegistry::from_config(&config)?;
    let configured = providers.status().iter().filter(|p| p.configured).count();
    info!("{configured} of {} providers configured", Provider::ALL.len());

    info!(
        "Sessions expire after {} idle minutes; minimum resume length {} words",
        config.session_idle_minutes, config.min_resume_words
    );

    let state = AppState::new(config.clone(), providers);

    let app = build_router(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the dashboard has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
