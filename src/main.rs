mod client_key;
mod config;
mod error;
mod handlers;
mod metrics;
mod model;
mod models;
mod rate_limit;
mod sanitize;
mod state;
mod store;

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;
use crate::model::AnthropicClient;
use crate::rate_limit::sweeper;
use crate::state::AppState;
use crate::store::StatsStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env first so clap's env fallbacks can see it
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dork_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let store = StatsStore::open(&args.db_path)?;
    let generator = AnthropicClient::new(
        &args.anthropic_base_url,
        args.anthropic_api_key.clone(),
        args.anthropic_model.clone(),
        args.model_timeout(),
    )?;
    if args.anthropic_api_key.is_none() {
        tracing::warn!("ANTHROPIC_API_KEY is not set, /generate will fail");
    }

    let state = Arc::new(AppState::new(&args, store, Arc::new(generator)));

    // spawn the background sweeper
    let limiters = state.limiters();
    let sweep_interval = Duration::from_secs(args.sweep_interval.max(1));
    tokio::spawn(async move {
        sweeper(limiters, sweep_interval).await;
    });

    let app = handlers::router(state.clone());

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Dork gateway running on http://{}", addr);
    tracing::info!("Stats database: {}", state.store.path().display());
    tracing::info!("Model: {} (timeout {}s)", args.anthropic_model, args.model_timeout);
    for limiter in state.limiters() {
        let policy = limiter.policy();
        tracing::info!(
            "Rate limit [{}]: {} requests per {} seconds",
            policy.purpose,
            policy.max_requests,
            policy.window.as_secs()
        );
    }

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
