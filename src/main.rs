use anyhow::Context;
use factcheck_agent::agent::{Agent, AgentOptions};
use factcheck_agent::config::{Config, LogFormat};
use factcheck_agent::llm_client::LlmClient;
use factcheck_agent::search::SearchClient;
use factcheck_agent::server::build_router;
use factcheck_agent::tool_registry::ToolRegistry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the real environment still applies.
    let _ = dotenvy::dotenv();
    let config = Config::from_env().context("invalid configuration")?;

    init_tracing(config.log_format);
    tracing::debug!(?config, "loaded configuration");
    for key in config.missing_keys() {
        tracing::warn!(key, "API key not set; upstream calls will fail authentication");
    }

    let llm = LlmClient::new(&config).context("failed to build completions client")?;
    let search = SearchClient::new(&config).context("failed to build search client")?;
    let agent = Agent::new(
        Arc::new(llm),
        Arc::new(search),
        ToolRegistry::new(),
        AgentOptions::default(),
    );

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, model = %config.model, "listening");

    axum::serve(listener, build_router(agent))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().pretty().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
