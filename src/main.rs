use anyhow::Context;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env when present.
    let dotenv = dotenvy::dotenv().ok();

    ai_llm_service::telemetry::init("info", Level::INFO)
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;
    if let Some(path) = dotenv {
        info!("loaded environment from {}", path.display());
    }

    api::start().await.context("api server failed")?;

    Ok(())
}
