// atelier-serve - HTTP API for outfit analysis

use atelier::orchestration::{AtelierConfig, Orchestrator};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve the outfit analysis API", long_about = None)]
struct Args {
    /// Config file (defaults to ./atelier.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides the config
    #[arg(short, long)]
    bind: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("atelier={},tower_http=info", log_level).into()),
        )
        .with(fmt::layer())
        .init();

    let config = AtelierConfig::load(args.config.as_deref())?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);

    tracing::info!(
        quick_vision = %config.models.quick.vision,
        deep_vision = %config.models.deep.vision,
        "Models configured"
    );
    atelier::server::serve(orchestrator, &bind).await?;
    Ok(())
}
