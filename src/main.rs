use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use switchboard::Config;
use switchboard::api::{ApiServer, ApiState};

/// Switchboard - bridges phone calls with a realtime voice AI
#[derive(Parser)]
#[command(name = "switchboard", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads env-backed arguments
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,switchboard=info",
        1 => "info,switchboard=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    let port = config.server.port;
    tracing::info!(
        port,
        model = %config.realtime.model,
        voice = %config.session.voice,
        schedule_url = ?config.persona.schedule_url,
        "starting switchboard"
    );

    let state = Arc::new(ApiState::from_config(config)?);
    ApiServer::new(state, port).run().await?;

    Ok(())
}
