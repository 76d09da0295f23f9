use std::process::ExitCode;

use clap::Parser;
use rtm::{ClientConfig, Error, LogSink, ResolveError, RtmConnectResolver, Session, Shutdown};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rtm", about = "Real-time messaging stream client")]
struct Cli {
    /// Bearer token exchanged for the websocket endpoint.
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(shutdown) => {
            tracing::info!(?shutdown, "rtm: done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "rtm: session failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Shutdown, Error> {
    let token = cli
        .token
        .filter(|token| !token.trim().is_empty())
        .ok_or(ResolveError::MissingCredential)?;
    let config = ClientConfig::from_env()?;
    let resolver = RtmConnectResolver::new(&config.api_base_url)?;

    let session = Session::new(config.session);
    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("rtm: interrupt");
            cancel.cancel();
        }
    });

    session.connect(&resolver, &token, LogSink).await
}
