// tallybook-server - the daemon holding the transactions.
//
// Clients populate the shared ledger over /api/load, then read it back with
// /api/dump instead of re-parsing csvs for every query.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tallybook::config::{parse_window, Config};
use tallybook::ledger::Ledger;
use tallybook::server::{router, AppState, Login};

#[derive(Parser)]
#[command(
    name = "tallybook-server",
    version,
    about = "Serve a shared ledger over HTTP"
)]
struct Args {
    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long)]
    hostname: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Username clients must present
    #[arg(long)]
    username: Option<String>,

    /// Password clients must present
    #[arg(long)]
    password: Option<String>,

    /// Ledger-wide default currency
    #[arg(long)]
    primary_currency: Option<String>,

    /// Day range for duplicate detection; `off` disables
    #[arg(long, value_name = "DAYS")]
    duplicate_window: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(hostname) = args.hostname {
        config.hostname = hostname;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(username) = args.username {
        config.username = username;
    }
    if let Some(password) = args.password {
        config.password = password;
    }
    if let Some(currency) = args.primary_currency {
        config.primary_currency = currency;
    }
    if let Some(window) = args.duplicate_window {
        config.duplicate_window = parse_window(&window)?;
    }

    let ledger = Ledger::new(&config.primary_currency, config.duplicate_window);
    let state = AppState::new(
        ledger,
        Login {
            username: config.username.clone(),
            password: config.password.clone(),
        },
    );

    let addr = format!("{}:{}", config.hostname, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("could not bind {addr}"))?;

    info!(%addr, "tallybook-server listening");
    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
