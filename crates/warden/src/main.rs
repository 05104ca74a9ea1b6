// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use warden::{ClientConfig, LoginArgs};

/// Interactive client for the dashboard API session.
#[derive(Debug, Parser)]
#[command(name = "warden", version)]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    /// Sign in with this email. Without it the persisted session is reused.
    #[arg(long, env = "WARDEN_EMAIL", requires = "password")]
    email: Option<String>,

    #[arg(long, env = "WARDEN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let login = match (cli.email, cli.password) {
        (Some(email), Some(password)) => Some(LoginArgs { email, password }),
        _ => None,
    };

    if let Err(e) = warden::run(cli.config, login).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
