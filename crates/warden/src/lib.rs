// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Warden: client-side session and credential lifecycle for the dashboard
//! API. Stores the signed-in identity, renews its bearer credential, and
//! ends the session on inactivity or expiry.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod guard;
pub mod session;
pub mod shell;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
pub mod test_support;

use std::sync::{Arc, Once};

pub use client::SessionClient;
pub use config::ClientConfig;
pub use error::{RefreshError, SessionError};
pub use events::{SessionEvent, SessionEvents, TerminationReason};

static CRYPTO: Once = Once::new();

/// Install the ring TLS provider for rustls. Safe to call repeatedly.
pub fn ensure_crypto() {
    CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Credentials supplied on the command line.
pub struct LoginArgs {
    pub email: String,
    pub password: String,
}

/// Run the interactive session shell until `quit` or EOF.
pub async fn run(config: ClientConfig, login: Option<LoginArgs>) -> anyhow::Result<()> {
    let client = Arc::new(SessionClient::open(config)?);
    client.start();

    match login {
        Some(args) => {
            let identity = client.login(&args.email, &args.password).await?;
            tracing::info!(user = %identity.name, "signed in");
        }
        None if client.is_authenticated() => {
            tracing::info!("resuming persisted session");
        }
        None => anyhow::bail!("no persisted session; pass --email and --password"),
    }

    let result = shell::run(Arc::clone(&client)).await;
    client.shutdown();
    result
}
