// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented command shell over a [`SessionClient`].

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::client::SessionClient;
use crate::supervisor::ActivitySignal;
use crate::transport::ApiRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Get { path: String },
    Post { path: String, body: Option<serde_json::Value> },
    Activity,
    Whoami,
    Route { path: String },
    Logout,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match verb {
            "get" => Ok(Self::Get { path: api_path(rest)? }),
            "post" => {
                let (path, body) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let body = match body.trim() {
                    "" => None,
                    raw => Some(serde_json::from_str(raw).map_err(|e| format!("invalid JSON body: {e}"))?),
                };
                Ok(Self::Post { path: api_path(path)?, body })
            }
            "activity" => Ok(Self::Activity),
            "whoami" => Ok(Self::Whoami),
            "route" => Ok(Self::Route { path: api_path(rest)? }),
            "logout" => Ok(Self::Logout),
            "quit" | "exit" => Ok(Self::Quit),
            "" => Err("empty command".to_owned()),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

fn api_path(raw: &str) -> Result<String, String> {
    if raw.starts_with('/') {
        Ok(raw.to_owned())
    } else {
        Err(format!("expected a path starting with '/', got {raw:?}"))
    }
}

/// Read commands from stdin and print results until `quit`, EOF or ctrl-c.
pub async fn run(client: Arc<SessionClient>) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let printer = spawn_event_printer(&client, shutdown.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("error: {e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        execute(&client, command).await;
    }

    shutdown.cancel();
    let _ = printer.await;
    Ok(())
}

async fn execute(client: &SessionClient, command: Command) {
    match command {
        Command::Get { path } => print_response(client, ApiRequest::get(path)).await,
        Command::Post { path, body } => {
            let mut request = ApiRequest::post(path);
            request.body = body;
            print_response(client, request).await;
        }
        Command::Activity => {
            if !client.activity().signal(ActivitySignal::KeyDown) {
                eprintln!("activity not recorded");
            }
        }
        Command::Whoami => match client.current_identity() {
            Some(identity) => match serde_json::to_string_pretty(&identity) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("error: {e}"),
            },
            None => println!("not authenticated"),
        },
        Command::Route { path } => {
            let decision = client.route(&path);
            match decision.target() {
                Some(target) => println!("{decision:?} -> {target}"),
                None => println!("{decision:?}"),
            }
        }
        Command::Logout => {
            if !client.logout() {
                println!("not authenticated");
            }
        }
        Command::Quit => {}
    }
}

async fn print_response(client: &SessionClient, request: ApiRequest) {
    match client.dispatcher().send(request).await {
        Ok(resp) => println!("{} {}", resp.status.as_u16(), resp.body),
        Err(e) => eprintln!("error [{}]: {e}", e.as_str()),
    }
}

fn spawn_event_printer(
    client: &SessionClient,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut rx = client.subscribe();
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => event,
            };
            match event {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => println!("event: {json}"),
                    Err(e) => tracing::warn!(err = %e, "failed to encode event"),
                },
                Err(RecvError::Lagged(n)) => tracing::debug!(skipped = n, "event printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
