// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Epoch clock anchored on the tokio monotonic clock.
//!
//! Expiry and activity instants are persisted as epoch milliseconds, but all
//! arithmetic on them must agree with tokio timers (including the paused
//! clock used by tests). The anchor pairs one wall-clock reading with one
//! `tokio::time::Instant` and derives every later reading from the latter.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct EpochClock {
    anchor_ms: u64,
    anchor: Instant,
}

impl EpochClock {
    pub fn new() -> Self {
        Self { anchor_ms: system_epoch_ms(), anchor: Instant::now() }
    }

    /// Current time as epoch milliseconds.
    pub fn now_ms(&self) -> u64 {
        let elapsed = Instant::now().saturating_duration_since(self.anchor);
        self.anchor_ms.saturating_add(elapsed.as_millis() as u64)
    }
}

impl Default for EpochClock {
    fn default() -> Self {
        Self::new()
    }
}

fn system_epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}
