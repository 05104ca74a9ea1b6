// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::test_support::logged_in_store;

const THROTTLE: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn detached_monitor_ignores_signals() {
    let store = logged_in_store(900);
    let monitor = ActivityMonitor::new(Arc::clone(&store), THROTTLE);
    tokio::time::advance(Duration::from_secs(10)).await;

    assert!(!monitor.signal(ActivitySignal::KeyDown));
    assert_eq!(monitor.time_since_last_activity(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn attached_monitor_touches_store() {
    let store = logged_in_store(900);
    let monitor = ActivityMonitor::new(Arc::clone(&store), THROTTLE);
    monitor.attach();
    tokio::time::advance(Duration::from_secs(10)).await;

    assert!(monitor.signal(ActivitySignal::PointerMove));
    assert_eq!(monitor.time_since_last_activity(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn signals_within_window_are_coalesced() {
    let store = logged_in_store(900);
    let monitor = ActivityMonitor::new(Arc::clone(&store), THROTTLE);
    monitor.attach();

    assert!(monitor.signal(ActivitySignal::Scroll));
    tokio::time::advance(Duration::from_millis(400)).await;
    assert!(!monitor.signal(ActivitySignal::Scroll));
    assert_eq!(monitor.time_since_last_activity(), Duration::from_millis(400));

    tokio::time::advance(Duration::from_millis(600)).await;
    assert!(monitor.signal(ActivitySignal::Scroll));
    assert_eq!(monitor.time_since_last_activity(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn reattach_resets_throttle() {
    let store = logged_in_store(900);
    let monitor = ActivityMonitor::new(Arc::clone(&store), THROTTLE);
    monitor.attach();
    assert!(monitor.signal(ActivitySignal::Click));

    monitor.detach();
    assert!(!monitor.is_attached());
    monitor.attach();
    assert!(monitor.signal(ActivitySignal::Click));
}

#[yare::parameterized(
    pointer_down = { ActivitySignal::PointerDown },
    pointer_move = { ActivitySignal::PointerMove },
    key_down = { ActivitySignal::KeyDown },
    scroll = { ActivitySignal::Scroll },
    touch_start = { ActivitySignal::TouchStart },
    click = { ActivitySignal::Click },
)]
fn every_signal_counts(kind: ActivitySignal) {
    let store = logged_in_store(900);
    let monitor = ActivityMonitor::new(store, THROTTLE);
    monitor.attach();
    assert!(monitor.signal(kind));
}
