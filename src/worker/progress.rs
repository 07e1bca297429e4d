//! Periodic progress reporting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::info;

use super::pool::SearchShared;

/// Logs the shared attempt counter every `interval` until told to stop.
///
/// Runs on its own thread and only ever reads the counter, so workers are
/// never slowed down by it.
pub(crate) struct ProgressReporter {
    shared: Arc<SearchShared>,
    interval: Duration,
    start_time: Instant,
    shutdown_rx: Receiver<()>,
}

impl ProgressReporter {
    pub(crate) fn new(
        shared: Arc<SearchShared>,
        interval: Duration,
        start_time: Instant,
        shutdown_rx: Receiver<()>,
    ) -> Self {
        Self {
            shared,
            interval,
            start_time,
            shutdown_rx,
        }
    }

    pub(crate) fn run(self) {
        let mut last_attempts = 0u64;
        let mut last_report = self.start_time;

        loop {
            match self.shutdown_rx.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) if !self.shared.is_stopped() => {}
                _ => break,
            }

            let attempts = self.shared.attempts();
            let now = Instant::now();
            let window = now.duration_since(last_report).as_secs_f64();
            let rate = if window > 0.0 {
                attempts.saturating_sub(last_attempts) as f64 / window
            } else {
                0.0
            };

            info!(
                elapsed_secs = self.start_time.elapsed().as_secs(),
                attempts = %format_number(attempts),
                rate = %format!("{}/s", format_number(rate as u64)),
                "Progress"
            );

            last_attempts = attempts;
            last_report = now;
        }
    }
}

/// Formats large counts with K/M/B suffixes.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
