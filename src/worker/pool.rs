//! Search coordination: worker pool, stop signal, budget and winner hand-off.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use serde::{Serialize, Serializer};
use tracing::{debug, error, info};

use crate::config::SearchConfig;
use crate::crypto::{CandidateSource, KeyError, KeyGenerator};
use crate::matcher::MatchPolicy;

use super::cpu::CpuWorker;
use super::progress::ProgressReporter;

/// The single match a search run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// The address with 0x prefix (checksummed when configured)
    pub address: String,
    /// The private key (hex encoded, no 0x prefix)
    pub private_key: String,
    /// Shared attempt counter value when the match was found
    pub attempts: u64,
    /// Lower is rarer; see [`crate::scoring`]
    #[serde(serialize_with = "four_decimals")]
    pub rarity_score: f64,
    /// Why the candidate was accepted
    pub pattern_matched: String,
    /// Every structural rule the address satisfies
    pub structural_rules: Vec<String>,
    /// The ID of the worker that found this result
    pub worker_id: usize,
}

fn four_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 10_000.0).round() / 10_000.0)
}

/// Coordinator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Running,
    Found,
    Draining,
    Exhausted,
    Interrupted,
    Terminated,
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(MatchResult),
    /// The attempt budget ran out without a match
    Exhausted,
    /// Stopped from outside (Ctrl-C) before a match
    Interrupted,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchStats {
    pub attempts: u64,
    pub elapsed: Duration,
    pub workers: usize,
    pub failed_workers: usize,
}

impl SearchStats {
    /// Returns the generation rate (keys per second).
    pub fn keys_per_second(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            self.attempts as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Outcome plus statistics of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub stats: SearchStats,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search was already started")]
    AlreadyStarted,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),

    #[error("all {workers} workers failed, last error: {last}")]
    AllWorkersFailed { workers: usize, last: KeyError },
}

const RUNNING: u8 = 0;
const FOUND: u8 = 1;
const EXHAUSTED: u8 = 2;
const INTERRUPTED: u8 = 3;

/// State shared by the coordinator, its workers and any [`StopHandle`].
///
/// `reason` doubles as the stop signal: anything other than `RUNNING` means
/// stop. It only ever leaves `RUNNING` once.
#[derive(Debug)]
pub(crate) struct SearchShared {
    reason: AtomicU8,
    attempts: AtomicU64,
    reserved: AtomicU64,
    winner: Mutex<Option<MatchResult>>,
}

impl SearchShared {
    pub(crate) fn new() -> Self {
        Self {
            reason: AtomicU8::new(RUNNING),
            attempts: AtomicU64::new(0),
            reserved: AtomicU64::new(0),
            winner: Mutex::new(None),
        }
    }

    #[inline]
    pub(crate) fn is_stopped(&self) -> bool {
        self.reason.load(Ordering::Acquire) != RUNNING
    }

    fn stop_with(&self, reason: u8) -> bool {
        self.reason
            .compare_exchange(RUNNING, reason, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Operator stop; never overrides an earlier reason.
    pub(crate) fn interrupt(&self) -> bool {
        self.stop_with(INTERRUPTED)
    }

    /// Claims up to `step` attempts from the budget; `None` once it is spent.
    pub(crate) fn reserve(&self, step: u64, max_attempts: u64) -> Option<u64> {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |reserved| {
                (reserved < max_attempts).then(|| reserved.saturating_add(step).min(max_attempts))
            })
            .ok()
            .map(|previous| step.min(max_attempts - previous))
    }

    /// Adds completed attempts and returns the new total.
    pub(crate) fn record_attempts(&self, done: u64) -> u64 {
        self.attempts.fetch_add(done, Ordering::AcqRel) + done
    }

    pub(crate) fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Offers a match. Only the first offer made while the search is still
    /// running is kept; the result is stored before the stop signal flips.
    pub(crate) fn publish(&self, result: MatchResult) -> bool {
        let mut slot = self.winner.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() || self.is_stopped() {
            return false;
        }

        *slot = Some(result);
        if self.stop_with(FOUND) {
            true
        } else {
            // Interrupted between the check and the flip.
            *slot = None;
            false
        }
    }

    fn take_winner(&self) -> Option<MatchResult> {
        self.winner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Cloneable handle for stopping a search from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<SearchShared>);

impl StopHandle {
    /// Requests an operator stop. Returns `false` if the search had already
    /// stopped for another reason; a found match is never discarded.
    pub fn interrupt(&self) -> bool {
        self.0.interrupt()
    }

    /// Returns true if the search has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.0.is_stopped()
    }

    /// Returns the attempts completed so far.
    pub fn attempts(&self) -> u64 {
        self.0.attempts()
    }
}

/// Owns the worker pool for one search run.
pub struct SearchCoordinator {
    config: SearchConfig,
    policy: MatchPolicy,
    shared: Arc<SearchShared>,
    state: SearchState,
}

impl SearchCoordinator {
    /// Creates an idle coordinator. At least one worker and a step of at
    /// least one attempt are always used.
    pub fn new(mut config: SearchConfig) -> Self {
        config.workers = config.workers.max(1);
        config.step = config.step.max(1);
        let policy = config.match_policy();
        Self {
            config,
            policy,
            shared: Arc::new(SearchShared::new()),
            state: SearchState::Idle,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Returns a handle for external interrupts (e.g., signal handlers).
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.shared))
    }

    /// Returns the total attempts across all workers so far.
    pub fn total_attempts(&self) -> u64 {
        self.shared.attempts()
    }

    fn transition(&mut self, next: SearchState) {
        debug!(from = %self.state, to = %next, "Search state change");
        self.state = next;
    }

    /// Runs the search with OS-random keypairs, blocking until it ends.
    pub fn run(&mut self) -> Result<SearchReport, SearchError> {
        self.run_with(|_| KeyGenerator::new())
    }

    /// Runs the search with one candidate source per worker, built by
    /// `factory(worker_id)` on the worker's own thread.
    pub fn run_with<F, S>(&mut self, factory: F) -> Result<SearchReport, SearchError>
    where
        F: Fn(usize) -> S + Sync,
        S: CandidateSource,
    {
        if self.state != SearchState::Idle {
            return Err(SearchError::AlreadyStarted);
        }

        let start_time = Instant::now();
        let num_workers = self.config.workers;
        self.transition(SearchState::Running);
        info!(
            workers = num_workers,
            max_attempts = self.config.max_attempts,
            "Search started"
        );

        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let policy = self.policy.clone();
        let factory = &factory;
        let mut failures: Vec<KeyError> = Vec::new();

        let spawned = thread::scope(|scope| -> Result<(), SearchError> {
            let (found_tx, found_rx) = bounded::<()>(1);
            let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

            let reporter = ProgressReporter::new(
                Arc::clone(&shared),
                config.log_interval,
                start_time,
                shutdown_rx,
            );
            let progress = thread::Builder::new()
                .name("vanity-progress".into())
                .spawn_scoped(scope, move || reporter.run());
            let progress = match progress {
                Ok(handle) => handle,
                Err(e) => {
                    shared.stop_with(INTERRUPTED);
                    return Err(e.into());
                }
            };

            let mut handles = Vec::with_capacity(num_workers);
            let mut spawn_error = None;
            for id in 0..num_workers {
                let found_tx = found_tx.clone();
                let (config, policy, shared) = (&config, &policy, &*shared);
                let spawned = thread::Builder::new()
                    .name(format!("vanity-worker-{}", id))
                    .spawn_scoped(scope, move || {
                        let mut worker =
                            CpuWorker::new(id, factory(id), policy, config, shared, found_tx);
                        worker.run()
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        shared.stop_with(INTERRUPTED);
                        spawn_error = Some(e);
                        break;
                    }
                }
            }
            // Only workers hold senders now: recv fails once they all exit.
            drop(found_tx);

            if spawn_error.is_none() && found_rx.recv().is_ok() {
                self.transition(SearchState::Found);
                self.transition(SearchState::Draining);
            }

            for (id, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(worker = id, error = %e, "Worker failed");
                        failures.push(e);
                    }
                    Err(_) => error!(worker = id, "Worker panicked"),
                }
            }

            // Budget spent or every worker gone: release the reporter.
            shared.stop_with(EXHAUSTED);
            drop(shutdown_tx);
            let _ = progress.join();

            match spawn_error {
                Some(e) => Err(e.into()),
                None => Ok(()),
            }
        });
        spawned?;

        let stats = SearchStats {
            attempts: self.shared.attempts(),
            elapsed: start_time.elapsed(),
            workers: num_workers,
            failed_workers: failures.len(),
        };

        let outcome = match self.shared.take_winner() {
            Some(result) => SearchOutcome::Found(result),
            None if self.shared.reason.load(Ordering::Acquire) == INTERRUPTED => {
                self.transition(SearchState::Interrupted);
                SearchOutcome::Interrupted
            }
            None => {
                if failures.len() == num_workers {
                    self.transition(SearchState::Terminated);
                    if let Some(last) = failures.pop() {
                        return Err(SearchError::AllWorkersFailed {
                            workers: num_workers,
                            last,
                        });
                    }
                }
                self.transition(SearchState::Exhausted);
                SearchOutcome::Exhausted
            }
        };
        self.transition(SearchState::Terminated);

        info!(
            attempts = stats.attempts,
            elapsed_secs = stats.elapsed.as_secs_f64(),
            failed_workers = stats.failed_workers,
            "Search finished"
        );

        Ok(SearchReport { outcome, stats })
    }
}
