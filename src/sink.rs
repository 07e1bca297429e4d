//! Result sink boundary.
//!
//! The search engine never touches storage directly; it hands the single
//! match of a run to a [`ResultSink`] through [`deliver`], which retries a
//! bounded number of times with exponential backoff.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::worker::MatchResult;

/// Errors a sink may report.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink rejected result: {0}")]
    Rejected(String),
}

/// Receives the outcome of a search run.
pub trait ResultSink {
    /// Stores a found match. Called at most once per run (plus retries).
    fn persist(&self, result: &MatchResult) -> Result<(), SinkError>;

    /// Records that the attempt budget ran out without a match.
    fn exhausted(&self, _attempts: u64) -> Result<(), SinkError> {
        Ok(())
    }
}

/// How often and how patiently [`deliver`] retries a failing sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one call.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `retry` (1-based): backoff doubled each time.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor)
    }
}

/// Hands `result` to `sink`, retrying on failure.
///
/// Returns the number of calls it took, or the last error once the policy is
/// exhausted. The caller still owns `result` either way.
pub fn deliver(
    sink: &dyn ResultSink,
    result: &MatchResult,
    policy: &RetryPolicy,
) -> Result<u32, SinkError> {
    let mut attempt = 1;
    loop {
        match sink.persist(result) {
            Ok(()) => return Ok(attempt),
            Err(e) if attempt < policy.max_attempts() => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Persisting result failed, retrying"
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Name of the run log kept next to the result files.
pub const RUN_LOG: &str = "hunter.log";

/// Writes each result to `<dir>/<address>.json` and appends one line per
/// finished run to `<dir>/hunter.log`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the given result is written to.
    pub fn path_for(&self, result: &MatchResult) -> PathBuf {
        self.dir.join(format!("{}.json", result.address))
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(RUN_LOG)
    }

    fn append_log(&self, line: &str) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir)?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);

        let mut log = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.log_path())?;
        writeln!(log, "[{}] {}", timestamp, line)?;
        Ok(())
    }
}

impl ResultSink for JsonFileSink {
    fn persist(&self, result: &MatchResult) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(result);
        let json = serde_json::to_vec_pretty(result)?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // The file holds a private key: owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        file.write_all(&json)?;

        self.append_log(&format!(
            "found {} after {} attempts ({})",
            result.address, result.attempts, result.pattern_matched
        ))?;

        info!(path = %path.display(), "Result saved");
        Ok(())
    }

    fn exhausted(&self, attempts: u64) -> Result<(), SinkError> {
        self.append_log(&format!("exhausted after {} attempts without a match", attempts))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn sample() -> MatchResult {
        MatchResult {
            address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into(),
            private_key: "01".repeat(32),
            attempts: 1234,
            rarity_score: 0.987_654_3,
            pattern_matched: "custom".into(),
            structural_rules: vec!["triple_digits".into()],
            worker_id: 2,
        }
    }

    struct FlakySink {
        failures: u32,
        calls: Cell<u32>,
    }

    impl ResultSink for FlakySink {
        fn persist(&self, _result: &MatchResult) -> Result<(), SinkError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() <= self.failures {
                Err(SinkError::Rejected("unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_deliver_retries_until_success() {
        let sink = FlakySink {
            failures: 2,
            calls: Cell::new(0),
        };
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert_eq!(deliver(&sink, &sample(), &policy).unwrap(), 3);
    }

    #[test]
    fn test_deliver_gives_up_after_bound() {
        let sink = FlakySink {
            failures: u32::MAX,
            calls: Cell::new(0),
        };
        let policy = RetryPolicy::new(4, Duration::ZERO);
        assert!(matches!(
            deliver(&sink, &sample(), &policy),
            Err(SinkError::Rejected(_))
        ));
        assert_eq!(sink.calls.get(), 4);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_json_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("gen"));
        let result = sample();

        sink.persist(&result).unwrap();

        let written = fs::read_to_string(sink.path_for(&result)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["address"], result.address.as_str());
        assert_eq!(json["private_key"], result.private_key.as_str());
        assert_eq!(json["attempts"], 1234);
        assert_eq!(json["rarity_score"], 0.9877);
        assert_eq!(json["pattern_matched"], "custom");
        assert_eq!(json["structural_rules"][0], "triple_digits");

        let log = fs::read_to_string(sink.log_path()).unwrap();
        assert!(log.contains(&format!("found {} after 1234 attempts", result.address)));
    }

    #[test]
    fn test_exhausted_appends_to_run_log() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());

        sink.exhausted(5_000).unwrap();
        sink.exhausted(7_000).unwrap();

        let log = fs::read_to_string(dir.path().join(RUN_LOG)).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("exhausted after 5000 attempts without a match"));
        assert!(lines[1].contains("7000"));
    }
}
