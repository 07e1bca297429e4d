//! CPU-based worker for vanity address search.

use crossbeam_channel::Sender;
use tracing::{debug, trace, Level};

use crate::config::SearchConfig;
use crate::crypto::{CandidateSource, KeyError, Keypair};
use crate::matcher::{MatchLabel, MatchPolicy};
use crate::scoring::rarity_score;

use super::pool::{MatchResult, SearchShared};

/// A CPU worker that generates and tests keypairs.
pub(crate) struct CpuWorker<'a, S> {
    /// Worker ID
    id: usize,
    /// Where candidates come from
    source: S,
    /// Decides whether a candidate ends the search
    policy: &'a MatchPolicy,
    config: &'a SearchConfig,
    /// Stop signal, counters and the winner slot
    shared: &'a SearchShared,
    /// Wakes the coordinator once this worker wins
    found_tx: Sender<()>,
}

impl<'a, S: CandidateSource> CpuWorker<'a, S> {
    /// Creates a new CPU worker.
    pub(crate) fn new(
        id: usize,
        source: S,
        policy: &'a MatchPolicy,
        config: &'a SearchConfig,
        shared: &'a SearchShared,
        found_tx: Sender<()>,
    ) -> Self {
        Self {
            id,
            source,
            policy,
            config,
            shared,
            found_tx,
        }
    }

    /// Runs the worker loop.
    ///
    /// Reserves attempts from the shared budget `step` at a time and tests
    /// one candidate per attempt until:
    /// - A match is found (published to the shared winner slot)
    /// - The stop signal is set
    /// - The budget is used up
    ///
    /// A randomness failure ends this worker only.
    pub fn run(&mut self) -> Result<(), KeyError> {
        let step = self.config.step;
        let max_attempts = self.config.max_attempts;

        while let Some(chunk) = self.shared.reserve(step, max_attempts) {
            let mut done = 0u64;

            while done < chunk {
                if self.shared.is_stopped() {
                    break;
                }

                let keypair = match self.source.next_candidate() {
                    Ok(keypair) => keypair,
                    Err(e) => {
                        self.shared.record_attempts(done);
                        return Err(e);
                    }
                };
                done += 1;

                let body = keypair.address().to_hex();
                if tracing::enabled!(Level::TRACE) {
                    if let Some(rule) = self.policy.rules().first_match(&body) {
                        trace!(worker = self.id, rule = %rule.id(), address = %body, "Structural pattern hit");
                    }
                }

                if let Some(label) = self.policy.evaluate(&body) {
                    let attempts = self.shared.record_attempts(done);
                    self.publish(keypair, &body, label, attempts);
                    return Ok(());
                }
            }

            self.shared.record_attempts(done);
            if self.shared.is_stopped() {
                break;
            }
        }

        debug!(worker = self.id, "Worker finished");
        Ok(())
    }

    fn publish(&self, keypair: Keypair, body: &str, label: MatchLabel, attempts: u64) {
        let address = if self.config.use_checksum {
            keypair.address().to_checksum()
        } else {
            keypair.address().to_hex_prefixed()
        };

        let result = MatchResult {
            address,
            private_key: keypair.private_key_hex(),
            attempts,
            rarity_score: rarity_score(body),
            pattern_matched: label.to_string(),
            structural_rules: self
                .policy
                .rules()
                .all_matches(body)
                .into_iter()
                .map(|id| id.to_string())
                .collect(),
            worker_id: self.id,
        };

        // A losing candidate is dropped without a trace.
        if self.shared.publish(result) {
            // Capacity one; a full channel already carries the wake-up.
            let _ = self.found_tx.try_send(());
        }
    }
}
