//! # vanity_hunter
//!
//! Multi-threaded Ethereum vanity address hunter.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation, address derivation and EIP-55 checksums
//! - `matcher`: Custom pattern, structural rules and the acceptance policy
//! - `scoring`: Rarity score and brute-force estimates
//! - `worker`: Search coordinator, worker pool and progress reporting
//! - `sink`: Where a found result goes
//! - `config`: Runtime configuration

pub mod config;
pub mod crypto;
pub mod matcher;
pub mod scoring;
pub mod sink;
pub mod worker;

pub use config::{Config, ConfigError, SearchConfig};
pub use crypto::{to_checksum_hex, Address, CandidateSource, KeyError, KeyGenerator, Keypair};
pub use matcher::{AddressRegex, CustomPattern, MatchLabel, MatchPolicy, RuleId, RuleSet};
pub use scoring::rarity_score;
pub use sink::{deliver, JsonFileSink, ResultSink, RetryPolicy, SinkError};
pub use worker::{
    MatchResult, SearchCoordinator, SearchError, SearchOutcome, SearchReport, SearchState,
    StopHandle,
};
