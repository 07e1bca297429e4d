//! Worker pool for parallel vanity address search.
//!
//! This module provides:
//! - Multi-threaded CPU workers
//! - The search coordinator (stop signal, attempt budget, single winner)
//! - Periodic progress reporting

mod cpu;
mod pool;
mod progress;

pub use pool::{
    MatchResult, SearchCoordinator, SearchError, SearchOutcome, SearchReport, SearchState,
    SearchStats, StopHandle,
};
pub use progress::format_number;
