//! Runtime configuration for the vanity address hunter.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::matcher::{AddressRegex, CustomPattern, MatchPolicy};
use crate::sink::RetryPolicy;

/// Width of an address body in hex digits.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Ethereum Vanity Address Hunter
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Prefix the address must start with (hex characters only)
    #[arg(short = 'p', long, default_value = "")]
    pub start_pattern: String,

    /// Suffix the address must end with (hex characters only)
    #[arg(short = 'e', long, default_value = "")]
    pub end_pattern: String,

    /// Regular expression the address (no 0x) must also match
    #[arg(short = 'r', long)]
    pub regex_pattern: Option<String>,

    /// Render addresses with EIP-55 checksum casing
    #[arg(short = 'c', long)]
    pub checksum: bool,

    /// Attempts each worker batches before updating the shared counter
    #[arg(short = 's', long, default_value_t = 50_000)]
    pub step: u64,

    /// Maximum number of attempts across all workers
    #[arg(short = 'm', long, default_value_t = 5_000_000_000_000_000)]
    pub max_tries: u64,

    /// Progress log interval in milliseconds
    #[arg(short = 'i', long, default_value_t = 5_000)]
    pub log_interval: u64,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Minimum number of '0' digits a match must contain
    #[arg(short = 'z', long, default_value_t = 0)]
    pub min_zeros: usize,

    /// Let a structural rule hit (runs, repeats, hexspeak, ...) end the search
    #[arg(long)]
    pub accept_structural: bool,

    /// Do not accept addresses whose first 12 digits form a palindrome
    #[arg(long)]
    pub no_palindrome: bool,

    /// Directory the JSON result file is written to
    #[arg(short = 'o', long, default_value = "gen")]
    pub output_dir: PathBuf,

    /// Attempts at persisting a result before giving up
    #[arg(long, default_value_t = 3)]
    pub sink_retries: u32,

    /// Initial backoff between persistence attempts in milliseconds
    #[arg(long, default_value_t = 500)]
    pub sink_backoff_ms: u64,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_hex("Prefix", &self.start_pattern)?;
        validate_hex("Suffix", &self.end_pattern)?;

        if self.start_pattern.len() + self.end_pattern.len() > ADDRESS_HEX_LEN {
            return Err(ConfigError::InvalidPattern(
                "Combined prefix + suffix cannot be longer than 40 characters".into(),
            ));
        }

        if self.min_zeros > ADDRESS_HEX_LEN {
            return Err(ConfigError::InvalidValue(
                "min-zeros cannot exceed 40".into(),
            ));
        }

        for (name, value) in [
            ("step", self.step),
            ("max-tries", self.max_tries),
            ("log-interval", self.log_interval),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{} must be positive", name)));
            }
        }

        if self.worker_count() == 0 {
            return Err(ConfigError::InvalidValue("workers must be positive".into()));
        }

        if self.sink_retries == 0 {
            return Err(ConfigError::InvalidValue("sink-retries must be positive".into()));
        }

        Ok(())
    }

    /// Validates and freezes the settings the search engine needs.
    ///
    /// The regex is compiled here, once per run.
    pub fn search_config(&self) -> Result<SearchConfig, ConfigError> {
        self.validate()?;
        let regex = self
            .regex_pattern
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
            .map(AddressRegex::new)
            .transpose()?;

        Ok(SearchConfig {
            prefix: self.start_pattern.to_ascii_lowercase(),
            suffix: self.end_pattern.to_ascii_lowercase(),
            use_checksum: self.checksum,
            step: self.step,
            log_interval: Duration::from_millis(self.log_interval),
            max_attempts: self.max_tries,
            workers: self.worker_count(),
            min_zeros: self.min_zeros,
            accept_structural: self.accept_structural,
            palindrome_window: !self.no_palindrome,
            regex,
        })
    }

    /// Retry settings for handing a result to the sink.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.sink_retries, Duration::from_millis(self.sink_backoff_ms))
    }
}

fn validate_hex(what: &str, value: &str) -> Result<(), ConfigError> {
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidPattern(format!(
            "{} must contain only hex characters (0-9, a-f), found '{}'",
            what, bad
        )));
    }
    if value.len() > ADDRESS_HEX_LEN {
        return Err(ConfigError::InvalidPattern(format!(
            "{} cannot be longer than 40 characters (full address)",
            what
        )));
    }
    Ok(())
}

/// Immutable search settings shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Lowercase hex prefix (may be empty)
    pub prefix: String,
    /// Lowercase hex suffix (may be empty)
    pub suffix: String,
    /// Render candidates with EIP-55 casing before matching and in results
    pub use_checksum: bool,
    /// Attempts a worker reserves and flushes at a time
    pub step: u64,
    /// Time between progress reports
    pub log_interval: Duration,
    /// Ceiling on total attempts
    pub max_attempts: u64,
    /// Worker thread count
    pub workers: usize,
    pub min_zeros: usize,
    pub accept_structural: bool,
    pub palindrome_window: bool,
    /// Extra filter on the rendered address
    pub regex: Option<AddressRegex>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            use_checksum: false,
            step: 50_000,
            log_interval: Duration::from_millis(5_000),
            max_attempts: 5_000_000_000_000_000,
            workers: num_cpus::get(),
            min_zeros: 0,
            accept_structural: false,
            palindrome_window: true,
            regex: None,
        }
    }
}

impl SearchConfig {
    /// Builds the acceptance policy described by these settings.
    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy::new(CustomPattern::new(&self.prefix, &self.suffix))
            .with_palindrome_window(self.palindrome_window)
            .with_accept_structural(self.accept_structural)
            .with_min_zeros(self.min_zeros)
            .with_regex(self.regex.clone())
            .with_checksum(self.use_checksum)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("vanity-hunter").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.start_pattern, "");
        assert_eq!(config.end_pattern, "");
        assert!(!config.checksum);
        assert_eq!(config.step, 50_000);
        assert_eq!(config.log_interval, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_valid_pattern() {
        let config = parse(&["--start-pattern", "DEAD", "--end-pattern", "beef", "-c"]);
        let search = config.search_config().unwrap();
        assert_eq!(search.prefix, "dead");
        assert_eq!(search.suffix, "beef");
        assert!(search.use_checksum);
    }

    #[test]
    fn test_invalid_pattern() {
        let config = parse(&["-p", "xyz"]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPattern(_))));

        let config = parse(&["-e", "0x12"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_combined_length_limit() {
        let config = parse(&["-p", "a".repeat(21).as_str(), "-e", "b".repeat(20).as_str()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(parse(&["--step", "0"]).validate().is_err());
        assert!(parse(&["--max-tries", "0"]).validate().is_err());
        assert!(parse(&["--workers", "0"]).validate().is_err());
        assert!(parse(&["--log-interval", "0"]).validate().is_err());
    }

    #[test]
    fn test_flags_reach_search_config() {
        let search = parse(&["--no-palindrome", "--accept-structural", "-z", "3", "-w", "2"])
            .search_config()
            .unwrap();
        assert!(!search.palindrome_window);
        assert!(search.accept_structural);
        assert_eq!(search.min_zeros, 3);
        assert_eq!(search.workers, 2);
    }

    #[test]
    fn test_regex_pattern_compiled() {
        let search = parse(&["-r", "^dead.*beef$"]).search_config().unwrap();
        let regex = search.regex.as_ref().unwrap();
        assert_eq!(regex.as_str(), "^dead.*beef$");
        assert!(search.match_policy().regex().is_some());

        assert!(parse(&[]).search_config().unwrap().regex.is_none());
        assert!(parse(&["-r", ""]).search_config().unwrap().regex.is_none());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let config = parse(&["--regex-pattern", "[0-9"]);
        assert!(matches!(
            config.search_config(),
            Err(ConfigError::InvalidRegex(_))
        ));
    }
}
