//! Ethereum Vanity Address Hunter CLI
//!
//! Usage:
//!   vanity-hunter -p dead                # Address starting with "dead"
//!   vanity-hunter -e beef -c             # Ending with "beef", EIP-55 output
//!   vanity-hunter -p 00 -z 10 -m 1000000 # Leading "00", ten zeros, bounded

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vanity_hunter::crypto::verify_keypair;
use vanity_hunter::scoring::{entropy_bits, years_to_crack};
use vanity_hunter::worker::{format_number, SearchStats};
use vanity_hunter::{
    deliver, Config, JsonFileSink, MatchResult, ResultSink, SearchCoordinator, SearchOutcome,
    StopHandle,
};

fn main() {
    init_logging();

    let config = Config::parse();

    // Validate configuration
    let search_config = match config.search_config() {
        Ok(search_config) => search_config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&config, search_config) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // LOG_FORMAT=json for machine-readable output, human-readable otherwise
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}

fn run(config: &Config, search_config: vanity_hunter::SearchConfig) -> Result<()> {
    let mut coordinator = SearchCoordinator::new(search_config);
    let pattern = coordinator.policy().pattern().clone();

    // Print startup info
    println!("Ethereum Vanity Address Hunter");
    println!("==============================");
    println!("Prefix:      {}", display_or_none(pattern.prefix()));
    println!("Suffix:      {}", display_or_none(pattern.suffix()));
    if let Some(regex) = coordinator.policy().regex() {
        println!("Regex:       {}", regex.as_str());
    }
    println!("Difficulty:  {}", pattern.difficulty_description());
    println!("Checksum:    {}", coordinator.config().use_checksum);
    println!("Workers:     {}", coordinator.config().workers);
    println!("Max tries:   {}", format_number(coordinator.config().max_attempts));
    println!();

    if pattern.is_empty() && config.min_zeros == 0 {
        warn!("No prefix or suffix given: the first candidate will match");
    }

    ctrlc_handler(coordinator.stop_handle())?;

    println!("Searching... (Press Ctrl+C to stop)\n");
    let report = coordinator.run().context("search failed")?;

    match &report.outcome {
        SearchOutcome::Found(result) => {
            print_result(result);

            let sink = JsonFileSink::new(&config.output_dir);
            match deliver(&sink, result, &config.retry_policy()) {
                Ok(attempts) => info!(attempts, dir = %sink.dir().display(), "Result persisted"),
                Err(e) => error!(error = %e, "Could not persist result; it is printed above"),
            }
        }
        SearchOutcome::Exhausted => {
            println!("Maximum attempts reached without finding a matching address.");
            let sink = JsonFileSink::new(&config.output_dir);
            if let Err(e) = sink.exhausted(report.stats.attempts) {
                error!(error = %e, "Could not record exhausted run");
            }
        }
        SearchOutcome::Interrupted => {
            println!("\nStopped by user.");
        }
    }

    print_stats(&report.stats);
    Ok(())
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}

fn print_result(result: &MatchResult) {
    println!("=== Match found ===");
    println!("Address:      {}", result.address);
    println!("Private Key:  {}", result.private_key);
    println!("Attempts:     {}", result.attempts);
    println!("Rarity Score: {:.4} (lower is rarer)", result.rarity_score);
    println!("Pattern:      {}", result.pattern_matched);
    if !result.structural_rules.is_empty() {
        println!("Also:         {}", result.structural_rules.join(", "));
    }
    println!("Worker:       {}", result.worker_id);

    match verify_keypair(&result.address, &result.private_key) {
        Ok(true) => println!("Verification: PASSED"),
        Ok(false) => println!("Verification: FAILED (address does not match private key!)"),
        Err(e) => println!("Verification: ERROR ({})", e),
    }

    let bits = entropy_bits(&result.address);
    println!("Entropy:      {} bits", bits);
    println!("Crack time:   {:.2e} years", years_to_crack(bits));
    println!();
}

fn print_stats(stats: &SearchStats) {
    println!("\n--- Final Statistics ---");
    println!("Total keys generated: {}", format_number(stats.attempts));
    println!("Time elapsed:         {:.2}s", stats.elapsed.as_secs_f64());
    println!(
        "Average speed:        {}/s",
        format_number(stats.keys_per_second() as u64)
    );
    if stats.failed_workers > 0 {
        println!(
            "Failed workers:       {} of {}",
            stats.failed_workers, stats.workers
        );
    }
}

fn ctrlc_handler(stop: StopHandle) -> Result<()> {
    ctrlc::set_handler(move || {
        stop.interrupt();
    })
    .context("Error setting Ctrl-C handler")
}
