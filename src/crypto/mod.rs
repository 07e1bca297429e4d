//! Cryptographic operations for Ethereum key and address generation.
//!
//! This module provides:
//! - Secure random key generation using secp256k1
//! - Ethereum address derivation using Keccak-256
//! - EIP-55 checksum rendering

mod address;
mod keypair;

pub use address::{to_checksum_hex, Address};
pub use keypair::{verify_keypair, CandidateSource, KeyError, KeyGenerator, Keypair};
