//! Ethereum address representation and EIP-55 checksum rendering.

use std::fmt;

use tiny_keccak::{Hasher, Keccak};

/// An Ethereum address (20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the address as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the address as a lowercase hex string (without 0x prefix).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the address with 0x prefix.
    pub fn to_hex_prefixed(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Returns the address with checksum encoding (EIP-55) and 0x prefix.
    pub fn to_checksum(&self) -> String {
        format!("0x{}", to_checksum_hex(&self.to_hex()))
    }
}

/// Applies EIP-55 mixed-case encoding to a 40-digit hex address body.
///
/// The input may be in any case and must not carry the `0x` prefix. The
/// Keccak-256 digest is taken over the lowercase ASCII text, not the raw
/// address bytes. A letter at position `i` is upper-cased iff nibble `i` of
/// the digest is `>= 8`; decimal digits are emitted unchanged.
pub fn to_checksum_hex(address: &str) -> String {
    let lower = address.to_ascii_lowercase();

    let mut hasher = Keccak::v256();
    hasher.update(lower.as_bytes());
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    let mut checksum = String::with_capacity(lower.len());
    for (i, c) in lower.chars().enumerate() {
        if c.is_ascii_digit() {
            checksum.push(c);
            continue;
        }

        let hash_byte = hash[(i / 2) % hash.len()];
        let hash_nibble = if i % 2 == 0 {
            hash_byte >> 4
        } else {
            hash_byte & 0x0f
        };

        if hash_nibble >= 8 {
            checksum.push(c.to_ascii_uppercase());
        } else {
            checksum.push(c);
        }
    }

    checksum
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}
