//! Keypair generation and address derivation.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};

use super::Address;

/// Errors raised while producing candidate keys.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("secure randomness unavailable: {0}")]
    Entropy(#[from] rand::Error),

    #[error("invalid secret key: {0}")]
    InvalidSecret(#[from] secp256k1::Error),

    #[error("invalid private key hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Represents an Ethereum keypair (private key + derived address).
#[derive(Debug, Clone)]
pub struct Keypair {
    /// The private key bytes (32 bytes)
    secret_key: [u8; 32],
    /// The derived Ethereum address
    address: Address,
}

impl Keypair {
    /// Rebuilds a keypair from an existing secret key.
    pub fn from_secret_key(secret_bytes: [u8; 32]) -> Result<Self, KeyError> {
        let secp = Secp256k1::new();
        Self::with_context(&secp, secret_bytes)
    }

    fn with_context(secp: &Secp256k1<All>, secret_bytes: [u8; 32]) -> Result<Self, KeyError> {
        let secret_key = SecretKey::from_slice(&secret_bytes)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);

        Ok(Self {
            secret_key: secret_bytes,
            address: derive_address(&public_key),
        })
    }

    /// Returns the private key as a hex string (without 0x prefix).
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key)
    }

    /// Returns the private key bytes.
    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    /// Returns a reference to the derived address.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Derives an Ethereum address from a secp256k1 public key.
///
/// Process:
/// 1. Serialize the public key in uncompressed form (65 bytes)
/// 2. Remove the first byte (0x04 prefix)
/// 3. Hash the remaining 64 bytes with Keccak-256
/// 4. Take the last 20 bytes of the hash
#[inline]
fn derive_address(public_key: &PublicKey) -> Address {
    let public_key_bytes = public_key.serialize_uncompressed();

    let mut hasher = Keccak::v256();
    hasher.update(&public_key_bytes[1..]);

    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    let mut address_bytes = [0u8; 20];
    address_bytes.copy_from_slice(&hash[12..]);

    Address::from_bytes(address_bytes)
}

/// Anything that can hand a worker its next candidate keypair.
pub trait CandidateSource {
    fn next_candidate(&mut self) -> Result<Keypair, KeyError>;
}

/// Random keypair generator backed by a cryptographically secure RNG.
///
/// Holds its own secp256k1 context so a worker pays the context setup cost
/// once instead of per candidate.
pub struct KeyGenerator<R = OsRng> {
    secp: Secp256k1<All>,
    rng: R,
}

impl KeyGenerator<OsRng> {
    /// Creates a generator reading from the operating system CSPRNG.
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for KeyGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> KeyGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            secp: Secp256k1::new(),
            rng,
        }
    }

    /// Generates a new random keypair.
    ///
    /// Draws 32 uniform bytes and retries on the (negligibly rare) values that
    /// are not valid curve scalars. A failing RNG is reported, never retried.
    pub fn generate(&mut self) -> Result<Keypair, KeyError> {
        let mut secret_bytes = [0u8; 32];
        loop {
            self.rng.try_fill_bytes(&mut secret_bytes)?;
            match Keypair::with_context(&self.secp, secret_bytes) {
                Ok(keypair) => return Ok(keypair),
                Err(KeyError::InvalidSecret(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: RngCore + CryptoRng> CandidateSource for KeyGenerator<R> {
    #[inline]
    fn next_candidate(&mut self) -> Result<Keypair, KeyError> {
        self.generate()
    }
}

/// Re-derives the address of `private_key` and compares it to `address`.
///
/// Both arguments may carry a `0x` prefix; the address comparison ignores
/// case so checksummed renderings verify as well.
pub fn verify_keypair(address: &str, private_key: &str) -> Result<bool, KeyError> {
    let secret: [u8; 32] = {
        let bytes = hex::decode(private_key.trim_start_matches("0x"))?;
        match bytes.try_into() {
            Ok(secret) => secret,
            Err(_) => return Ok(false),
        }
    };
    let keypair = Keypair::from_secret_key(secret)?;

    Ok(address
        .trim_start_matches("0x")
        .eq_ignore_ascii_case(&keypair.address().to_hex()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> [u8; 32] {
        let mut key = [0u8; 32];
        key[31] = 1;
        key
    }

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {}

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source closed"))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn test_keypair_generation() {
        let keypair = KeyGenerator::new().generate().unwrap();
        assert_eq!(keypair.private_key_bytes().len(), 32);
        assert_eq!(keypair.address().to_hex().len(), 40);
        assert_ne!(keypair.private_key_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_deterministic_address() {
        let keypair = Keypair::from_secret_key(key_one()).unwrap();

        // Address for private key = 1 is well-known
        assert_eq!(
            keypair.address().to_hex(),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_zero_secret_rejected() {
        assert!(matches!(
            Keypair::from_secret_key([0u8; 32]),
            Err(KeyError::InvalidSecret(_))
        ));
    }

    #[test]
    fn test_broken_rng_is_reported() {
        let mut generator = KeyGenerator::with_rng(BrokenRng);
        assert!(matches!(generator.generate(), Err(KeyError::Entropy(_))));
    }

    #[test]
    fn test_verify_keypair() {
        let keypair = Keypair::from_secret_key(key_one()).unwrap();
        let private_key = keypair.private_key_hex();

        assert!(verify_keypair(&keypair.address().to_checksum(), &private_key).unwrap());
        assert!(verify_keypair(&keypair.address().to_hex(), &private_key).unwrap());
        assert!(!verify_keypair(&"0".repeat(40), &private_key).unwrap());
        assert!(verify_keypair(&keypair.address().to_hex(), "zz").is_err());
    }
}
