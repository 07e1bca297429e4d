//! Rarity scoring and brute-force resistance estimates.
//!
//! The rarity score is inverted relative to what the name suggests: a
//! **lower** score means a less diverse, more repetitive address, and this tool
//! calls such addresses *rarer*. Keep the formula and the convention as they
//! are; persisted results from earlier runs are compared on this scale.

/// Guesses per second assumed by [`years_to_crack`].
pub const GUESSES_PER_SECOND: f64 = 1e12;

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;

/// Scores an address body (hex digits, no `0x`). Lower is rarer.
///
/// `score = unique / 16 * (1 + max_frequency / len)`, where `unique` is the
/// number of distinct hex digits (case-folded). The result lies in `[0, 2]`
/// for hex input; an empty body scores `0`.
pub fn rarity_score(body: &str) -> f64 {
    if body.is_empty() {
        return 0.0;
    }

    let mut counts = [0usize; 16];
    let mut len = 0usize;
    for c in body.chars() {
        if let Some(digit) = c.to_digit(16) {
            counts[digit as usize] += 1;
        }
        len += 1;
    }

    let unique_chars = counts.iter().filter(|&&n| n > 0).count();
    let max_count = counts.iter().copied().max().unwrap_or(0);
    let repetition_factor = max_count as f64 / len as f64;

    (unique_chars as f64 / 16.0) * (1.0 + repetition_factor)
}

/// Bits of entropy carried by the hex digits of an address (4 per digit).
pub fn entropy_bits(address: &str) -> u32 {
    address.trim_start_matches("0x").len() as u32 * 4
}

/// Years needed to exhaust `bits` of key space at [`GUESSES_PER_SECOND`].
pub fn years_to_crack(bits: u32) -> f64 {
    2f64.powi(bits as i32) / GUESSES_PER_SECOND / SECONDS_PER_YEAR
}
