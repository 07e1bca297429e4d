//! Structural address rules.
//!
//! Every rule looks at the lowercase 40-digit body of an address. Callers may
//! pass the address with or without its `0x` prefix and in any case.

use std::fmt;

const ASCENDING_RUNS: [&str; 6] = ["1234", "2345", "3456", "4567", "5678", "6789"];
const DESCENDING_RUNS: [&str; 7] = ["9876", "8765", "7654", "6543", "5432", "4321", "3210"];
const HEXSPEAK: [&str; 6] = [
    "deadbeef", "baddcafe", "1337beef", "cafebabe", "8badf00d", "c0ffee",
];

/// Identifies a structural rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    /// `0000` right after the first four digits
    FourZeros,
    /// Three identical decimal digits in a row
    TripleDigits,
    /// Four ascending decimal digits (`1234` .. `6789`)
    Ascending,
    /// Four descending decimal digits (`9876` .. `3210`)
    Descending,
    /// Twelve digits whose second half mirrors the first
    MirroredHalves,
    /// One byte (two digits) repeated four times back to back
    RepeatedByte,
    /// `10101010`
    AlternatingBits,
    /// A word from the hexspeak vocabulary
    Hexspeak,
}

impl RuleId {
    pub fn label(self) -> &'static str {
        match self {
            RuleId::FourZeros => "four_zeros",
            RuleId::TripleDigits => "triple_digits",
            RuleId::Ascending => "ascending",
            RuleId::Descending => "descending",
            RuleId::MirroredHalves => "mirrored_halves",
            RuleId::RepeatedByte => "repeated_byte",
            RuleId::AlternatingBits => "alternating_bits",
            RuleId::Hexspeak => "hexspeak",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single rule: an id plus a predicate over a lowercase address body.
#[derive(Clone, Copy)]
pub struct PatternRule {
    id: RuleId,
    matcher: fn(&str) -> bool,
}

impl PatternRule {
    pub const fn new(id: RuleId, matcher: fn(&str) -> bool) -> Self {
        Self { id, matcher }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    /// Tests a lowercase body (no `0x`).
    #[inline]
    pub fn is_match(&self, body: &str) -> bool {
        (self.matcher)(body)
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PatternRule").field(&self.id).finish()
    }
}

/// The ordered list of structural rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<PatternRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    /// All eight rules in evaluation order.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                PatternRule::new(RuleId::FourZeros, four_zeros),
                PatternRule::new(RuleId::TripleDigits, triple_digits),
                PatternRule::new(RuleId::Ascending, |body| contains_any(body, &ASCENDING_RUNS)),
                PatternRule::new(RuleId::Descending, |body| contains_any(body, &DESCENDING_RUNS)),
                PatternRule::new(RuleId::MirroredHalves, mirrored_halves),
                PatternRule::new(RuleId::RepeatedByte, repeated_byte),
                PatternRule::new(RuleId::AlternatingBits, |body| body.contains("10101010")),
                PatternRule::new(RuleId::Hexspeak, |body| contains_any(body, &HEXSPEAK)),
            ],
        }
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Returns the first rule (in evaluation order) the address satisfies.
    pub fn first_match(&self, address: &str) -> Option<&PatternRule> {
        let body = normalize(address);
        self.rules.iter().find(|rule| rule.is_match(&body))
    }

    /// Returns every rule the address satisfies, in evaluation order.
    pub fn all_matches(&self, address: &str) -> Vec<RuleId> {
        let body = normalize(address);
        self.rules
            .iter()
            .filter(|rule| rule.is_match(&body))
            .map(PatternRule::id)
            .collect()
    }
}

fn normalize(address: &str) -> String {
    let body = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    body.to_ascii_lowercase()
}

fn contains_any(body: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| body.contains(needle))
}

fn four_zeros(body: &str) -> bool {
    body.get(4..8) == Some("0000")
}

fn triple_digits(body: &str) -> bool {
    body.as_bytes()
        .windows(3)
        .any(|w| w[0].is_ascii_digit() && w[0] == w[1] && w[1] == w[2])
}

fn mirrored_halves(body: &str) -> bool {
    body.as_bytes().windows(12).any(|w| {
        let (left, right) = w.split_at(6);
        left.iter().eq(right.iter().rev())
    })
}

fn repeated_byte(body: &str) -> bool {
    body.as_bytes()
        .windows(8)
        .any(|w| w[0..2] == w[2..4] && w[2..4] == w[4..6] && w[4..6] == w[6..8])
}
