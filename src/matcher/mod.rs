//! Pattern matching for Ethereum addresses.
//!
//! - `pattern`: custom prefix/suffix pattern and the palindrome check
//! - `rules`: the ordered structural rules (runs, repeats, hexspeak, ...)
//! - `policy`: which of the above actually ends a search

mod pattern;
mod policy;
mod rules;

pub use pattern::{is_palindrome, CustomPattern};
pub use policy::{AddressRegex, MatchLabel, MatchPolicy, PALINDROME_WINDOW};
pub use rules::{PatternRule, RuleId, RuleSet};
