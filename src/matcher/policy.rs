//! Acceptance policy: decides whether a candidate ends the search.

use std::fmt;

use regex::Regex;

use crate::crypto::to_checksum_hex;

use super::pattern::{is_palindrome, CustomPattern};
use super::rules::{RuleId, RuleSet};

/// Width of the palindrome window at the start of the address body.
pub const PALINDROME_WINDOW: usize = 12;

/// Why a candidate was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLabel {
    /// Prefix and suffix both matched
    Custom,
    /// The first twelve body digits read the same both ways
    Palindrome,
    /// A structural rule (only with `accept_structural`)
    Structural(RuleId),
}

impl fmt::Display for MatchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchLabel::Custom => f.write_str("custom"),
            MatchLabel::Palindrome => f.write_str("palindrome"),
            MatchLabel::Structural(id) => write!(f, "{}", id),
        }
    }
}

/// User-supplied regular expression every accepted address must match.
///
/// Applied to the rendered body (no `0x`), so with checksum casing enabled
/// the expression sees the mixed-case text.
#[derive(Debug, Clone)]
pub struct AddressRegex(Regex);

impl AddressRegex {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, body: &str) -> bool {
        self.0.is_match(body)
    }
}

impl PartialEq for AddressRegex {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for AddressRegex {}

/// Combines the custom pattern, the palindrome window and the structural
/// rules into one accept/reject decision.
///
/// Structural rules only accept on their own when `accept_structural` is set;
/// otherwise they are reported alongside a match but never end the search.
#[derive(Debug, Clone)]
pub struct MatchPolicy {
    pattern: CustomPattern,
    rules: RuleSet,
    palindrome_window: bool,
    accept_structural: bool,
    min_zeros: usize,
    regex: Option<AddressRegex>,
    checksum: bool,
}

impl MatchPolicy {
    pub fn new(pattern: CustomPattern) -> Self {
        Self {
            pattern,
            rules: RuleSet::standard(),
            palindrome_window: true,
            accept_structural: false,
            min_zeros: 0,
            regex: None,
            checksum: false,
        }
    }

    pub fn with_palindrome_window(mut self, enabled: bool) -> Self {
        self.palindrome_window = enabled;
        self
    }

    pub fn with_accept_structural(mut self, enabled: bool) -> Self {
        self.accept_structural = enabled;
        self
    }

    pub fn with_min_zeros(mut self, min_zeros: usize) -> Self {
        self.min_zeros = min_zeros;
        self
    }

    pub fn with_regex(mut self, regex: Option<AddressRegex>) -> Self {
        self.regex = regex;
        self
    }

    /// Judges the palindrome window and the regex on the EIP-55 rendering.
    pub fn with_checksum(mut self, enabled: bool) -> Self {
        self.checksum = enabled;
        self
    }

    pub fn regex(&self) -> Option<&AddressRegex> {
        self.regex.as_ref()
    }

    pub fn pattern(&self) -> &CustomPattern {
        &self.pattern
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluates a lowercase address body (no `0x`).
    ///
    /// Prefix, suffix and structural rules ignore case. The palindrome
    /// window and the regex look at the rendered body, which differs from
    /// `body` only when checksum casing is enabled.
    pub fn evaluate(&self, body: &str) -> Option<MatchLabel> {
        if self.min_zeros > 0 && body.bytes().filter(|&b| b == b'0').count() < self.min_zeros {
            return None;
        }

        // Rendered at most once, and only when something needs it.
        let mut rendered = None;

        if let Some(regex) = &self.regex {
            if !regex.is_match(self.render(body, &mut rendered)) {
                return None;
            }
        }

        if self.pattern.matches(body) {
            return Some(MatchLabel::Custom);
        }

        // A mixed-case window can only be a palindrome if its lowercase form is.
        if self.palindrome_window
            && body.get(..PALINDROME_WINDOW).is_some_and(is_palindrome)
            && self
                .render(body, &mut rendered)
                .get(..PALINDROME_WINDOW)
                .is_some_and(is_palindrome)
        {
            return Some(MatchLabel::Palindrome);
        }

        if self.accept_structural {
            return self
                .rules
                .first_match(body)
                .map(|rule| MatchLabel::Structural(rule.id()));
        }

        None
    }

    fn render<'a>(&self, body: &'a str, rendered: &'a mut Option<String>) -> &'a str {
        if self.checksum {
            rendered.get_or_insert_with(|| to_checksum_hex(body))
        } else {
            body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = "abcabcabcabcabcabcabcabcabcabcabcabcabca";

    fn strict(prefix: &str) -> MatchPolicy {
        MatchPolicy::new(CustomPattern::new(prefix, ""))
    }

    #[test]
    fn test_custom_pattern_accepts() {
        assert_eq!(strict("abc").evaluate(PLAIN), Some(MatchLabel::Custom));
        assert_eq!(strict("fff").evaluate(PLAIN), None);
    }

    #[test]
    fn test_palindrome_window_accepts() {
        let body = "123456654321ffffffffffffffffffffffffffff";
        assert_eq!(strict("fff").evaluate(body), Some(MatchLabel::Palindrome));
        assert_eq!(
            strict("fff").with_palindrome_window(false).evaluate(body),
            None
        );
    }

    #[test]
    fn test_structural_rules_observational_by_default() {
        let body = "abcabcdeadbeefabcabcabcabcabcabcabcabcab";
        assert_eq!(strict("fff").evaluate(body), None);
        assert_eq!(
            strict("fff").with_accept_structural(true).evaluate(body),
            Some(MatchLabel::Structural(RuleId::Hexspeak))
        );
    }

    #[test]
    fn test_min_zeros_gate() {
        let body = "00abcabcabcabcabcabcabcabcabcabcabcabcab";
        assert_eq!(strict("00").with_min_zeros(2).evaluate(body), Some(MatchLabel::Custom));
        assert_eq!(strict("00").with_min_zeros(3).evaluate(body), None);
    }

    #[test]
    fn test_checksum_palindrome_uses_rendered_case() {
        // Lowercase window reads the same both ways, its EIP-55 form does not.
        let body = format!("abcdeffedcba{}", "0".repeat(28));
        let window = &to_checksum_hex(&body)[..PALINDROME_WINDOW];
        assert!(!is_palindrome(window));

        assert_eq!(strict("fff").evaluate(&body), Some(MatchLabel::Palindrome));
        assert_eq!(strict("fff").with_checksum(true).evaluate(&body), None);
    }

    #[test]
    fn test_checksum_palindrome_of_digits() {
        // Digits keep their case, so the window survives checksumming.
        let body = "123456654321ffffffffffffffffffffffffffff";
        assert_eq!(
            strict("fff").with_checksum(true).evaluate(body),
            Some(MatchLabel::Palindrome)
        );
    }

    #[test]
    fn test_checksum_keeps_custom_pattern_case_insensitive() {
        let body = format!("abcdef{}", "1".repeat(34));
        assert_eq!(
            strict("abcdef").with_checksum(true).evaluate(&body),
            Some(MatchLabel::Custom)
        );
    }

    #[test]
    fn test_regex_gate() {
        let regex = AddressRegex::new("^abc.*b$").unwrap();
        let policy = strict("abc").with_regex(Some(regex));
        assert_eq!(policy.evaluate(PLAIN), None);

        let regex = AddressRegex::new("^abc.*a$").unwrap();
        let policy = strict("abc").with_regex(Some(regex));
        assert_eq!(policy.evaluate(PLAIN), Some(MatchLabel::Custom));
    }

    #[test]
    fn test_regex_gates_every_accept_path() {
        let palindrome = "123456654321ffffffffffffffffffffffffffff";
        let policy = strict("fff").with_regex(AddressRegex::new("^0").ok());
        assert_eq!(policy.evaluate(palindrome), None);

        let hexspeak = "abcabcdeadbeefabcabcabcabcabcabcabcabcab";
        let policy = strict("fff")
            .with_accept_structural(true)
            .with_regex(AddressRegex::new("^0").ok());
        assert_eq!(policy.evaluate(hexspeak), None);
    }

    #[test]
    fn test_regex_sees_checksum_casing() {
        let body = "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
        let policy = strict("5aaeb")
            .with_checksum(true)
            .with_regex(AddressRegex::new("^5aAeb").ok());
        assert_eq!(policy.evaluate(body), Some(MatchLabel::Custom));

        let policy = strict("5aaeb").with_regex(AddressRegex::new("^5aAeb").ok());
        assert_eq!(policy.evaluate(body), None);
    }

    #[test]
    fn test_invalid_regex() {
        assert!(AddressRegex::new("(unclosed").is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(MatchLabel::Custom.to_string(), "custom");
        assert_eq!(MatchLabel::Palindrome.to_string(), "palindrome");
        assert_eq!(
            MatchLabel::Structural(RuleId::RepeatedByte).to_string(),
            "repeated_byte"
        );
    }
}
