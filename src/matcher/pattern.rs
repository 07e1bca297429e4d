//! Custom prefix/suffix pattern and the palindrome check.

/// A compiled prefix+suffix pattern for efficient matching.
///
/// Both parts are stored lowercase and compared against the lowercase body,
/// so matching is case-insensitive regardless of checksum rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomPattern {
    prefix: String,
    suffix: String,
}

impl CustomPattern {
    /// Creates a new pattern. Either part may be empty.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().to_ascii_lowercase(),
            suffix: suffix.into().to_ascii_lowercase(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// True when neither a prefix nor a suffix was given; such a pattern
    /// accepts every address.
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    /// Matches a lowercase address body (no `0x`).
    #[inline]
    pub fn matches(&self, body: &str) -> bool {
        body.starts_with(&self.prefix) && body.ends_with(&self.suffix)
    }

    /// Returns the estimated difficulty (number of attempts to find a match).
    ///
    /// Each fixed hex digit has 16 possible values, so the expected number of
    /// attempts is 16^n where n is the combined pattern length.
    pub fn estimated_difficulty(&self) -> u64 {
        let total_len = self.prefix.len() + self.suffix.len();
        16u64.saturating_pow(total_len as u32)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let diff = self.estimated_difficulty();
        match diff {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

/// True iff the character at every position `i` equals the one at `len-1-i`.
pub fn is_palindrome(s: &str) -> bool {
    let mut forward = s.chars();
    let mut backward = s.chars().rev();
    let half = s.chars().count() / 2;
    (0..half).all(|_| forward.next() == backward.next())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "deadbeef00000000000000000000000000c0ffee";

    #[test]
    fn test_prefix_and_suffix_match() {
        assert!(CustomPattern::new("dead", "ffee").matches(BODY));
        assert!(CustomPattern::new("DEAD", "").matches(BODY));
        assert!(CustomPattern::new("", "C0FFEE").matches(BODY));
    }

    #[test]
    fn test_no_match() {
        assert!(!CustomPattern::new("beef", "").matches(BODY));
        assert!(!CustomPattern::new("dead", "dead").matches(BODY));
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        let pattern = CustomPattern::new("", "");
        assert!(pattern.is_empty());
        assert!(pattern.matches(BODY));
    }

    #[test]
    fn test_difficulty() {
        let pattern = CustomPattern::new("dead", "");
        assert_eq!(pattern.estimated_difficulty(), 65536); // 16^4
        assert_eq!(CustomPattern::new("ab", "cd").estimated_difficulty(), 65536);
    }

    #[test]
    fn test_palindrome() {
        assert!(is_palindrome(""));
        assert!(is_palindrome("a"));
        assert!(is_palindrome("abccba"));
        assert!(is_palindrome("abcba"));
        assert!(!is_palindrome("abcabc"));
        assert!(!is_palindrome("Abba"));
    }
}
