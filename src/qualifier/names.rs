//! Loose participant-name matching.
//!
//! Historical rows often carry sponsor suffixes or abbreviations that differ
//! from the current event's canonical name, so two names match when one
//! normalised form contains the other.

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// True when `a` and `b` refer to the same participant: equal after
/// lower-casing and trimming, or one is a substring of the other.
/// Empty names never match.
pub fn matches(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_case_insensitive() {
        assert!(matches("Legia Warszawa", "legia warszawa"));
        assert!(matches("  Arsenal ", "ARSENAL"));
    }

    #[test]
    fn test_substring_either_direction() {
        assert!(matches("Real Madrid", "Real Madrid B"));
        assert!(matches("Real Madrid B", "Real Madrid"));
        assert!(!matches("Chelsea", "Arsenal"));
    }

    #[test]
    fn test_empty_never_matches() {
        assert!(!matches("", "Arsenal"));
        assert!(!matches("Arsenal", "   "));
        assert!(!matches("", ""));
    }
}
