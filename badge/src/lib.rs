use once_cell::sync::Lazy;
use regex::Regex;

static UNREAD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+)\)").unwrap());

/// Extracts an unread count from a page title.
///
/// The hosted page encodes the count as a parenthesized number
/// somewhere in the title, leading or trailing other text. This is a
/// best-effort heuristic over an unstable format: the leftmost match
/// wins, and anything unparseable means no badge.
pub fn derive_badge(title: &str) -> Option<u32> {
    UNREAD_RE
        .captures(title)
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_count() {
        assert_eq!(derive_badge("(3) Messenger"), Some(3));
    }

    #[test]
    fn trailing_count() {
        assert_eq!(derive_badge("Messenger (12)"), Some(12));
    }

    #[test]
    fn no_count_clears_the_badge() {
        assert_eq!(derive_badge("Messenger"), None);
        assert_eq!(derive_badge(""), None);
    }

    #[test]
    fn leftmost_match_wins() {
        assert_eq!(derive_badge("(3) (7) Chat"), Some(3));
    }

    #[test]
    fn non_numeric_parentheticals_are_skipped() {
        assert_eq!(derive_badge("Messenger (beta)"), None);
        assert_eq!(derive_badge("Messenger (beta) (4)"), Some(4));
    }

    #[test]
    fn absurd_counts_do_not_panic() {
        assert_eq!(derive_badge("(99999999999999999999) Messenger"), None);
    }
}
