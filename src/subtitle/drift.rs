//! Drift guard: bounds how much a cleanup revision may change a caption.
//!
//! This is a coarse length check, not a semantic one. It compares token
//! counts only, so a revision that replaces every word but keeps the length
//! passes. That is an intentional simplification: the check exists to catch
//! cleanup responses that add commentary, apologize or refuse, all of which
//! change the length drastically.

/// Accepts a revision when its token count stays within a relative delta of
/// the original's.
#[derive(Debug, Clone)]
pub struct DriftGuard {
    max_relative_delta: f64,
}

impl Default for DriftGuard {
    fn default() -> Self {
        Self {
            max_relative_delta: 0.2,
        }
    }
}

impl DriftGuard {
    pub fn new(max_relative_delta: f64) -> Self {
        Self { max_relative_delta }
    }

    /// Returns true if `revised` preserves enough of `original`.
    ///
    /// The boundary is inclusive: a relative delta of exactly the limit is
    /// accepted. An empty revision is always rejected.
    pub fn is_acceptable_revision(&self, original: &str, revised: &str) -> bool {
        let original_tokens = original.split_whitespace().count();
        let revised_tokens = revised.split_whitespace().count();
        if original_tokens == 0 || revised_tokens == 0 {
            return false;
        }
        let delta =
            (original_tokens as f64 - revised_tokens as f64).abs() / original_tokens as f64;
        delta <= self.max_relative_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_token_count_passes() {
        let guard = DriftGuard::default();
        assert!(guard.is_acceptable_revision("one two three", "uno dos tres"));
    }

    #[test]
    fn boundary_delta_is_accepted() {
        let guard = DriftGuard::default();
        // 5 tokens -> 4 tokens is a delta of exactly 0.2.
        assert!(guard.is_acceptable_revision("a b c d e", "a b c d"));
        // 5 -> 6 is also exactly 0.2.
        assert!(guard.is_acceptable_revision("a b c d e", "a b c d e f"));
    }

    #[test]
    fn excessive_delta_is_rejected() {
        let guard = DriftGuard::default();
        // 5 -> 3 is a delta of 0.4.
        assert!(!guard.is_acceptable_revision("a b c d e", "a b c"));
        // A refusal is much longer than a short caption.
        assert!(!guard.is_acceptable_revision(
            "GO NOW",
            "I cannot clean this subtitle without additional context about it"
        ));
    }

    #[test]
    fn empty_revision_is_rejected() {
        let guard = DriftGuard::default();
        assert!(!guard.is_acceptable_revision("a b c", ""));
        assert!(!guard.is_acceptable_revision("a b c", "   "));
    }
}
