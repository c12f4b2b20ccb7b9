//! Validity filtering of recognized caption text.
//!
//! OCR on anime-style frames produces plenty of gibberish; this filter keeps
//! only text that is plausibly an English caption. Whitelisted captions
//! bypass every rule, which is how known-good short phrases survive.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CapvoiceError, Result};

static PURELY_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Reference English wordlist with case-insensitive membership.
///
/// Loaded once at startup and passed into the filter; the filter itself does
/// no I/O.
#[derive(Debug, Clone)]
pub struct Wordlist {
    words: HashSet<String>,
}

impl Wordlist {
    /// Loads a wordlist file, one word per line.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CapvoiceError::Configuration(format!(
                "cannot read wordlist {}: {}",
                path.display(),
                e
            ))
        })?;
        let words = content
            .lines()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Ok(Self { words })
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Decides whether a detection is plausible caption text.
///
/// Pure predicate over the text: no side effects, no I/O.
#[derive(Debug, Clone)]
pub struct ValidityFilter {
    wordlist: Wordlist,
    whitelist: HashSet<String>,
}

impl ValidityFilter {
    pub fn new<I, S>(wordlist: Wordlist, whitelist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            wordlist,
            whitelist: whitelist.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the text looks like a real caption.
    ///
    /// Whitelisted text is valid regardless of the length and token rules.
    /// Otherwise text shorter than 3 characters, purely numeric text and
    /// single-token text is rejected, and the remainder must have more than
    /// half of its whitespace tokens in the wordlist or whitelist.
    pub fn is_valid(&self, text: &str) -> bool {
        let text = text.trim();
        if self.whitelist.contains(text) {
            return true;
        }
        if text.chars().count() < 3 || PURELY_NUMERIC.is_match(text) {
            return false;
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() <= 1 {
            return false;
        }
        let known = tokens
            .iter()
            .copied()
            .filter(|t| self.wordlist.contains(t) || self.whitelist.contains(*t))
            .count();
        known as f64 / tokens.len() as f64 > 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ValidityFilter {
        let wordlist = Wordlist::from_words(["hello", "world", "goodbye", "now", "the"]);
        ValidityFilter::new(wordlist, ["At Onigashima"])
    }

    #[test]
    fn whitelist_bypasses_all_rules() {
        // Two tokens, zero dictionary words: only the whitelist saves it.
        assert!(filter().is_valid("At Onigashima"));
    }

    #[test]
    fn rejects_short_numeric_and_single_token() {
        let f = filter();
        assert!(!f.is_valid("ab"));
        assert!(!f.is_valid("12345"));
        assert!(!f.is_valid("hello"));
    }

    #[test]
    fn accepts_mostly_english_text() {
        assert!(filter().is_valid("HELLO WORLD"));
        assert!(filter().is_valid("hello world xyzzy"));
    }

    #[test]
    fn exact_half_fraction_is_rejected() {
        // One of two tokens is a dictionary word: 0.5 is not > 0.5.
        assert!(!filter().is_valid("hello xyzzy"));
    }

    #[test]
    fn rejects_gibberish() {
        assert!(!filter().is_valid("qwfp zxcv arst"));
    }

    #[test]
    fn is_idempotent_on_accepted_text() {
        let f = filter();
        let text = "hello world";
        assert!(f.is_valid(text));
        assert!(f.is_valid(text));
    }

    #[test]
    fn whitelisted_tokens_count_toward_the_fraction() {
        // "Onigashima" is not in the wordlist, but whitelisting it as a
        // token makes 2 of 3 tokens known.
        let wordlist = Wordlist::from_words(["the"]);
        let f = ValidityFilter::new(wordlist, ["Onigashima"]);
        assert!(f.is_valid("the Onigashima raid"));
        assert!(!f.is_valid("a Onigashima raid"));
    }

    #[test]
    fn wordlist_membership_is_case_insensitive() {
        let f = filter();
        assert!(f.is_valid("Hello World"));
        assert!(f.is_valid("HELLO WORLD"));
    }
}
