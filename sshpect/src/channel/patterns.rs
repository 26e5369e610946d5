//! Match targets for the buffered read loop.
//!
//! A target is evaluated against the full current buffer on every poll.
//! Regex state is never carried across polls, so a match split over chunk
//! boundaries is found on the first poll after its last byte arrives.

use log::warn;
use memchr::memmem;
use regex::bytes::Regex;

use crate::error::ChannelError;

/// Where a target matched in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    /// Byte offset where the matched text starts.
    pub start: usize,
    /// Byte offset just past the matched text.
    pub end: usize,
    /// Index of the winning pattern in the caller's list (0 for
    /// single-target reads).
    pub index: usize,
}

/// A compiled match target: literal bytes, one regex, or an ordered list of
/// regexes where the first in list order to match wins.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact byte substring, located with a substring search.
    Literal(Vec<u8>),
    /// Single compiled regex.
    Regex(Regex),
    /// Ordered alternatives; each entry keeps the index the caller gave it.
    Any(Vec<(usize, Regex)>),
}

impl Pattern {
    /// Target an exact byte substring.
    pub fn literal(text: impl AsRef<[u8]>) -> Self {
        Self::Literal(text.as_ref().to_vec())
    }

    /// Compile a single regex target. Fails on an invalid pattern.
    pub fn regex(pattern: &str) -> Result<Self, ChannelError> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    /// Compile an ordered list of regex targets.
    ///
    /// Invalid entries are logged and skipped; surviving entries keep their
    /// original list index so the reported winner lines up with the caller's
    /// list. Fails if nothing compiles, since such a wait could never match.
    pub fn any<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ChannelError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for (index, pattern) in patterns.iter().enumerate() {
            let pattern = pattern.as_ref();
            match Regex::new(pattern) {
                Ok(re) => compiled.push((index, re)),
                Err(err) => {
                    warn!("skipping invalid pattern [{index}] {pattern:?}: {err}");
                }
            }
        }
        if compiled.is_empty() {
            return Err(ChannelError::NoValidPatterns);
        }
        Ok(Self::Any(compiled))
    }

    /// Search the buffer for this target.
    ///
    /// For a list, alternatives are tried in list order and the first that
    /// matches anywhere wins, even when a later alternative matches at an
    /// earlier byte offset.
    pub fn find(&self, haystack: &[u8]) -> Option<PatternMatch> {
        match self {
            Self::Literal(needle) => memmem::find(haystack, needle).map(|start| PatternMatch {
                start,
                end: start + needle.len(),
                index: 0,
            }),
            Self::Regex(re) => re.find(haystack).map(|m| PatternMatch {
                start: m.start(),
                end: m.end(),
                index: 0,
            }),
            Self::Any(alternatives) => alternatives.iter().find_map(|(index, re)| {
                re.find(haystack).map(|m| PatternMatch {
                    start: m.start(),
                    end: m.end(),
                    index: *index,
                })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match_offsets() {
        let target = Pattern::literal("$ ");
        let hit = target.find(b"output\n$ rest").unwrap();
        assert_eq!(hit.start, 7);
        assert_eq!(hit.end, 9);
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn test_literal_no_match() {
        let target = Pattern::literal("# ");
        assert!(target.find(b"still waiting").is_none());
    }

    #[test]
    fn test_regex_match_offsets() {
        let target = Pattern::regex(r"\$\s$").unwrap();
        let hit = target.find(b"output\n$ ").unwrap();
        assert_eq!(hit.start, 7);
        assert_eq!(hit.end, 9);
    }

    #[test]
    fn test_regex_invalid_fails_fast() {
        assert!(matches!(
            Pattern::regex(r"unclosed["),
            Err(ChannelError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_list_order_beats_match_position() {
        // "continue" matches earlier in the buffer, but "password" comes
        // first in the list, so it wins.
        let target = Pattern::any(&["password:", "continue\\?"]).unwrap();
        let hit = target.find(b"continue? ...\npassword: ").unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(&b"continue? ...\npassword: "[hit.start..hit.end], b"password:");
    }

    #[test]
    fn test_list_falls_through_to_later_entry() {
        let target = Pattern::any(&["password:", "continue\\?"]).unwrap();
        let hit = target.find(b"continue? ").unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn test_invalid_list_entry_keeps_original_indices() {
        let target = Pattern::any(&["unclosed[", "ok"]).unwrap();
        let hit = target.find(b"ok then").unwrap();
        // Entry 0 was skipped at compile time; the winner still reports 1.
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn test_all_invalid_list_is_an_error() {
        assert!(matches!(
            Pattern::any(&["unclosed[", "*bad"]),
            Err(ChannelError::NoValidPatterns)
        ));
    }

    #[test]
    fn test_empty_list_is_an_error() {
        let none: [&str; 0] = [];
        assert!(matches!(
            Pattern::any(&none),
            Err(ChannelError::NoValidPatterns)
        ));
    }
}
