//! Profanity checking and text cleaning
//!
//! Rooms only see the [`ContentFilter`] trait so tests can swap in a
//! deterministic filter.

use rustrict::CensorStr;

pub trait ContentFilter: Send + Sync {
    /// True if the text should be rejected outright
    fn is_profane(&self, text: &str) -> bool;

    /// Censor offending words while keeping the rest of the text
    fn clean(&self, text: &str) -> String;
}

/// Filter backed by the `rustrict` word lists
#[derive(Debug, Default, Clone, Copy)]
pub struct RustrictFilter;

impl ContentFilter for RustrictFilter {
    fn is_profane(&self, text: &str) -> bool {
        text.is_inappropriate()
    }

    fn clean(&self, text: &str) -> String {
        text.censor()
    }
}

/// Filter with an explicit blocklist, used in tests
#[derive(Debug, Default, Clone)]
pub struct WordListFilter {
    words: Vec<String>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(|w| w.into().to_lowercase()).collect(),
        }
    }
}

impl ContentFilter for WordListFilter {
    fn is_profane(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.words.iter().any(|w| lowered.contains(w.as_str()))
    }

    fn clean(&self, text: &str) -> String {
        text.split(' ')
            .map(|word| {
                if self.is_profane(word) {
                    "*".repeat(word.chars().count())
                } else {
                    word.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
