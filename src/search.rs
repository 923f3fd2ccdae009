//! Incremental forward text search over loaded part content.

use memchr::memmem;

/// A single match: byte offset of its start and length of the needle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub len: usize,
}

/// Forward substring search with wraparound.
///
/// The cursor remembers where the previous match ended, so repeated
/// `find_next` calls walk through every occurrence in order. A miss
/// resets the cursor to the start of the text: the call itself returns
/// no match, and the next one searches from the beginning again. The
/// host keeps one cursor per loaded text, replacing it when the text
/// changes.
#[derive(Debug)]
pub struct SearchCursor {
    text: String,
    last_match_end: usize,
}

impl SearchCursor {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            last_match_end: 0,
        }
    }

    /// The text being searched.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Find the next occurrence of `needle` at or after the end of the
    /// previous match.
    ///
    /// An empty needle never matches and leaves the cursor untouched.
    /// Offsets are byte offsets into `text`.
    pub fn find_next(&mut self, needle: &str) -> Option<Match> {
        if needle.is_empty() {
            return None;
        }
        let haystack = &self.text.as_bytes()[self.last_match_end..];
        match memmem::find(haystack, needle.as_bytes()) {
            Some(offset) => {
                let start = self.last_match_end + offset;
                self.last_match_end = start + needle.len();
                Some(Match {
                    start,
                    len: needle.len(),
                })
            }
            None => {
                self.last_match_end = 0;
                None
            }
        }
    }

    /// Restart the search from the beginning of the text.
    pub fn reset(&mut self) {
        self.last_match_end = 0;
    }
}
