//! Incremental `read_dir(n)` over a materialized listing.
//!
//! The asymmetry between the two modes is deliberate and matches the usual
//! directory-handle contract:
//!
//! | call | entries remain | at end |
//! |------|----------------|--------|
//! | `n > 0` | up to `n` entries | [`DirPage::EndOfStream`] |
//! | `n == 0` | all remaining entries | empty [`DirPage::Entries`] |

use crate::DirEntry;

/// Result of one `read_dir` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirPage {
    /// Entries from the current offset (possibly empty when reading all).
    Entries(Vec<DirEntry>),
    /// A bounded read found nothing left.
    EndOfStream,
}

impl DirPage {
    /// Returns `true` for [`DirPage::EndOfStream`].
    pub fn is_end(&self) -> bool {
        matches!(self, DirPage::EndOfStream)
    }

    /// The entries; empty at end of stream.
    pub fn into_entries(self) -> Vec<DirEntry> {
        match self {
            DirPage::Entries(entries) => entries,
            DirPage::EndOfStream => Vec::new(),
        }
    }

    /// Number of entries returned.
    pub fn len(&self) -> usize {
        match self {
            DirPage::Entries(entries) => entries.len(),
            DirPage::EndOfStream => 0,
        }
    }

    /// Returns `true` if no entries were returned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Offset into a fully populated child list.
///
/// Invariant: `offset <= entries.len()`, and it never decreases.
#[derive(Debug)]
pub(crate) struct DirCursor {
    entries: Vec<DirEntry>,
    offset: usize,
}

impl DirCursor {
    pub(crate) fn new(entries: Vec<DirEntry>) -> Self {
        Self { entries, offset: 0 }
    }

    /// Serve the next batch. `n == 0` means everything that remains.
    pub(crate) fn next_page(&mut self, n: usize) -> DirPage {
        let remaining = self.entries.len() - self.offset;
        if n > 0 && remaining == 0 {
            return DirPage::EndOfStream;
        }
        let take = if n == 0 { remaining } else { n.min(remaining) };
        let start = self.offset;
        self.offset += take;
        tracing::trace!(start, take, total = self.entries.len(), "read_dir batch");
        DirPage::Entries(self.entries[start..self.offset].to_vec())
    }

    pub(crate) fn remaining(&self) -> usize {
        self.entries.len() - self.offset
    }
}
