//! Reader cursors over a ring buffer
//!
//! A cursor only remembers the last sequence it returned, so it never holds
//! a reference into the arena between reads. If that sequence has been
//! evicted in the meantime the cursor skips forward to the oldest retained
//! entry and reports how many it missed.

use super::ring::RingBuffer;

/// One entry returned by a cursor
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub sequence: u64,
    pub data: &'a [u8],
    /// Entries evicted before this cursor could read them
    pub missed: u64,
}

/// Result of [`Cursor::read_next`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadInfo {
    pub sequence: u64,
    pub len: usize,
    pub missed: u64,
}

/// Reader-owned position in a ring buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    last_seen: u64,
}

impl Cursor {
    /// Position before the oldest retained entry
    pub fn at_tail(ring: &RingBuffer) -> Self {
        let first = ring.oldest_sequence().unwrap_or_else(|| ring.next_sequence());
        Self {
            last_seen: first - 1,
        }
    }

    /// Position after the newest entry; only later writes are seen
    pub fn at_head(ring: &RingBuffer) -> Self {
        Self {
            last_seen: ring.next_sequence() - 1,
        }
    }

    /// Position before `sequence`
    ///
    /// If `sequence` has already been evicted the first read resynchronizes
    /// to the tail.
    pub fn at_sequence(sequence: u64) -> Self {
        Self {
            last_seen: sequence.saturating_sub(1),
        }
    }

    /// Last sequence handed out (0 before the first read)
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Advance to the next entry newer than the last one seen
    pub fn next_entry<'a>(&mut self, ring: &'a RingBuffer) -> Option<Entry<'a>> {
        let mut wanted = self.last_seen + 1;
        if wanted >= ring.next_sequence() {
            return None;
        }

        let oldest = ring.oldest_sequence()?;
        let mut missed = 0;
        if wanted < oldest {
            missed = oldest - wanted;
            tracing::debug!(missed, resume_at = oldest, "Cursor fell behind, skipping evicted entries");
            wanted = oldest;
        }

        let data = ring.get(wanted)?;
        self.last_seen = wanted;
        Some(Entry {
            sequence: wanted,
            data,
            missed,
        })
    }

    /// Copy the next entry into `out`, replacing its contents
    pub fn read_next(&mut self, ring: &RingBuffer, out: &mut Vec<u8>) -> Option<ReadInfo> {
        let entry = self.next_entry(ring)?;
        out.clear();
        out.extend_from_slice(entry.data);
        Some(ReadInfo {
            sequence: entry.sequence,
            len: entry.data.len(),
            missed: entry.missed,
        })
    }
}

/// Borrowing iterator built from a cursor
pub struct Entries<'a> {
    ring: &'a RingBuffer,
    cursor: Cursor,
}

impl<'a> Entries<'a> {
    pub fn new(ring: &'a RingBuffer, cursor: Cursor) -> Self {
        Self { ring, cursor }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_entry(self.ring)
    }
}
