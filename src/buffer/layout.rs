//! Arena placement arithmetic
//!
//! Entries are laid out back to back in a flat byte arena. While the buffer
//! has not wrapped, live data sits in one run:
//!
//! ```text
//! 0          tail                    head_end       capacity
//! |  free    | oldest ... newest     |   free        |
//! ```
//!
//! Once an entry restarts at offset 0 the live data is split in two runs and
//! the only free space is the gap between them:
//!
//! ```text
//! 0                  head_end     tail                       capacity
//! | newer ... newest |   free     | oldest ... older | unused |
//! ```
//!
//! An entry is never split across the physical end of the arena. Everything
//! here is a pure function of offsets and sizes; the ring buffer applies the
//! result.

/// Bytes of bookkeeping stored in front of every entry (sequence + length)
pub const ENTRY_HEADER_SIZE: usize = 8 + 4;

/// Arena bytes consumed by an entry with `len` payload bytes
pub fn entry_size(len: usize) -> usize {
    ENTRY_HEADER_SIZE + len
}

/// Outcome of a placement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Entry fits at this offset
    At(usize),
    /// Not enough contiguous room; evict the oldest entry and retry
    EvictTail,
}

/// Decide where an entry of `size` arena bytes goes
///
/// `tail` is the offset of the oldest live entry (`None` when empty) and
/// `head_end` the offset just past the newest one. `size` must not exceed
/// `capacity`.
pub fn place(capacity: usize, tail: Option<usize>, head_end: usize, size: usize) -> Placement {
    debug_assert!(size <= capacity);

    let Some(tail) = tail else {
        return Placement::At(0);
    };

    if tail < head_end {
        // Single run: room after the head, else restart at 0 in front of the tail
        if head_end + size <= capacity {
            Placement::At(head_end)
        } else if size <= tail {
            Placement::At(0)
        } else {
            Placement::EvictTail
        }
    } else if head_end + size <= tail {
        Placement::At(head_end)
    } else {
        Placement::EvictTail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_places_at_start() {
        assert_eq!(place(100, None, 60, 40), Placement::At(0));
        assert_eq!(place(100, None, 0, 100), Placement::At(0));
    }

    #[test]
    fn test_appends_after_head() {
        assert_eq!(place(100, Some(0), 30, 20), Placement::At(30));
        assert_eq!(place(100, Some(0), 80, 20), Placement::At(80));
    }

    #[test]
    fn test_wraps_to_start_when_tail_left_room() {
        assert_eq!(place(100, Some(40), 90, 20), Placement::At(0));
        assert_eq!(place(100, Some(40), 90, 40), Placement::At(0));
    }

    #[test]
    fn test_evicts_when_neither_end_has_room() {
        assert_eq!(place(100, Some(10), 90, 20), Placement::EvictTail);
        assert_eq!(place(100, Some(0), 100, 1), Placement::EvictTail);
    }

    #[test]
    fn test_wrapped_gap() {
        // Live runs [50, 100) and [0, 20); the gap is [20, 50)
        assert_eq!(place(100, Some(50), 20, 30), Placement::At(20));
        assert_eq!(place(100, Some(50), 20, 31), Placement::EvictTail);
    }

    #[test]
    fn test_full_wrapped_buffer_evicts() {
        assert_eq!(place(100, Some(40), 40, 1), Placement::EvictTail);
    }

    #[test]
    fn test_entry_size_accounts_for_header() {
        assert_eq!(entry_size(0), ENTRY_HEADER_SIZE);
        assert_eq!(entry_size(4), 16);
    }
}
