//! Bounded ring buffer of sequenced entries

use std::collections::VecDeque;

use bytes::{Buf, BufMut};

use super::cursor::{Cursor, Entries};
use super::layout::{entry_size, place, Placement, ENTRY_HEADER_SIZE};
use crate::error::BufferError;

/// Fixed-capacity append-only log
///
/// Every write gets the next sequence number (starting at 1, never reused).
/// When the arena is full the oldest entries are evicted until the new one
/// fits contiguously. Each entry carries its sequence and length in the
/// arena; the ring itself only remembers where entries start.
#[derive(Debug)]
pub struct RingBuffer {
    arena: Box<[u8]>,
    /// Arena offsets of live entries, oldest first
    slots: VecDeque<usize>,
    head_end: usize,
    live_bytes: usize,
    next_sequence: u64,
    evicted: u64,
}

impl RingBuffer {
    /// Create a ring buffer with `capacity` arena bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: vec![0u8; capacity].into_boxed_slice(),
            slots: VecDeque::new(),
            head_end: 0,
            live_bytes: 0,
            next_sequence: 1,
            evicted: 0,
        }
    }

    /// Append one entry, evicting the oldest ones as needed
    ///
    /// Returns the sequence number assigned to the entry. On error the
    /// buffer is left untouched.
    pub fn write(&mut self, data: &[u8]) -> Result<u64, BufferError> {
        let size = entry_size(data.len());
        if size > self.capacity() || u32::try_from(data.len()).is_err() {
            return Err(BufferError::CapacityExceeded {
                size,
                capacity: self.capacity(),
            });
        }

        let offset = loop {
            let tail = self.slots.front().copied();
            match place(self.capacity(), tail, self.head_end, size) {
                Placement::At(offset) => break offset,
                Placement::EvictTail => self.evict_oldest(),
            }
        };

        let sequence = self.next_sequence;
        let mut entry = &mut self.arena[offset..offset + size];
        entry.put_u64_le(sequence);
        entry.put_u32_le(data.len() as u32);
        entry.put_slice(data);

        self.slots.push_back(offset);
        self.head_end = offset + size;
        self.live_bytes += size;
        self.next_sequence += 1;

        Ok(sequence)
    }

    fn evict_oldest(&mut self) {
        if let Some(offset) = self.slots.pop_front() {
            let (_, len) = self.header_at(offset);
            self.live_bytes -= entry_size(len);
            self.evicted += 1;
        }
        if self.slots.is_empty() {
            self.head_end = 0;
        }
    }

    /// Sequence and payload length stored in front of the entry at `offset`
    fn header_at(&self, offset: usize) -> (u64, usize) {
        let mut header = &self.arena[offset..offset + ENTRY_HEADER_SIZE];
        (header.get_u64_le(), header.get_u32_le() as usize)
    }

    /// Payload of the entry with `sequence`, if it is still retained
    pub fn get(&self, sequence: u64) -> Option<&[u8]> {
        let oldest = self.oldest_sequence()?;
        if sequence < oldest {
            return None;
        }
        let offset = *self.slots.get((sequence - oldest) as usize)?;
        let (stored, len) = self.header_at(offset);
        if stored != sequence {
            return None;
        }

        let start = offset + ENTRY_HEADER_SIZE;
        Some(&self.arena[start..start + len])
    }

    /// Cursor positioned before the oldest retained entry
    pub fn cursor(&self) -> Cursor {
        Cursor::at_tail(self)
    }

    /// Iterate over the retained entries, oldest first
    pub fn iter(&self) -> Entries<'_> {
        Entries::new(self, self.cursor())
    }

    /// Sequence of the oldest retained entry
    pub fn oldest_sequence(&self) -> Option<u64> {
        self.slots.front().map(|&offset| self.header_at(offset).0)
    }

    /// Sequence of the newest entry
    pub fn newest_sequence(&self) -> Option<u64> {
        self.slots.back().map(|&offset| self.header_at(offset).0)
    }

    /// Sequence the next write will receive
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Arena size in bytes
    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Arena bytes held by live entries (headers included)
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total entries evicted since creation
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word(ring: &RingBuffer, cursor: &mut Cursor) -> Option<u32> {
        let mut out = Vec::new();
        cursor.read_next(ring, &mut out)?;
        Some(u32::from_le_bytes(out[..4].try_into().unwrap()))
    }

    #[test]
    fn test_entry_header_lives_in_arena() {
        let mut ring = RingBuffer::new(64);
        ring.write(b"ab").unwrap();
        ring.write(b"cde").unwrap();

        let second = ring.slots[1];
        assert_eq!(second, entry_size(2));
        assert_eq!(ring.header_at(second), (2, 3));
        assert_eq!(&ring.arena[second..second + 8], &2u64.to_le_bytes());

        // Stale offset: a header that disagrees with the requested sequence is not returned
        ring.arena[second..second + 8].copy_from_slice(&9u64.to_le_bytes());
        assert_eq!(ring.get(2), None);
        assert_eq!(ring.get(1), Some(&b"ab"[..]));
    }

    #[test]
    fn test_cursor_created_before_insert() {
        let mut ring = RingBuffer::new(100 * 4);
        let mut cursor = ring.cursor();

        ring.write(&1234u32.to_le_bytes()).unwrap();
        assert_eq!(word(&ring, &mut cursor), Some(1234));
        assert_eq!(word(&ring, &mut cursor), None);
    }

    #[test]
    fn test_mixed_inserts_and_reads() {
        let mut ring = RingBuffer::new(100 * 4);
        let mut cursor = ring.cursor();

        ring.write(&1u32.to_le_bytes()).unwrap();
        assert_eq!(word(&ring, &mut cursor), Some(1));
        ring.write(&2u32.to_le_bytes()).unwrap();
        assert_eq!(word(&ring, &mut cursor), Some(2));
    }

    #[test]
    fn test_multiple_cursors_are_independent() {
        let mut ring = RingBuffer::new(100 * 4);
        ring.write(&1u32.to_le_bytes()).unwrap();

        let mut first = ring.cursor();
        ring.write(&2u32.to_le_bytes()).unwrap();
        assert_eq!(word(&ring, &mut first), Some(1));
        assert_eq!(word(&ring, &mut first), Some(2));

        ring.write(&3u32.to_le_bytes()).unwrap();
        let mut second = ring.cursor();
        assert_eq!(word(&ring, &mut second), Some(1));
        assert_eq!(word(&ring, &mut second), Some(2));
        assert_eq!(word(&ring, &mut second), Some(3));
        assert_eq!(word(&ring, &mut first), Some(3));
    }

    #[test]
    fn test_buffer_wraps_around() {
        let mut ring = RingBuffer::new(200 * 4);
        let mut cursor = ring.cursor();

        for j in 1..=201u32 {
            ring.write(&(10 * j).to_le_bytes()).unwrap();
        }
        assert!(ring.evicted() > 0);
        assert!(ring.live_bytes() <= ring.capacity());

        let mut prev = word(&ring, &mut cursor).unwrap();
        assert!(prev > 0 && prev <= 2010);
        while prev != 2010 {
            let next = word(&ring, &mut cursor).unwrap();
            assert_eq!(prev + 10, next);
            prev = next;
        }
        assert_eq!(word(&ring, &mut cursor), None);
    }

    #[test]
    fn test_sequences_start_at_one() {
        let mut ring = RingBuffer::new(64);
        assert_eq!(ring.next_sequence(), 1);
        assert_eq!(ring.write(b"a").unwrap(), 1);
        assert_eq!(ring.write(b"b").unwrap(), 2);
        assert_eq!(ring.oldest_sequence(), Some(1));
        assert_eq!(ring.newest_sequence(), Some(2));
        assert_eq!(ring.get(2), Some(&b"b"[..]));
        assert_eq!(ring.get(3), None);
    }

    #[test]
    fn test_oversized_write_leaves_buffer_unchanged() {
        let mut ring = RingBuffer::new(32);
        ring.write(b"keep").unwrap();

        let err = ring.write(&[0u8; 32]).unwrap_err();
        assert_eq!(
            err,
            BufferError::CapacityExceeded {
                size: 32 + ENTRY_HEADER_SIZE,
                capacity: 32
            }
        );
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.next_sequence(), 2);
        assert_eq!(ring.get(1), Some(&b"keep"[..]));
    }

    #[test]
    fn test_entry_filling_whole_arena() {
        let mut ring = RingBuffer::new(entry_size(20));
        ring.write(&[1u8; 20]).unwrap();
        ring.write(&[2u8; 20]).unwrap();
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.oldest_sequence(), Some(2));
        assert_eq!(ring.live_bytes(), ring.capacity());
    }

    #[test]
    fn test_iter_yields_retained_entries() {
        let mut ring = RingBuffer::new(entry_size(4) * 3);
        for i in 0..5u8 {
            ring.write(&[i; 4]).unwrap();
        }
        let seen: Vec<u64> = ring.iter().map(|entry| entry.sequence).collect();
        assert_eq!(seen, vec![3, 4, 5]);
    }

    proptest! {
        #[test]
        fn live_bytes_bounded_and_survivors_are_newest(
            capacity in 64usize..512,
            lens in prop::collection::vec(0usize..64, 1..200),
        ) {
            let mut ring = RingBuffer::new(capacity);
            let mut written: Vec<(u64, Vec<u8>)> = Vec::new();

            for (i, len) in lens.into_iter().enumerate() {
                let data = vec![i as u8; len];
                match ring.write(&data) {
                    Ok(seq) => written.push((seq, data)),
                    Err(BufferError::CapacityExceeded { size, .. }) => {
                        prop_assert!(size > capacity);
                        continue;
                    }
                }

                prop_assert!(ring.live_bytes() <= capacity);

                // Survivors are a contiguous run ending at the newest write
                let oldest = ring.oldest_sequence().unwrap();
                prop_assert_eq!(ring.newest_sequence(), Some(written.last().unwrap().0));
                let survivors: Vec<_> = written.iter().filter(|(seq, _)| *seq >= oldest).collect();
                prop_assert_eq!(survivors.len(), ring.len());
                for (seq, data) in survivors {
                    prop_assert_eq!(ring.get(*seq), Some(&data[..]));
                }

                let accounted: usize = ring.iter().map(|entry| entry_size(entry.data.len())).sum();
                prop_assert_eq!(accounted, ring.live_bytes());
            }
        }

        #[test]
        fn starved_cursor_resyncs_to_tail(
            lens in prop::collection::vec(1usize..40, 10..100),
        ) {
            let mut ring = RingBuffer::new(128);
            let mut cursor = ring.cursor();
            ring.write(b"first").unwrap();

            for len in lens {
                ring.write(&vec![0xaa; len]).unwrap();
            }

            let oldest = ring.oldest_sequence().unwrap();
            let entry = cursor.next_entry(&ring).unwrap();
            prop_assert_eq!(entry.sequence, oldest);
            prop_assert_eq!(entry.missed, oldest - 1);

            let mut last = entry.sequence;
            while let Some(entry) = cursor.next_entry(&ring) {
                prop_assert_eq!(entry.sequence, last + 1);
                prop_assert_eq!(entry.missed, 0);
                last = entry.sequence;
            }
            prop_assert_eq!(Some(last), ring.newest_sequence());
        }
    }
}
