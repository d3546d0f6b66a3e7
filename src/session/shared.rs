//! State shared between the writer thread and channels
//!
//! Two locks, always taken in this order:
//!
//! 1. `state`, a reader-writer lock over the ring buffer and the lifecycle
//!    flags. The writer holds it exclusively only for an append; readers
//!    hold it shared while they look for the next entry.
//! 2. `signal`, a plain mutex that exists only to pair with `cond`.
//!
//! A reader that finds nothing new takes `signal` before it lets go of
//! `state`, then parks on `cond`. Every state change is published first and
//! announced afterwards by [`Shared::broadcast`], which needs `signal`, so a
//! change can never slip in between a reader's last check and its wait.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex, RwLock};

use crate::buffer::RingBuffer;
use crate::error::BufferError;
use crate::stats::SessionStats;

/// Ring buffer plus lifecycle flags, guarded by one lock
#[derive(Debug)]
pub(crate) struct Inner {
    pub ring: RingBuffer,
    /// Set by `start`, cleared by `stop`
    pub active: bool,
    /// The writer thread has finished; nothing more will be appended
    pub exhausted: bool,
    pub records_written: u64,
    pub bytes_written: u64,
    pub records_dropped: u64,
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub id: u64,
    pub state: RwLock<Inner>,
    pub signal: Mutex<()>,
    pub cond: Condvar,
    pub open_channels: AtomicUsize,
    /// Asks the writer thread to exit before its next read
    pub shutdown: AtomicBool,
    pub created_at: Instant,
}

impl Shared {
    pub fn new(id: u64, buffer_size: usize) -> Self {
        Self {
            id,
            state: RwLock::new(Inner {
                ring: RingBuffer::new(buffer_size),
                active: false,
                exhausted: false,
                records_written: 0,
                bytes_written: 0,
                records_dropped: 0,
            }),
            signal: Mutex::new(()),
            cond: Condvar::new(),
            open_channels: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            created_at: Instant::now(),
        }
    }

    /// Wake every thread parked on the condition variable
    pub fn broadcast(&self) {
        let _signal = self.signal.lock();
        self.cond.notify_all();
    }

    /// Append one record and wake readers
    pub fn append(&self, record: &[u8]) -> Result<u64, BufferError> {
        let result = {
            let mut inner = self.state.write();
            match inner.ring.write(record) {
                Ok(sequence) => {
                    inner.records_written += 1;
                    inner.bytes_written += record.len() as u64;
                    Ok(sequence)
                }
                Err(e) => {
                    inner.records_dropped += 1;
                    Err(e)
                }
            }
        };

        if result.is_ok() {
            self.broadcast();
        }
        result
    }

    /// Set the active flag and wake readers
    pub fn set_active(&self, active: bool) {
        self.state.write().active = active;
        self.broadcast();
    }

    /// Record that the writer is done and wake readers
    pub fn mark_exhausted(&self) {
        self.state.write().exhausted = true;
        self.broadcast();
    }

    pub fn stats(&self) -> SessionStats {
        let inner = self.state.read();
        SessionStats {
            records_written: inner.records_written,
            bytes_written: inner.bytes_written,
            records_evicted: inner.ring.evicted(),
            records_dropped: inner.records_dropped,
            live_records: inner.ring.len(),
            live_bytes: inner.ring.live_bytes(),
            capacity: inner.ring.capacity(),
            oldest_sequence: inner.ring.oldest_sequence(),
            newest_sequence: inner.ring.newest_sequence(),
            open_channels: self.open_channels.load(Ordering::Acquire),
            uptime: self.created_at.elapsed(),
        }
    }
}
