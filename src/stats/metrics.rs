//! Statistics for logcat sessions

use std::time::Duration;

/// Point-in-time snapshot of a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    /// Records appended to the ring buffer
    pub records_written: u64,
    /// Record bytes appended (excluding ring buffer bookkeeping)
    pub bytes_written: u64,
    /// Records evicted to make room for newer ones
    pub records_evicted: u64,
    /// Records discarded because they exceed the buffer capacity
    pub records_dropped: u64,
    /// Records currently retained
    pub live_records: usize,
    /// Arena bytes currently in use
    pub live_bytes: usize,
    /// Arena size
    pub capacity: usize,
    /// Oldest retained sequence
    pub oldest_sequence: Option<u64>,
    /// Newest sequence written
    pub newest_sequence: Option<u64>,
    /// Channels currently open on the session
    pub open_channels: usize,
    /// Time since the session was created
    pub uptime: Duration,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena usage in percent
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.live_bytes as f64 * 100.0 / self.capacity as f64
    }

    /// Average records written per second since creation
    pub fn write_rate(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.records_written as f64 / secs
        } else {
            0.0
        }
    }
}
