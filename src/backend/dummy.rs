//! Synthetic message generator

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::message::Message;

const PHRASES: [&str; 32] = [
    "Start proc com.android.settings for activity",
    "Displayed com.android.settings/.Settings: +412ms",
    "Waiting for service AtCmdFwd...",
    "Battery level changed to 87",
    "Scanning package com.android.chrome",
    "Package scan completed in 1203 ms",
    "Wakelock acquired by AlarmManager",
    "Wakelock released",
    "Network state changed: CONNECTED",
    "Network state changed: DISCONNECTED",
    "GC_CONCURRENT freed 2048K, 31% free",
    "GC_FOR_ALLOC freed 512K, 12% free",
    "Choreographer skipped 34 frames",
    "Surface created for window Toast",
    "Surface destroyed for window Toast",
    "Input event dispatch timed out",
    "Broadcast timeout for BOOT_COMPLETED",
    "Killing 1234:com.example.app: empty for 1800s",
    "Low memory: killing cached process",
    "Bluetooth adapter state ON",
    "Bluetooth adapter state OFF",
    "WiFi scan results available: 14 networks",
    "Location fix acquired, accuracy 12m",
    "Audio focus granted to com.example.player",
    "Audio focus lost",
    "Screen turned on by power key",
    "Screen turned off by timeout",
    "Configuration changed: orientation=landscape",
    "Configuration changed: orientation=portrait",
    "Content provider published: settings",
    "Job scheduled: sync adapter",
    "Job finished in 320 ms",
];

/// Dummy backend configuration
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Delay before each generated message
    pub interval: Duration,

    /// Random seed
    pub seed: u64,

    /// Stop after this many messages (`None` = never)
    pub limit: Option<u64>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x2545_f491_4f6c_dd1d);
        Self {
            interval: Duration::from_millis(100),
            seed,
            limit: None,
        }
    }
}

impl DummyConfig {
    /// Set the delay between messages
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// End the stream after `count` messages
    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }
}

/// Backend producing an endless stream of canned messages
///
/// Each message picks a phrase at random, never the same one twice in a
/// row. The phrase index determines the pid (`index / 2 + 1`), so pids stay
/// in 1..=16.
#[derive(Debug)]
pub struct DummyBackend {
    config: DummyConfig,
    state: u64,
    previous: Option<usize>,
    produced: u64,
    closed: bool,
}

impl DummyBackend {
    pub fn new(config: DummyConfig) -> Self {
        Self {
            // xorshift must not start at zero
            state: config.seed | 1,
            config,
            previous: None,
            produced: 0,
            closed: false,
        }
    }

    fn next_random(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn pick_phrase(&mut self) -> usize {
        loop {
            let index = (self.next_random() % PHRASES.len() as u64) as usize;
            if Some(index) != self.previous {
                self.previous = Some(index);
                return index;
            }
        }
    }

    pub fn read_message(&mut self) -> Result<Option<Message>> {
        if self.closed || self.config.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(None);
        }

        if !self.config.interval.is_zero() {
            std::thread::sleep(self.config.interval);
        }

        let index = self.pick_phrase();
        let pid = (index / 2 + 1) as i32;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let level = 2 + (index % 6) as u8;

        self.produced += 1;
        Ok(Some(Message::compose(
            pid,
            pid,
            now.as_secs() as i32,
            now.subsec_nanos() as i32,
            level,
            "dummy",
            PHRASES[index],
        )))
    }

    pub fn resolve_pid_name(&mut self, pid: i32) -> String {
        format!("dummy-{}", pid)
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}
