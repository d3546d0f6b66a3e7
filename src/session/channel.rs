//! Reader handles
//!
//! A channel is one consumer's cursor into a session's history. Reads block
//! until a matching record is available, the channel is closed, or the
//! session has nothing more to deliver.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::shared::Shared;
use crate::buffer::Cursor;
use crate::error::ReadError;
use crate::filter::Filter;
use crate::message::Message;

/// Where a new channel starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayFrom {
    /// Oldest record still retained
    #[default]
    Oldest,
    /// Only records written after the channel is opened
    Latest,
    /// First retained record with a sequence number at or above this one
    Sequence(u64),
}

/// Blocking, filtered reader over a session
///
/// `Channel` is `Sync`: one thread can park in [`Channel::read_next`] while
/// another calls [`Channel::close`] through a shared reference.
pub struct Channel {
    shared: Arc<Shared>,
    cursor: Mutex<Cursor>,
    closed: AtomicBool,
    missed: AtomicU64,
}

impl Channel {
    pub(crate) fn open(shared: Arc<Shared>, from: ReplayFrom) -> Self {
        let cursor = {
            let inner = shared.state.read();
            match from {
                ReplayFrom::Oldest => Cursor::at_tail(&inner.ring),
                ReplayFrom::Latest => Cursor::at_head(&inner.ring),
                ReplayFrom::Sequence(sequence) => Cursor::at_sequence(sequence),
            }
        };

        let open = shared.open_channels.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(
            session_id = shared.id,
            from = ?from,
            open_channels = open,
            "Channel opened"
        );

        Self {
            shared,
            cursor: Mutex::new(cursor),
            closed: AtomicBool::new(false),
            missed: AtomicU64::new(0),
        }
    }

    /// Next record matching `filter`, blocking until one is available
    ///
    /// Records that do not match are skipped without blocking. Fails with
    /// [`ReadError::Closed`] once the channel is closed and with
    /// [`ReadError::EndOfStream`] when the session is stopped, or when its
    /// source has ended and every remaining record has been read.
    pub fn read_next(&self, filter: &Filter) -> Result<Message, ReadError> {
        loop {
            let inner = self.shared.state.read();

            if self.closed.load(Ordering::Acquire) {
                return Err(ReadError::Closed);
            }
            if !inner.active {
                return Err(ReadError::EndOfStream);
            }

            let mut cursor = self.cursor.lock();
            if let Some(entry) = cursor.next_entry(&inner.ring) {
                if entry.missed > 0 {
                    self.missed.fetch_add(entry.missed, Ordering::Relaxed);
                }
                let decoded = Message::decode_record(entry.sequence, entry.data);
                drop(cursor);
                drop(inner);

                match decoded {
                    Ok(msg) if filter.matches(&msg) => return Ok(msg),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Skipping undecodable record"),
                }
                continue;
            }
            drop(cursor);

            if inner.exhausted {
                return Err(ReadError::EndOfStream);
            }

            let mut signal = self.shared.signal.lock();
            if self.closed.load(Ordering::Acquire) {
                return Err(ReadError::Closed);
            }
            drop(inner);
            self.shared.cond.wait(&mut signal);
        }
    }

    /// Next record without filtering
    pub fn read(&self) -> Result<Message, ReadError> {
        self.read_next(&Filter::all())
    }

    /// Iterate over matching records until the channel stops delivering
    pub fn messages<'a>(&'a self, filter: &'a Filter) -> Messages<'a> {
        Messages {
            channel: self,
            filter,
        }
    }

    /// Close the channel, waking any thread blocked in a read
    pub fn close(&self) {
        let _signal = self.shared.signal.lock();
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(session_id = self.shared.id, "Channel closed");
        }
        self.shared.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Sequence of the last record this channel consumed (0 before the first)
    pub fn position(&self) -> u64 {
        self.cursor.lock().last_seen()
    }

    /// Records evicted before this channel could read them
    pub fn missed(&self) -> u64 {
        self.missed.load(Ordering::Relaxed)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.shared.open_channels.fetch_sub(1, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("session_id", &self.shared.id)
            .field("position", &self.position())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Iterator returned by [`Channel::messages`]
pub struct Messages<'a> {
    channel: &'a Channel,
    filter: &'a Filter,
}

impl Iterator for Messages<'_> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        self.channel.read_next(self.filter).ok()
    }
}
