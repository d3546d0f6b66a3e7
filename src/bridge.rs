//! Async adapter for channels
//!
//! Channel reads block an OS thread, which does not mix with an async
//! runtime. [`AsyncChannel`] parks that read on a dedicated thread and
//! forwards matching messages into a bounded `tokio::sync::mpsc` channel.
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use logcat_rs::{AsyncChannel, Backend, DummyConfig, Filter, Session};
//!
//! # async fn example() -> logcat_rs::error::Result<()> {
//! let session = Session::new(Backend::dummy(DummyConfig::default()));
//! session.start()?;
//!
//! let filter = Filter::new("level >= 5")?;
//! let (channel, mut messages) = AsyncChannel::open(&session, filter, 64)?;
//!
//! while let Some(msg) = messages.recv().await {
//!     println!("{}", msg);
//! }
//! channel.close();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;

use crate::error::{ReadError, Result};
use crate::filter::Filter;
use crate::message::Message;
use crate::session::{Channel, ReplayFrom, Session};

/// Channel whose messages are delivered to an async receiver
pub struct AsyncChannel {
    channel: Arc<Channel>,
    forwarder: Option<JoinHandle<ReadError>>,
}

impl AsyncChannel {
    /// Forward messages matching `filter`, starting at the oldest retained record
    pub fn open(
        session: &Session,
        filter: Filter,
        capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<Message>)> {
        Self::open_at(session, ReplayFrom::Oldest, filter, capacity)
    }

    /// Forward messages matching `filter` from a chosen replay position
    pub fn open_at(
        session: &Session,
        from: ReplayFrom,
        filter: Filter,
        capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<Message>)> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let channel = Arc::new(session.open_channel_at(from));

        let reader = Arc::clone(&channel);
        let forwarder = thread::Builder::new()
            .name(format!("logcat-bridge-{}", session.id()))
            .spawn(move || forward(&reader, &filter, &tx))?;

        Ok((
            Self {
                channel,
                forwarder: Some(forwarder),
            },
            rx,
        ))
    }

    /// Close the channel and wait for the forwarding thread
    ///
    /// The forwarder may be waiting for room in the receiver; drain or drop
    /// the receiver first.
    pub fn close(mut self) {
        self.channel.close();
        if let Some(handle) = self.forwarder.take() {
            match handle.join() {
                Ok(reason) => tracing::debug!(reason = %reason, "Bridge stopped"),
                Err(_) => tracing::warn!("Bridge thread panicked"),
            }
        }
    }

    /// Whether the forwarding thread has exited
    pub fn is_finished(&self) -> bool {
        self.forwarder
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }
}

impl Drop for AsyncChannel {
    fn drop(&mut self) {
        self.channel.close();
        if let Some(handle) = self.forwarder.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

fn forward(channel: &Channel, filter: &Filter, tx: &mpsc::Sender<Message>) -> ReadError {
    loop {
        match channel.read_next(filter) {
            Ok(msg) => {
                if tx.blocking_send(msg).is_err() {
                    // Receiver dropped
                    channel.close();
                    return ReadError::Closed;
                }
            }
            Err(reason) => return reason,
        }
    }
}
