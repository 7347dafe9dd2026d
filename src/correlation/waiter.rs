//! Reply waiting with a timeout, in three styles: await, callback and channel.
//!
//! All three register through the same `CorrelationTable` and settle through
//! `ReplyWaiter::wait_outcome_within`; only the way the result reaches the caller differs.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::queue::{CorrelationTable, ReplySlot};
use crate::message::Message;

/// Long enough for Live's scheduler, short enough to notice a dead peer
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// How a wait ended
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Received(Message),
    TimedOut,
}

impl Reply {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Reply::TimedOut)
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            Reply::Received(message) => Some(message),
            Reply::TimedOut => None,
        }
    }

    /// Collapse to a message, using the empty sentinel for a timeout
    pub fn into_message(self) -> Message {
        match self {
            Reply::Received(message) => message,
            Reply::TimedOut => Message::empty(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReplyWaiter {
    table: Arc<CorrelationTable>,
    timeout: Duration,
    enable_logger: bool,
}

impl ReplyWaiter {
    /// A zero timeout selects `DEFAULT_TIMEOUT`
    pub fn new(timeout: Duration, enable_logger: bool) -> Self {
        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };
        Self {
            table: Arc::new(CorrelationTable::with_ttl(timeout)),
            timeout,
            enable_logger,
        }
    }

    pub fn table(&self) -> &Arc<CorrelationTable> {
        &self.table
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register interest in the next reply to `address`
    pub fn expect(&self, address: &str) -> ReplySlot {
        self.table.register(address)
    }

    /// Hand an inbound message to whoever is waiting for it
    pub fn populate(&self, message: Message) -> bool {
        let address = message.address.clone();
        let delivered = self.table.deliver(message);
        if !delivered {
            if self.enable_logger {
                warn!("[{}] dropping reply nobody is waiting for", address);
            } else {
                debug!("[{}] dropping reply nobody is waiting for", address);
            }
        }
        delivered
    }

    /// Wait on `slot` for up to `timeout`.
    ///
    /// On timeout the slot is cancelled. If a delivery already took the slot out
    /// of the table, the cancel fails and the reply it is completing is returned
    /// instead of a timeout.
    pub async fn wait_outcome_within(&self, mut slot: ReplySlot, timeout: Duration) -> Reply {
        let result = tokio::time::timeout(timeout, slot.recv()).await;
        match result {
            Ok(Some(message)) => Reply::Received(message),
            Ok(None) => {
                self.log_missing(slot.address(), "slot closed without a reply");
                Reply::TimedOut
            }
            Err(_) => {
                if self.table.cancel(&slot) {
                    self.log_missing(
                        slot.address(),
                        &format!("timed out waiting for reply (waited {:?})", timeout),
                    );
                    Reply::TimedOut
                } else {
                    // the sender left the table, so this settles without waiting on the peer
                    slot.recv().await.map_or(Reply::TimedOut, Reply::Received)
                }
            }
        }
    }

    pub async fn wait_outcome(&self, slot: ReplySlot) -> Reply {
        self.wait_outcome_within(slot, self.timeout).await
    }

    /// Wait on `slot`, returning the empty sentinel on timeout
    pub async fn wait_for_within(&self, slot: ReplySlot, timeout: Duration) -> Message {
        self.wait_outcome_within(slot, timeout).await.into_message()
    }

    pub async fn wait_for(&self, slot: ReplySlot) -> Message {
        self.wait_for_within(slot, self.timeout).await
    }

    /// Register now and run `callback` with the reply (or the empty sentinel) from a background task.
    pub fn callback<F>(&self, address: &str, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Message) + Send + 'static,
    {
        let slot = self.expect(address);
        self.callback_on(slot, callback)
    }

    /// Same as `callback` for a slot that is already registered
    pub fn callback_on<F>(&self, slot: ReplySlot, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Message) + Send + 'static,
    {
        let waiter = self.clone();
        tokio::spawn(async move {
            let message = waiter.wait_for(slot).await;
            callback(message);
        })
    }

    /// Register now and return a receiver that yields exactly one value.
    pub fn wait_chan(&self, address: &str) -> oneshot::Receiver<Message> {
        let slot = self.expect(address);
        self.wait_chan_on(slot)
    }

    /// Same as `wait_chan` for a slot that is already registered
    pub fn wait_chan_on(&self, slot: ReplySlot) -> oneshot::Receiver<Message> {
        let (tx, rx) = oneshot::channel();
        let waiter = self.clone();
        tokio::spawn(async move {
            let message = waiter.wait_for(slot).await;
            // receiver may be gone; nothing else to do with the reply
            let _ = tx.send(message);
        });
        rx
    }

    fn log_missing(&self, address: &str, reason: &str) {
        if self.enable_logger {
            warn!("[{}] {}", address, reason);
        } else {
            debug!("[{}] {}", address, reason);
        }
    }
}

impl Default for ReplyWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, false)
    }
}
