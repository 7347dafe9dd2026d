//! Correlation table: per-address FIFO queues of pending reply slots
//!
//! Replies carry no request id, so a reply is matched purely by position: the
//! oldest outstanding slot for an address receives the next reply to that address.
//!
//! A slot whose caller went away still owns its positional reply until its
//! deadline (registration time plus the table's ttl). Past that it is swept, the
//! same way a live waiter cancels its slot when its timeout fires.
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::trace;

use super::DEFAULT_TIMEOUT;
use crate::message::Message;

pub type SlotId = u64;

/// Caller-side half of a single-use reply container.
///
/// The table keeps the sending half; it is moved out exactly once, either by
/// `deliver` (completes the slot) or by `cancel` (closes it).
#[derive(Debug)]
pub struct ReplySlot {
    id: SlotId,
    address: String,
    rx: oneshot::Receiver<Message>,
}

impl ReplySlot {
    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Wait for the slot to settle: `None` means it was closed without a value.
    pub async fn recv(&mut self) -> Option<Message> {
        (&mut self.rx).await.ok()
    }

    /// Take a value that has already been delivered, without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

/// Sending half of a slot, out of the table and about to be completed
#[derive(Debug)]
pub(crate) struct PendingReply {
    id: SlotId,
    deadline: Instant,
    tx: oneshot::Sender<Message>,
}

impl PendingReply {
    /// Nobody can read this slot any more and its reply is overdue
    fn is_stale(&self, now: Instant) -> bool {
        self.tx.is_closed() && self.deadline <= now
    }

    /// Complete the slot; an abandoned slot swallows the message
    pub(crate) fn complete(self, message: Message) {
        trace!("[{}] delivering to slot {}", message.address, self.id);
        if self.tx.send(message).is_err() {
            trace!("slot {} was abandoned before delivery", self.id);
        }
    }
}

type Queues = HashMap<String, VecDeque<PendingReply>>;

/// Drop stale slots from `address`'s queue, removing the entry once it is empty
fn sweep(table: &mut Queues, address: &str, now: Instant) {
    if let Some(queue) = table.get_mut(address) {
        queue.retain(|pending| !pending.is_stale(now));
        if queue.is_empty() {
            table.remove(address);
        }
    }
}

fn sweep_all(table: &mut Queues, now: Instant) {
    table.retain(|_, queue| {
        queue.retain(|pending| !pending.is_stale(now));
        !queue.is_empty()
    });
}

/// Address -> queue of pending replies, in registration order.
///
/// Every operation takes the lock for a queue mutation only; completing a slot
/// happens after the lock is released.
#[derive(Debug)]
pub struct CorrelationTable {
    pending: Mutex<Queues>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TIMEOUT)
    }
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose abandoned slots are swept `ttl` after registration
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a fresh slot and append it to the address's queue.
    pub fn register(&self, address: &str) -> ReplySlot {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let now = Instant::now();
        {
            let mut table = self.lock();
            sweep(&mut table, address, now);
            table
                .entry(address.to_string())
                .or_default()
                .push_back(PendingReply {
                    id,
                    deadline: now + self.ttl,
                    tx,
                });
        }
        trace!("[{}] registered slot {}", address, id);
        ReplySlot {
            id,
            address: address.to_string(),
            rx,
        }
    }

    /// Complete the oldest slot waiting on `message.address`.
    ///
    /// Returns false when nothing was waiting; the message is dropped, never buffered.
    pub fn deliver(&self, message: Message) -> bool {
        match self.take_front(&message.address) {
            Some(pending) => {
                pending.complete(message);
                true
            }
            None => false,
        }
    }

    /// Pop the oldest live slot for `address`, skipping stale ones
    pub(crate) fn take_front(&self, address: &str) -> Option<PendingReply> {
        let mut table = self.lock();
        sweep(&mut table, address, Instant::now());
        let queue = table.get_mut(address)?;
        let pending = queue.pop_front();
        if queue.is_empty() {
            table.remove(address);
        }
        pending
    }

    /// Remove `slot` from its queue and close it.
    ///
    /// Returns false if the slot had already been delivered or cancelled.
    pub fn cancel(&self, slot: &ReplySlot) -> bool {
        let removed = {
            let mut table = self.lock();
            sweep(&mut table, &slot.address, Instant::now());
            let Some(queue) = table.get_mut(&slot.address) else {
                return false;
            };
            let removed = queue
                .iter()
                .position(|pending| pending.id == slot.id)
                .and_then(|index| queue.remove(index));
            if queue.is_empty() {
                table.remove(&slot.address);
            }
            removed
        };
        // dropping the sender closes the slot
        match removed {
            Some(pending) => {
                trace!("[{}] cancelled slot {}", slot.address, pending.id);
                true
            }
            None => false,
        }
    }

    /// Number of slots waiting on `address`
    pub fn pending_for(&self, address: &str) -> usize {
        let mut table = self.lock();
        sweep(&mut table, address, Instant::now());
        table.get(address).map(VecDeque::len).unwrap_or(0)
    }

    /// Number of slots waiting across all addresses
    pub fn pending_count(&self) -> usize {
        let mut table = self.lock();
        sweep_all(&mut table, Instant::now());
        table.values().map(VecDeque::len).sum()
    }

    /// Number of addresses with at least one waiting slot
    pub fn address_count(&self) -> usize {
        let mut table = self.lock();
        sweep_all(&mut table, Instant::now());
        table.len()
    }

    /// Drop every abandoned slot whose deadline has passed
    pub fn purge_expired(&self) -> usize {
        let mut table = self.lock();
        let before: usize = table.values().map(VecDeque::len).sum();
        sweep_all(&mut table, Instant::now());
        let after: usize = table.values().map(VecDeque::len).sum();
        if before > after {
            trace!("swept {} abandoned slots", before - after);
        }
        before - after
    }
}
