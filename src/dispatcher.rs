//! Inbound message routing
//!
//! Every received message goes to the handlers registered for its address (and
//! to wildcard handlers), then to the correlation table. Handlers see listener
//! traffic that no request asked for; the table only completes pending replies.
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::correlation::ReplyWaiter;
use crate::message::Message;

/// Matches every address
pub const WILDCARD: &str = "*";

pub type Handler = Arc<dyn Fn(&Message) + Send + Sync>;

pub struct Dispatcher {
    waiter: ReplyWaiter,
    handlers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl Dispatcher {
    pub fn new(waiter: ReplyWaiter) -> Self {
        Self {
            waiter,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn waiter(&self) -> &ReplyWaiter {
        &self.waiter
    }

    pub fn add_handler<F>(&self, address: &str, handler: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(address.to_string())
            .or_default()
            .push(Arc::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Route one inbound message. Returns true if it completed a pending reply.
    pub fn dispatch(&self, message: Message) -> bool {
        let matched: Vec<Handler> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            handlers
                .get(&message.address)
                .into_iter()
                .chain(handlers.get(WILDCARD))
                .flatten()
                .cloned()
                .collect()
        };
        trace!(
            "[{}] dispatching to {} handler(s)",
            message.address,
            matched.len()
        );
        for handler in &matched {
            handler(&message);
        }
        self.waiter.populate(message)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("waiter", &self.waiter)
            .field("handlers", &self.handler_count())
            .finish()
    }
}
