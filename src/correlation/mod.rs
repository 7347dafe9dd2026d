//! Request/reply correlation over an address-keyed transport
//!
//! The transport carries no request ids. A reply is paired with a request only
//! by its address and its position among the outstanding requests for that address.
pub mod queue;
pub mod waiter;

pub use queue::{CorrelationTable, ReplySlot, SlotId};
pub use waiter::{Reply, ReplyWaiter, DEFAULT_TIMEOUT};
