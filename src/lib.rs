//! Request/reply client for Ableton Live over OSC
//!
//! OSC over UDP has no request ids: a reply is tagged only with the address of
//! the request that provoked it. `Client::send` returns a `Call` that resolves
//! to the next reply on that address, in send order, or to an empty message
//! once the timeout elapses.
pub mod cli;
pub mod client;
pub mod correlation;
pub mod dispatcher;
pub mod error;
pub mod limiters;
pub mod live;
pub mod message;
pub mod settings;
pub mod transport;

pub use client::{Call, Client};
pub use correlation::Reply;
pub use error::{LiveOscError, Result};
pub use message::{Arg, Message};
pub use settings::Settings;
