//! Typed bindings for Live's OSC API
//!
//! Most of Live's API is a property getter or setter. Getters go through
//! `Client::invoke` with a `FromReply` type; setters and commands through
//! `Client::notify`. Replies echo the ids the request was addressed with, so
//! extraction starts after `skip` leading arguments.
mod api;

pub use api::{ApplicationApi, Live, SongApi, TrackApi};

use crate::message::{Arg, Message};

/// Typed extraction from a reply.
///
/// A timed-out, short or mistyped reply yields the zero value for the type.
pub trait FromReply: Sized {
    fn from_reply(message: &Message, skip: usize) -> Self;
}

impl FromReply for i32 {
    fn from_reply(message: &Message, skip: usize) -> Self {
        message.arg(skip).and_then(Arg::as_int).unwrap_or_default()
    }
}

impl FromReply for f32 {
    fn from_reply(message: &Message, skip: usize) -> Self {
        message.arg(skip).and_then(Arg::as_float).unwrap_or_default()
    }
}

impl FromReply for bool {
    fn from_reply(message: &Message, skip: usize) -> Self {
        message.arg(skip).and_then(Arg::as_bool).unwrap_or_default()
    }
}

impl FromReply for String {
    fn from_reply(message: &Message, skip: usize) -> Self {
        message
            .arg(skip)
            .and_then(Arg::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    }
}

/// Every string argument after the skipped ones
impl FromReply for Vec<String> {
    fn from_reply(message: &Message, skip: usize) -> Self {
        message
            .args
            .iter()
            .skip(skip)
            .filter_map(Arg::as_str)
            .map(str::to_string)
            .collect()
    }
}

impl FromReply for (i32, i32) {
    fn from_reply(message: &Message, skip: usize) -> Self {
        (
            i32::from_reply(message, skip),
            i32::from_reply(message, skip + 1),
        )
    }
}

impl FromReply for Message {
    fn from_reply(message: &Message, _skip: usize) -> Self {
        message.clone()
    }
}
