//! Messages exchanged with the peer: an address plus ordered scalar arguments.
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single positional argument.
///
/// Only the scalar types Live speaks are modelled. Booleans travel as `Int(0|1)`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Arg {
    Int(i32),
    Float(f32),
    Str(String),
}

impl Arg {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Arg::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Arg::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Non-zero integers are true
    pub fn as_bool(&self) -> Option<bool> {
        self.as_int().map(|v| v != 0)
    }

    /// Parse a command-line token: int first, then float, otherwise a string.
    pub fn parse_lossy(token: &str) -> Self {
        if let Ok(v) = token.parse::<i32>() {
            return Arg::Int(v);
        }
        if let Ok(v) = token.parse::<f32>() {
            return Arg::Float(v);
        }
        Arg::Str(token.to_string())
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Float(v) => write!(f, "{}", v),
            Arg::Str(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Float(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Int(i32::from(v))
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(v)
    }
}

/// An addressed message, as sent or as received.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub address: String,
    pub args: Vec<Arg>,
}

impl Message {
    pub fn new(address: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// The sentinel handed back when no reply arrived in time.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty() && self.args.is_empty()
    }

    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinel() {
        let msg = Message::empty();
        assert!(msg.is_empty());
        assert!(msg.address.is_empty());
        assert!(msg.args.is_empty());

        // zero arguments alone is not the sentinel
        assert!(!Message::new("/live/song/stop_playing", vec![]).is_empty());
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(Arg::from(3), Arg::Int(3));
        assert_eq!(Arg::from(0.5f32), Arg::Float(0.5));
        assert_eq!(Arg::from(true), Arg::Int(1));
        assert_eq!(Arg::from(false), Arg::Int(0));
        assert_eq!(Arg::from("ok"), Arg::Str("ok".to_string()));
    }

    #[test]
    fn test_arg_accessors() {
        assert_eq!(Arg::Int(7).as_int(), Some(7));
        assert_eq!(Arg::Int(7).as_float(), None);
        assert_eq!(Arg::Float(1.5).as_float(), Some(1.5));
        assert_eq!(Arg::Str("a".into()).as_str(), Some("a"));
        assert_eq!(Arg::Int(2).as_bool(), Some(true));
        assert_eq!(Arg::Int(0).as_bool(), Some(false));
        assert_eq!(Arg::Str("1".into()).as_bool(), None);
    }

    #[test]
    fn test_parse_lossy() {
        assert_eq!(Arg::parse_lossy("12"), Arg::Int(12));
        assert_eq!(Arg::parse_lossy("-3"), Arg::Int(-3));
        assert_eq!(Arg::parse_lossy("120.5"), Arg::Float(120.5));
        assert_eq!(Arg::parse_lossy("Bass"), Arg::Str("Bass".to_string()));
    }

    #[test]
    fn test_json_shape() {
        let msg = Message::new("/live/test", vec![Arg::from("ok"), Arg::from(1)]);
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"address":"/live/test","args":["ok",1]}"#);
    }

    #[test]
    fn test_display() {
        let msg = Message::new("/live/track/get/name", vec![Arg::Int(0), Arg::from("Drums")]);
        assert_eq!(msg.to_string(), "/live/track/get/name 0 \"Drums\"");
    }
}
