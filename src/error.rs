use std::fmt;

/// Main error type for the liveosc client
///
/// Only the outer surfaces (socket setup, sending, wire codec) are fallible.
/// Correlation never produces an error: a missing reply surfaces as an empty message.
#[derive(Debug)]
pub enum LiveOscError {
    /// Configuration or CLI argument errors
    Config(String),

    /// Transport layer errors
    Transport(String),

    /// OSC encoding/decoding errors
    Codec(String),

    /// System I/O errors
    Io(std::io::Error),
}

impl fmt::Display for LiveOscError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveOscError::Config(msg) => write!(f, "Configuration error: {}", msg),
            LiveOscError::Transport(msg) => write!(f, "Transport error: {}", msg),
            LiveOscError::Codec(msg) => write!(f, "Codec error: {}", msg),
            LiveOscError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for LiveOscError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LiveOscError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LiveOscError {
    fn from(err: std::io::Error) -> Self {
        LiveOscError::Io(err)
    }
}

impl From<rosc::OscError> for LiveOscError {
    fn from(err: rosc::OscError) -> Self {
        LiveOscError::Codec(format!("{:?}", err))
    }
}

// Convenient type alias for Results using our error type
pub type Result<T> = std::result::Result<T, LiveOscError>;
