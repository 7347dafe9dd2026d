//! liveosc client settings
use std::net::SocketAddr;
use std::time::Duration;

use crate::correlation::DEFAULT_TIMEOUT;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// AbletonOSC listens on 11000 and replies to 11001
pub const STANDARD_PORT_SEND: u16 = 11000;
pub const DEFAULT_SEND_ADDRESS: &str = "127.0.0.1:11000";
pub const STANDARD_PORT_LISTEN: u16 = 11001;
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:11001";
pub const DEFAULT_TIMEOUT_MS: &str = "3000";

#[derive(Clone, Debug)]
pub struct Settings {
    // Where requests are sent
    pub send_address: SocketAddr,

    // Where replies arrive
    pub listen_address: SocketAddr,

    // How long a wait lasts before yielding an empty reply
    pub timeout: Duration,

    // Outbound rate limit; zero or below disables limiting
    pub requests_per_second: i64,

    // Log timeouts and unsolicited replies as warnings
    pub enable_logger: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            send_address: SocketAddr::from(([127, 0, 0, 1], STANDARD_PORT_SEND)),
            listen_address: SocketAddr::from(([127, 0, 0, 1], STANDARD_PORT_LISTEN)),
            timeout: DEFAULT_TIMEOUT,
            requests_per_second: 0,
            enable_logger: false,
        }
    }
}

impl Settings {
    /// Timeout actually used by waits: zero falls back to the default
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    pub fn rate_limited(&self) -> bool {
        self.requests_per_second > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.send_address, DEFAULT_SEND_ADDRESS.parse().unwrap());
        assert_eq!(settings.listen_address, DEFAULT_LISTEN_ADDRESS.parse().unwrap());
        assert_eq!(settings.timeout, Duration::from_millis(3000));
        assert!(!settings.rate_limited());
        assert!(!settings.enable_logger);
    }

    #[test]
    fn test_effective_timeout() {
        let mut settings = Settings {
            timeout: Duration::ZERO,
            ..Settings::default()
        };
        assert_eq!(settings.effective_timeout(), DEFAULT_TIMEOUT);
        settings.timeout = Duration::from_millis(750);
        assert_eq!(settings.effective_timeout(), Duration::from_millis(750));
    }

    #[test]
    fn test_negative_rate_is_unlimited() {
        let settings = Settings {
            requests_per_second: -1,
            ..Settings::default()
        };
        assert!(!settings.rate_limited());
    }
}
