//! CLI for this application
//!
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{LiveOscError, Result};
use crate::settings;

pub use settings::{APP_NAME, APP_VERSION};

#[derive(Clone, Debug, clap::Parser)]
#[clap(name = APP_NAME, version = APP_VERSION, about = "Talk to Ableton Live over OSC")]
pub struct Cli {
    // Where requests are sent
    #[clap(
        long,
        default_value = settings::DEFAULT_SEND_ADDRESS,
        env("LIVEOSC_SEND_ADDRESS"),
        help = "Address AbletonOSC listens on"
    )]
    pub send_address: SocketAddr,

    // Where replies arrive
    #[clap(
        long,
        default_value = settings::DEFAULT_LISTEN_ADDRESS,
        env("LIVEOSC_LISTEN_ADDRESS"),
        help = "Address to receive replies on"
    )]
    pub listen_address: SocketAddr,

    // Reply timeout
    #[clap(
        long,
        default_value = settings::DEFAULT_TIMEOUT_MS,
        env("LIVEOSC_TIMEOUT_MS"),
        help = "Milliseconds to wait for a reply"
    )]
    pub timeout_ms: u64,

    // Outbound rate limit
    #[clap(
        long,
        default_value = "0",
        env("LIVEOSC_REQUESTS_PER_SECOND"),
        allow_negative_numbers = true,
        help = "Max requests per second, 0 for unlimited"
    )]
    pub requests_per_second: i64,

    #[clap(
        long,
        env("LIVEOSC_ENABLE_LOGGER"),
        help = "Warn on timeouts and unsolicited replies"
    )]
    pub enable_logger: bool,

    #[clap(long, env("LIVEOSC_LOG_JSON"), help = "Emit logs as JSON")]
    pub log_json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Command {
    /// Send a message; arguments are parsed as int, then float, then string
    Send {
        address: String,
        #[clap(allow_hyphen_values = true)]
        args: Vec<String>,
        /// Wait for the reply and print it as JSON
        #[clap(long)]
        wait: bool,
    },
    /// Check that Live answers
    Test,
    /// Print the song tempo, or set it when a value is given
    Tempo { bpm: Option<f32> },
}

impl Cli {
    /// Validated settings. Sending to our own listen socket would feed every
    /// request back in as its own reply.
    pub fn into_settings(self) -> Result<settings::Settings> {
        if self.send_address == self.listen_address {
            return Err(LiveOscError::Config(format!(
                "send and listen address are both {}",
                self.send_address
            )));
        }
        Ok(settings::Settings {
            send_address: self.send_address,
            listen_address: self.listen_address,
            timeout: Duration::from_millis(self.timeout_ms),
            requests_per_second: self.requests_per_second,
            enable_logger: self.enable_logger,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["liveosc", "test"]).unwrap();
        assert!(matches!(cli.command, Command::Test));
        let settings = cli.into_settings().unwrap();
        assert_eq!(settings.send_address.port(), settings::STANDARD_PORT_SEND);
        assert_eq!(settings.listen_address.port(), settings::STANDARD_PORT_LISTEN);
        assert_eq!(settings.timeout, Duration::from_millis(3000));
        assert_eq!(settings.requests_per_second, 0);
    }

    #[test]
    fn test_send_with_args() {
        let cli = Cli::try_parse_from([
            "liveosc",
            "--requests-per-second",
            "20",
            "--timeout-ms",
            "500",
            "send",
            "--wait",
            "/live/track/set/volume",
            "0",
            "-0.5",
        ])
        .unwrap();
        match &cli.command {
            Command::Send {
                address,
                args,
                wait,
            } => {
                assert_eq!(address, "/live/track/set/volume");
                assert_eq!(args, &vec!["0".to_string(), "-0.5".to_string()]);
                assert!(*wait);
            }
            other => panic!("unexpected command {:?}", other),
        }
        let settings = cli.into_settings().unwrap();
        assert_eq!(settings.requests_per_second, 20);
        assert_eq!(settings.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_negative_rate_accepted() {
        let cli =
            Cli::try_parse_from(["liveosc", "--requests-per-second", "-1", "test"]).unwrap();
        assert!(!cli.into_settings().unwrap().rate_limited());
    }

    #[test]
    fn test_same_send_and_listen_address_rejected() {
        let cli = Cli::try_parse_from([
            "liveosc",
            "--send-address",
            "127.0.0.1:11000",
            "--listen-address",
            "127.0.0.1:11000",
            "test",
        ])
        .unwrap();
        let err = cli.into_settings().unwrap_err();
        assert!(matches!(err, LiveOscError::Config(_)));
        assert!(err.to_string().contains("127.0.0.1:11000"));
    }

    #[test]
    fn test_tempo_optional_value() {
        let cli = Cli::try_parse_from(["liveosc", "tempo"]).unwrap();
        assert!(matches!(cli.command, Command::Tempo { bpm: None }));
        let cli = Cli::try_parse_from(["liveosc", "tempo", "128"]).unwrap();
        assert!(matches!(cli.command, Command::Tempo { bpm: Some(b) } if b == 128.0));
    }
}
