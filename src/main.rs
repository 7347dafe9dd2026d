use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liveosc::cli::{self, Command};
use liveosc::live::Live;
use liveosc::{Arg, Client, Reply};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args and env vars
    let args = cli::Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "liveosc=info".into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let command = args.command.clone();
    let client = Client::connect(args.into_settings()?).await?;
    client.run();
    info!("Starting {} {}", cli::APP_NAME, cli::APP_VERSION);

    let live = Live::new(client.clone());
    let result = match command {
        Command::Send {
            address,
            args,
            wait,
        } => {
            let args: Vec<Arg> = args.iter().map(|a| Arg::parse_lossy(a)).collect();
            if wait {
                match client.send(&address, args).await?.wait_outcome().await {
                    Reply::Received(message) => {
                        println!("{}", serde_json::to_string_pretty(&message)?);
                        Ok(())
                    }
                    Reply::TimedOut => Err(anyhow::anyhow!("no reply on {}", address)),
                }
            } else {
                client.notify(&address, args).await.map_err(Into::into)
            }
        }
        Command::Test => {
            let answer = live.application().test().await?;
            if answer.is_empty() {
                Err(anyhow::anyhow!("Live did not answer /live/test"))
            } else {
                println!("{}", answer);
                Ok(())
            }
        }
        Command::Tempo { bpm: Some(bpm) } => live.song().set_tempo(bpm).await.map_err(Into::into),
        Command::Tempo { bpm: None } => {
            println!("{}", live.song().tempo().await?);
            Ok(())
        }
    };

    client.close();
    result
}
