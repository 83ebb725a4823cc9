// Broker frontend entry point. Grounded on the teacher crate's server/run.rs: a
// clap-parsed `-c/--config` flag, TOML config load + validate, logger init, then run
// until SIGINT/SIGTERM, matching the original broker's cmd/broker/main.go.

use std::path::PathBuf;

use clap::Parser;
use posthorn::broker::{build_store, Broker};
use posthorn::config::Config;
use posthorn::log::init_log;

const DEFAULT_CONFIG: &str = "/etc/posthorn/posthorn.toml";

#[derive(Parser, Debug)]
#[command(name = "posthorn-broker", about = "MQTT 3.1.1 broker frontend")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    init_log(config.log())?;

    let store = build_store(&config).await?;
    let broker = Broker::new(config, store);

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    broker.run(shutdown).await?;
    Ok(())
}
