// Mailman worker entry point: pops the ingress queue and fans each message out to
// subscriber notify queues. Grounded on the original broker's cmd/mailman/main.go.
// A deployment can run several of these against a shared Redis store to scale the
// fan-out stage independently of the broker frontends accepting connections.

use std::path::PathBuf;

use clap::Parser;
use posthorn::broker::build_store;
use posthorn::config::Config;
use posthorn::log::init_log;
use posthorn::pipeline::Mailman;
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG: &str = "/etc/posthorn/posthorn.toml";

#[derive(Parser, Debug)]
#[command(name = "posthorn-mailman", about = "MQTT broker message fan-out worker")]
struct Cli {
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    init_log(config.log())?;

    let store = build_store(&config).await?;
    let mailman = Mailman::new(store);
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        signal_cancel.cancel();
    });

    log::info!("mailman worker started");
    mailman.run(&cancel).await?;
    log::info!("mailman worker shut down");
    Ok(())
}
