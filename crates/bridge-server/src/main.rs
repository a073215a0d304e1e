//! Strategy host serving trading terminals over TCP.

use anyhow::Result;
use bridge_core::Volume;
use bridge_server::advisors::PullbackBuyer;
use bridge_server::config::Config;
use bridge_server::indicators::CandleBodyTrend;
use bridge_server::{server, AlgorithmRegistry, HostServices, VolumePool};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bridge-server")]
#[command(about = "Serve expert advisors and indicators to trading terminals")]
struct Cli {
    /// Interface to bind, overrides BRIDGE_BIND_ADDR
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overrides BRIDGE_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(true)
        .init();

    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let mut registry = AlgorithmRegistry::new();
    registry
        .register_expert_advisor(1, |environment| Box::new(PullbackBuyer::new(environment)))
        .register_indicator(1, || Box::new(CandleBodyTrend));

    info!(
        "starting bridge-server on {} (max_clients = {}, indicators = {:?}, expert advisors = {:?})",
        config.socket_addr_string(),
        config.max_clients,
        registry.indicator_numbers(),
        registry.expert_advisor_numbers()
    );

    let pool = VolumePool::new(Volume::from_base(config.capacity_volume));
    let services = HostServices::new(registry, pool);

    tokio::select! {
        result = server::run(config, services) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
            Ok(())
        }
    }
}
