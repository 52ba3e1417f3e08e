use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voice_relay::{pipeline, Config, LoopbackPipeline, RelayServer, Shutdown};

/// Voice relay endpoint: streams call audio between a WebSocket client and the speech pipeline
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (any format the `config` crate understands, extension optional)
    #[arg(long, default_value = "config/voice-relay")]
    config: String,

    /// Override the client endpoint port
    #[arg(long)]
    listen_port: Option<u16>,

    /// Override the router address
    #[arg(long)]
    router_addr: Option<String>,

    /// Override the router port
    #[arg(long)]
    router_port: Option<u16>,

    /// Do not announce this endpoint to a router
    #[arg(long)]
    no_router: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(Some(&args.config))?;

    if let Some(port) = args.listen_port {
        cfg.listen.port = port;
    }
    if let Some(addr) = args.router_addr {
        cfg.router.addr = addr;
    }
    if let Some(port) = args.router_port {
        cfg.router.port = port;
    }
    if args.no_router {
        cfg.router.enabled = false;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Client endpoint: {}:{} (advertised as {})", cfg.listen.addr, cfg.listen.port, cfg.listen.advertised_addr);
    if cfg.router.enabled {
        info!("Router: {}:{} every {}ms", cfg.router.addr, cfg.router.port, cfg.router.heartbeat_interval_ms);
    }

    let shutdown = Shutdown::new();
    let (endpoint, handle) = pipeline::channel(cfg.relay.channel_capacity);

    let loopback = LoopbackPipeline::new(
        endpoint,
        Duration::from_millis(cfg.relay.loopback_gap_ms),
        shutdown.clone(),
    );
    tokio::spawn(loopback.run());

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, shutting down");
            ctrl_c_shutdown.trigger();
        }
    });

    let server = RelayServer::bind(cfg, handle, shutdown).await?;
    server.run().await
}
