use anyhow::{ensure, Result};
use serde::Deserialize;

/// Environment prefix for overrides, e.g. `VOICE_RELAY_ROUTER__PORT=9001`
pub const ENV_PREFIX: &str = "VOICE_RELAY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub listen: ListenConfig,
    pub router: RouterConfig,
    pub relay: RelayConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

/// Client-facing WebSocket endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    pub addr: String,
    pub port: u16,
    /// Externally reachable address announced to the router
    pub advertised_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    pub enabled: bool,
    pub addr: String,
    pub port: u16,
    pub heartbeat_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Size in bytes of every outbound SPEECH chunk
    pub chunk_size: usize,
    /// Capacity of each pipeline channel
    pub channel_capacity: usize,
    /// Longest the event loop waits before re-checking the shutdown flag
    pub poll_timeout_ms: u64,
    /// Silence after which the loopback pipeline replays recorded audio
    pub loopback_gap_ms: u64,
}

/// Status API
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
}

impl Config {
    /// Load defaults, then the optional config file at `path`, then environment overrides
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Self::defaults()?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("service.name", "voice-relay")?
            .set_default("listen.addr", "0.0.0.0")?
            .set_default("listen.port", 9000i64)?
            .set_default("listen.advertised_addr", "ws://127.0.0.1:9000")?
            .set_default("router.enabled", true)?
            .set_default("router.addr", "127.0.0.1")?
            .set_default("router.port", 9001i64)?
            .set_default("router.heartbeat_interval_ms", 1000i64)?
            .set_default("relay.chunk_size", 640i64)?
            .set_default("relay.channel_capacity", 1024i64)?
            .set_default("relay.poll_timeout_ms", 1000i64)?
            .set_default("relay.loopback_gap_ms", 500i64)?
            .set_default("http.enabled", true)?
            .set_default("http.bind", "127.0.0.1")?
            .set_default("http.port", 9080i64)?)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.relay.chunk_size > 0, "relay.chunk_size must be positive");
        ensure!(
            self.relay.channel_capacity > 0,
            "relay.channel_capacity must be positive"
        );
        ensure!(
            self.relay.poll_timeout_ms > 0,
            "relay.poll_timeout_ms must be positive"
        );
        ensure!(
            self.router.heartbeat_interval_ms > 0,
            "router.heartbeat_interval_ms must be positive"
        );
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "voice-relay".to_string(),
            },
            listen: ListenConfig {
                addr: "0.0.0.0".to_string(),
                port: 9000,
                advertised_addr: "ws://127.0.0.1:9000".to_string(),
            },
            router: RouterConfig {
                enabled: true,
                addr: "127.0.0.1".to_string(),
                port: 9001,
                heartbeat_interval_ms: 1000,
            },
            relay: RelayConfig {
                chunk_size: crate::audio::DEFAULT_CHUNK_SIZE,
                channel_capacity: 1024,
                poll_timeout_ms: 1000,
                loopback_gap_ms: 500,
            },
            http: HttpConfig {
                enabled: true,
                bind: "127.0.0.1".to_string(),
                port: 9080,
            },
        }
    }
}
