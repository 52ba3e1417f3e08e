use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn, Instrument};

use crate::protocol::{PingMessage, RouterRequest};
use crate::server::Shutdown;
use crate::session::SessionStatus;

/// Default time between pings
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Opens connections to the router
///
/// Implementations:
/// - `WebSocketRouter`: binary WebSocket connection (production)
/// - test doubles recording the requests they receive
#[async_trait]
pub trait RouterConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RouterLink>>;

    /// Router location for logging
    fn describe(&self) -> String;
}

/// An open connection to the router
#[async_trait]
pub trait RouterLink: Send {
    async fn send(&mut self, request: &RouterRequest) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Time between pings, and between reconnection attempts
    pub interval: Duration,
    /// Address the router hands to clients it sends our way
    pub advertised_addr: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            advertised_addr: "ws://127.0.0.1:9000".to_string(),
        }
    }
}

/// Reports this endpoint's availability to the router, forever
///
/// Best effort: a missing or failing router only produces warnings and retries at the
/// same fixed interval; the audio path never waits on it.
pub struct HeartbeatClient<C> {
    connector: C,
    status: watch::Receiver<SessionStatus>,
    config: HeartbeatConfig,
    shutdown: Shutdown,
}

impl<C: RouterConnector> HeartbeatClient<C> {
    pub fn new(
        connector: C,
        status: watch::Receiver<SessionStatus>,
        config: HeartbeatConfig,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            connector,
            status,
            config,
            shutdown,
        }
    }

    /// Ping built from the latest session snapshot
    pub fn ping_message(&self) -> PingMessage {
        let status = self.status.borrow();
        PingMessage {
            status: status.status,
            key: status.key.clone(),
            addr: self.config.advertised_addr.clone(),
        }
    }

    pub async fn run(self) {
        let span = tracing::info_span!("heartbeat", router = %self.connector.describe());
        async move {
            info!("Heartbeat started (interval={:?})", self.config.interval);

            loop {
                if self.shutdown.is_triggered() {
                    break;
                }

                match self.connector.connect().await {
                    Ok(link) => {
                        info!("Connected to router");
                        if let Err(e) = self.ping_until_failure(link).await {
                            warn!("Ping connection lost .. retrying: {:#}", e);
                        }
                    }
                    Err(e) => {
                        warn!("Ping connection failed .. retrying: {:#}", e);
                    }
                }

                if self.shutdown.is_triggered() {
                    break;
                }

                tokio::time::sleep(self.config.interval).await;
            }

            info!("Heartbeat stopped");
        }
        .instrument(span)
        .await
    }

    /// Ping once immediately, then on every tick, until a send fails or shutdown
    async fn ping_until_failure(&self, mut link: Box<dyn RouterLink>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if self.shutdown.is_triggered() {
                return Ok(());
            }

            let ping = self.ping_message();
            debug!("Ping: {:?}", ping.status);
            link.send(&RouterRequest::Ping(ping)).await?;
        }
    }
}
