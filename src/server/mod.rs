//! Client-facing server: WebSocket transport, event loop and their wiring
//!
//! [`RelayServer`] binds the client endpoint, then runs the event loop alongside the
//! listener, the heartbeat and the optional status API until the loop ends.

mod event_loop;
mod shutdown;
mod transport;

pub use event_loop::EventLoop;
pub use shutdown::Shutdown;
pub use transport::{ConnectionId, TransportEvent, WebSocketListener};

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::Config;
use crate::heartbeat::{HeartbeatClient, HeartbeatConfig, WebSocketRouter};
use crate::http::{create_router, AppState};
use crate::pipeline::PipelineHandle;
use crate::session::{Session, SessionStatus};

const TRANSPORT_QUEUE: usize = 256;

pub struct RelayServer {
    config: Config,
    listener: WebSocketListener,
    event_loop: EventLoop,
    transport_tx: mpsc::Sender<TransportEvent>,
    status: watch::Receiver<SessionStatus>,
    shutdown: Shutdown,
}

impl RelayServer {
    /// Bind the client endpoint and build the event loop; nothing runs until [`run`](Self::run)
    pub async fn bind(config: Config, pipeline: PipelineHandle, shutdown: Shutdown) -> Result<Self> {
        let listener = WebSocketListener::bind(&config.listen.addr, config.listen.port).await?;
        let (transport_tx, transport_rx) = mpsc::channel(TRANSPORT_QUEUE);

        let (event_loop, status) = EventLoop::new(
            Session::new(config.relay.chunk_size),
            pipeline,
            transport_rx,
            shutdown.clone(),
            Duration::from_millis(config.relay.poll_timeout_ms),
        );

        Ok(Self {
            config,
            listener,
            event_loop,
            transport_tx,
            status,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Status snapshots published by the event loop
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            listener,
            event_loop,
            transport_tx,
            status,
            shutdown,
        } = self;

        let mut tasks: Vec<JoinHandle<()>> = Vec::new();

        tasks.push(tokio::spawn(listener.serve(transport_tx, shutdown.clone())));

        if config.router.enabled {
            let connector = WebSocketRouter::new(&config.router.addr, config.router.port);
            let heartbeat = HeartbeatClient::new(
                connector,
                status.clone(),
                HeartbeatConfig {
                    interval: Duration::from_millis(config.router.heartbeat_interval_ms),
                    advertised_addr: config.listen.advertised_addr.clone(),
                },
                shutdown.clone(),
            );
            tasks.push(tokio::spawn(heartbeat.run()));
        } else {
            info!("Router heartbeat disabled");
        }

        if config.http.enabled {
            let state = AppState::new(config.service.name.clone(), status.clone());
            let bind = format!("{}:{}", config.http.bind, config.http.port);
            let http_listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind status API on {}", bind))?;
            info!("Status API listening on {}", bind);

            tasks.push(tokio::spawn(async move {
                if let Err(e) = axum::serve(http_listener, create_router(state)).await {
                    error!("Status API failed: {}", e);
                }
            }));
        }

        let result = event_loop.run().await;

        // Loop teardown cancels everything else; the router sees the connection drop
        shutdown.trigger();
        for task in tasks {
            task.abort();
        }

        result
    }
}
