// WebSocket transport for the client endpoint
//
// Each accepted connection gets its own task that owns the socket. The task never
// touches session state: inbound frames become `TransportEvent`s for the event loop,
// and outbound frames arrive from the loop on a bounded per-connection channel.
// When the loop drops that channel's sender, the connection is closed.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn, Instrument};

use super::shutdown::Shutdown;

pub type ConnectionId = u64;

const OUTBOUND_QUEUE: usize = 256;
const ACCEPT_POLL: Duration = Duration::from_secs(1);

/// What a connection task reports to the event loop
#[derive(Debug)]
pub enum TransportEvent {
    Opened {
        id: ConnectionId,
        remote_uri: String,
        outbound: mpsc::Sender<Bytes>,
    },
    /// One binary frame from the client
    Message { id: ConnectionId, payload: Bytes },
    Closed { id: ConnectionId, code: Option<u16> },
}

pub struct WebSocketListener {
    listener: TcpListener,
    next_id: AtomicU64,
}

impl WebSocketListener {
    pub async fn bind(addr: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((addr, port))
            .await
            .with_context(|| format!("Failed to bind client endpoint on {}:{}", addr, port))?;

        info!("Client endpoint listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until shutdown or until the event loop goes away
    pub async fn serve(self, events: mpsc::Sender<TransportEvent>, shutdown: Shutdown) {
        loop {
            if shutdown.is_triggered() || events.is_closed() {
                break;
            }

            let accepted = match tokio::time::timeout(ACCEPT_POLL, self.listener.accept()).await {
                Ok(accepted) => accepted,
                Err(_) => continue,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    let events = events.clone();
                    let span = tracing::info_span!("connection", id, %peer);
                    tokio::spawn(handle_connection(stream, peer, id, events).instrument(span));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            }
        }

        info!("Client endpoint stopped accepting connections");
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    id: ConnectionId,
    events: mpsc::Sender<TransportEvent>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    info!("Client connecting: {}", peer);

    let (mut write, mut read) = ws.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Bytes>(OUTBOUND_QUEUE);

    let opened = TransportEvent::Opened {
        id,
        remote_uri: peer.to_string(),
        outbound: outbound_tx,
    };
    if events.send(opened).await.is_err() {
        return;
    }

    let mut code = None;

    loop {
        tokio::select! {
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Binary(data))) => {
                        let event = TransportEvent::Message { id, payload: Bytes::from(data) };
                        if events.send(event).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        code = frame.map(|f| u16::from(f.code));
                        debug!("Close frame received (code={:?})", code);
                        break;
                    }
                    Some(Ok(Message::Text(_))) => {
                        warn!("Ignoring text frame; the protocol is binary only");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(payload) => {
                        if let Err(e) = write.send(Message::Binary(payload.to_vec())).await {
                            warn!("WebSocket write error: {}", e);
                            break;
                        }
                    }
                    None => {
                        debug!("Session released this connection, closing");
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket connection closed: {}", peer);
    let _ = events.send(TransportEvent::Closed { id, code }).await;
}
