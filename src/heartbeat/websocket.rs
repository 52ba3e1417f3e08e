use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::client::{RouterConnector, RouterLink};
use crate::protocol::RouterRequest;

/// Router reached over a binary WebSocket connection
pub struct WebSocketRouter {
    url: String,
}

impl WebSocketRouter {
    pub fn new(addr: &str, port: u16) -> Self {
        Self {
            url: format!("ws://{}:{}", addr, port),
        }
    }
}

#[async_trait]
impl RouterConnector for WebSocketRouter {
    async fn connect(&self) -> Result<Box<dyn RouterLink>> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("Failed to connect to router at {}", self.url))?;

        Ok(Box::new(WebSocketRouterLink { stream }))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

struct WebSocketRouterLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketRouterLink {
    /// Consume what the router sent since the last ping, without waiting
    ///
    /// Reading also queues the pong for any router ping; it goes out with the next send.
    fn poll_incoming(&mut self) -> Result<()> {
        while let Some(incoming) = self.stream.next().now_or_never() {
            match incoming {
                Some(Ok(Message::Close(frame))) => {
                    bail!("Router closed the connection: {:?}", frame)
                }
                Some(Ok(message)) => debug!("Ignoring router frame ({} bytes)", message.len()),
                Some(Err(e)) => return Err(e).context("Router connection failed"),
                None => bail!("Router connection ended"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RouterLink for WebSocketRouterLink {
    async fn send(&mut self, request: &RouterRequest) -> Result<()> {
        self.poll_incoming()?;
        self.stream
            .send(Message::Binary(request.encode().to_vec()))
            .await
            .context("Failed to send ping to router")?;
        Ok(())
    }
}
