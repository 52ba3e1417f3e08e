use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn, Instrument};

use super::shutdown::Shutdown;
use super::transport::{ConnectionId, TransportEvent};
use crate::bridge::{CommandBridge, Effects};
use crate::error::RelayError;
use crate::pipeline::{PipelineEvent, PipelineHandle, SessionEvent};
use crate::protocol::{AlexToClient, ClientToAlex};
use crate::session::{Session, SessionStatus};

struct ActiveConnection {
    id: ConnectionId,
    outbound: mpsc::Sender<Bytes>,
}

/// Single task owning the session and all of its mutation
///
/// Transport events, pipeline commands and pipeline playback are handled one at a
/// time at the `select!` point, so session state needs no locking.
pub struct EventLoop {
    bridge: CommandBridge,
    pipeline: PipelineHandle,
    transport: mpsc::Receiver<TransportEvent>,
    active: Option<ActiveConnection>,
    status: watch::Sender<SessionStatus>,
    shutdown: Shutdown,
    poll_timeout: Duration,
}

impl EventLoop {
    pub fn new(
        session: Session,
        pipeline: PipelineHandle,
        transport: mpsc::Receiver<TransportEvent>,
        shutdown: Shutdown,
        poll_timeout: Duration,
    ) -> (Self, watch::Receiver<SessionStatus>) {
        let (status, status_rx) = watch::channel(session.status());

        let event_loop = Self {
            bridge: CommandBridge::new(session),
            pipeline,
            transport,
            active: None,
            status,
            shutdown,
            poll_timeout,
        };

        (event_loop, status_rx)
    }

    /// Run until `stop`, shutdown, or failure
    ///
    /// A failure sets the shutdown flag before it is returned, so the other tasks wind
    /// down and the supervisor sees the error.
    pub async fn run(mut self) -> Result<()> {
        let span = tracing::info_span!("event_loop");
        async move {
            info!("Event loop started");

            let result = self.run_inner().await;
            match &result {
                Ok(()) => info!("Event loop stopped"),
                Err(e) => {
                    error!("Uncaught error in event loop: {:#}", e);
                    self.shutdown.trigger();
                }
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&mut self) -> Result<()> {
        loop {
            if self.shutdown.is_triggered() {
                info!("Shutdown requested");
                return Ok(());
            }

            let effects = tokio::select! {
                biased;

                event = self.transport.recv() => match event {
                    Some(event) => self.on_transport(event),
                    None => return self.closed(RelayError::TransportClosed),
                },
                event = self.pipeline.commands.recv() => match event {
                    Some(event) => self.bridge.handle_pipeline(event),
                    None => return self.closed(RelayError::PipelineClosed),
                },
                event = self.pipeline.play.recv() => match event {
                    Some(event) => self.bridge.handle_pipeline(event),
                    None => return self.closed(RelayError::PipelineClosed),
                },
                _ = tokio::time::sleep(self.poll_timeout) => Effects::default(),
            };

            let stop = self.apply(effects).await?;
            self.status.send_replace(self.bridge.session().status());

            if stop {
                info!("Stop command received");
                return Ok(());
            }
        }
    }

    /// A peer going away is fatal unless we are already shutting down
    fn closed(&self, err: RelayError) -> Result<()> {
        if self.shutdown.is_triggered() {
            info!("{} during shutdown", err);
            return Ok(());
        }
        Err(err.into())
    }

    fn on_transport(&mut self, event: TransportEvent) -> Effects {
        match event {
            TransportEvent::Opened {
                id,
                remote_uri,
                outbound,
            } => match self.bridge.client_connected(&remote_uri) {
                Some(effects) => {
                    self.active = Some(ActiveConnection { id, outbound });
                    effects
                }
                // Dropping `outbound` closes the rejected connection
                None => Effects::default(),
            },
            TransportEvent::Message { id, payload } => {
                if !self.is_active(id) {
                    debug!("Ignoring frame from inactive connection {}", id);
                    return Effects::default();
                }

                match ClientToAlex::decode(&payload) {
                    Ok(message) => self.bridge.handle_client(message),
                    Err(e) => {
                        warn!("Dropping malformed client frame: {}", e);
                        Effects::default()
                    }
                }
            }
            TransportEvent::Closed { id, code } => {
                if !self.is_active(id) {
                    return Effects::default();
                }

                self.active = None;
                self.bridge.client_disconnected(code)
            }
        }
    }

    fn is_active(&self, id: ConnectionId) -> bool {
        self.active.as_ref().map(|c| c.id) == Some(id)
    }

    /// Carry out effects; returns whether the loop must stop
    ///
    /// Never waits on a slow peer for longer than one poll interval at a time: a client
    /// that stops reading is dropped, and pipeline delivery gives up on shutdown.
    async fn apply(&mut self, mut effects: Effects) -> Result<bool> {
        if effects.discard_queued_audio {
            let queued = self.discard_queued_audio();
            effects.merge(queued);
        }

        for message in effects.to_client {
            if !self.send_to_client(message).await {
                let dropped = self.drop_client();
                effects.to_pipeline.extend(dropped.to_pipeline);
                break;
            }
        }

        for event in effects.to_pipeline {
            if self.shutdown.is_triggered() {
                debug!("Shutdown requested, skipping pipeline delivery");
                break;
            }
            self.deliver_to_pipeline(event).await?;
        }

        Ok(effects.stop)
    }

    /// Drop playback audio already queued; boundaries are still applied so they stay balanced
    fn discard_queued_audio(&mut self) -> Effects {
        let mut effects = Effects::default();
        let mut dropped = 0;

        while let Ok(event) = self.pipeline.play.try_recv() {
            match event {
                PipelineEvent::Audio(frame) => dropped += frame.len(),
                other => {
                    let mut handled = self.bridge.handle_pipeline(other);
                    handled.discard_queued_audio = false;
                    effects.merge(handled);
                }
            }
        }

        if dropped > 0 {
            debug!("Discarded {} bytes of queued playback", dropped);
        }

        effects
    }

    /// Queue a message for the client; `false` when the client stayed full for a whole
    /// poll interval
    async fn send_to_client(&self, message: AlexToClient) -> bool {
        let Some(connection) = &self.active else {
            warn!("Send to client called but the connection is not opened");
            return true;
        };

        match connection
            .outbound
            .send_timeout(message.encode(), self.poll_timeout)
            .await
        {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(_)) => {
                warn!("Connection {} is not reading, dropping client", connection.id);
                false
            }
            Err(SendTimeoutError::Closed(_)) => {
                debug!("Connection {} already closed, dropping message", connection.id);
                true
            }
        }
    }

    /// Disconnect the active client from our side; dropping `outbound` closes the socket
    fn drop_client(&mut self) -> Effects {
        if self.active.take().is_none() {
            return Effects::default();
        }
        self.bridge.client_disconnected(None)
    }

    /// Hand an event to the pipeline, checking for shutdown while it is backed up
    async fn deliver_to_pipeline(&self, event: SessionEvent) -> Result<()> {
        let delivery = self.pipeline.deliver(event);
        tokio::pin!(delivery);

        loop {
            tokio::select! {
                result = &mut delivery => return Ok(result?),
                _ = tokio::time::sleep(self.poll_timeout) => {
                    if self.shutdown.is_triggered() {
                        warn!("Shutdown while pipeline is backed up, dropping event");
                        return Ok(());
                    }
                    debug!("Pipeline not draining, still waiting");
                }
            }
        }
    }
}
