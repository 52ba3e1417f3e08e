// Loopback pipeline
//
// Stand-in for the speech pipeline when the endpoint runs on its own: every burst of
// microphone audio is played back to the client as one utterance once the client
// goes quiet for `gap`.

use std::time::Duration;

use bytes::BytesMut;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn, Instrument};

use super::channel::{PipelineEndpoint, SessionEvent};
use super::command::Notification;
use crate::server::Shutdown;

pub struct LoopbackPipeline {
    endpoint: PipelineEndpoint,
    gap: Duration,
    shutdown: Shutdown,
}

impl LoopbackPipeline {
    pub fn new(endpoint: PipelineEndpoint, gap: Duration, shutdown: Shutdown) -> Self {
        Self {
            endpoint,
            gap,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let span = tracing::info_span!("loopback");
        async move {
            info!("Loopback pipeline started (gap={:?})", self.gap);

            let mut recorded = BytesMut::new();
            let mut quiet_ticks = 0u32;
            let mut ticker = tokio::time::interval(self.gap);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    event = self.endpoint.recv() => {
                        match event {
                            Some(SessionEvent::RecordedAudio(frame)) => {
                                recorded.extend_from_slice(&frame.payload);
                                quiet_ticks = 0;
                            }
                            Some(SessionEvent::Notification(Notification::CallConfirmed { remote_uri })) => {
                                info!("Call confirmed: {}", remote_uri);
                                if let Err(e) = self.endpoint.system_prompt("loopback ready").await {
                                    warn!("Failed to send prompt: {}", e);
                                    break;
                                }
                            }
                            Some(SessionEvent::Notification(Notification::CallDisconnected { .. })) => {
                                recorded.clear();
                            }
                            Some(SessionEvent::Notification(notification)) => {
                                debug!("Notification: {}", notification);
                            }
                            None => break,
                        }
                    }
                    _ = ticker.tick() => {
                        if self.shutdown.is_triggered() {
                            break;
                        }

                        quiet_ticks += 1;
                        if quiet_ticks >= 2 && !recorded.is_empty() {
                            let audio = recorded.split().freeze();
                            debug!("Replaying {} bytes", audio.len());
                            let replayed = async {
                                self.endpoint.utterance_start().await?;
                                self.endpoint.play_audio(audio).await?;
                                self.endpoint.utterance_end().await
                            }
                            .await;

                            if let Err(e) = replayed {
                                warn!("Failed to replay audio: {}", e);
                                break;
                            }
                        }
                    }
                }
            }

            info!("Loopback pipeline stopped");
        }
        .instrument(span)
        .await
    }
}
