use bytes::Bytes;
use tokio::sync::mpsc;

use super::command::{Command, CommandKind, Notification, COMPONENT_NAME};
use crate::audio::AudioFrame;
use crate::error::RelayError;

/// Name the pipeline uses as origin of its commands
pub const PIPELINE_NAME: &str = "HUB";

/// Anything the pipeline hands to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Synthesized audio to play to the client
    Audio(AudioFrame),
    Command(Command),
    /// Recognition hypothesis to show to the client
    AsrResult(String),
    /// Prompt text being spoken to the client
    SystemPrompt(String),
}

/// Anything the session hands to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Microphone audio received from the client
    RecordedAudio(AudioFrame),
    Notification(Notification),
}

/// Pipeline side of the boundary
pub struct PipelineEndpoint {
    commands: mpsc::Sender<PipelineEvent>,
    play: mpsc::Sender<PipelineEvent>,
    events: mpsc::Receiver<SessionEvent>,
}

/// Session side of the boundary, owned by the event loop
pub struct PipelineHandle {
    pub commands: mpsc::Receiver<PipelineEvent>,
    pub play: mpsc::Receiver<PipelineEvent>,
    pub events: mpsc::Sender<SessionEvent>,
}

/// Create the bounded channels connecting a pipeline to the event loop
///
/// `commands` carries control traffic (stop/flush/reset, text results), `play` carries
/// playback audio and the utterance boundaries that delimit it, so boundaries stay
/// ordered with respect to the audio they enclose.
pub fn channel(capacity: usize) -> (PipelineEndpoint, PipelineHandle) {
    let (commands_tx, commands_rx) = mpsc::channel(capacity);
    let (play_tx, play_rx) = mpsc::channel(capacity);
    let (events_tx, events_rx) = mpsc::channel(capacity);

    (
        PipelineEndpoint {
            commands: commands_tx,
            play: play_tx,
            events: events_rx,
        },
        PipelineHandle {
            commands: commands_rx,
            play: play_rx,
            events: events_tx,
        },
    )
}

impl PipelineEndpoint {
    pub async fn send_command(&self, kind: CommandKind) -> Result<(), RelayError> {
        let command = Command::new(kind, PIPELINE_NAME, COMPONENT_NAME);
        let target = match kind {
            CommandKind::UtteranceStart | CommandKind::UtteranceEnd => &self.play,
            _ => &self.commands,
        };

        target
            .send(PipelineEvent::Command(command))
            .await
            .map_err(|_| RelayError::LoopClosed)
    }

    pub async fn play_audio(&self, payload: impl Into<Bytes>) -> Result<(), RelayError> {
        self.play
            .send(PipelineEvent::Audio(AudioFrame::new(payload)))
            .await
            .map_err(|_| RelayError::LoopClosed)
    }

    pub async fn utterance_start(&self) -> Result<(), RelayError> {
        self.send_command(CommandKind::UtteranceStart).await
    }

    pub async fn utterance_end(&self) -> Result<(), RelayError> {
        self.send_command(CommandKind::UtteranceEnd).await
    }

    pub async fn asr_result(&self, text: impl Into<String>) -> Result<(), RelayError> {
        self.commands
            .send(PipelineEvent::AsrResult(text.into()))
            .await
            .map_err(|_| RelayError::LoopClosed)
    }

    pub async fn system_prompt(&self, text: impl Into<String>) -> Result<(), RelayError> {
        self.commands
            .send(PipelineEvent::SystemPrompt(text.into()))
            .await
            .map_err(|_| RelayError::LoopClosed)
    }

    /// Next event from the session; `None` once the event loop is gone
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }
}

impl PipelineHandle {
    pub async fn deliver(&self, event: SessionEvent) -> Result<(), RelayError> {
        self.events
            .send(event)
            .await
            .map_err(|_| RelayError::PipelineClosed)
    }
}
