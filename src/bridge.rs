//! Command dispatch bridge
//!
//! Translates pipeline events into client messages and client messages into pipeline
//! events. The bridge performs no I/O: every call returns the [`Effects`] the event
//! loop must carry out, which keeps the whole protocol testable without sockets.

use tracing::debug;

use crate::pipeline::{CommandKind, Notification, PipelineEvent, SessionEvent};
use crate::protocol::{AlexToClient, ClientToAlex, OutboundPayload};
use crate::session::{Boundary, ConnectOutcome, Session};

/// Work produced by one input, in the order it must be carried out
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Effects {
    /// Messages for the connected client, already sequenced
    pub to_client: Vec<AlexToClient>,
    /// Events for the pipeline
    pub to_pipeline: Vec<SessionEvent>,
    /// Audio still queued on the play channel must be discarded
    pub discard_queued_audio: bool,
    /// The event loop must terminate
    pub stop: bool,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        self.to_client.is_empty()
            && self.to_pipeline.is_empty()
            && !self.discard_queued_audio
            && !self.stop
    }

    /// Append the effects of a later input
    pub fn merge(&mut self, other: Effects) {
        self.to_client.extend(other.to_client);
        self.to_pipeline.extend(other.to_pipeline);
        self.discard_queued_audio |= other.discard_queued_audio;
        self.stop |= other.stop;
    }

    fn notify(&mut self, notification: Notification) {
        self.to_pipeline.push(SessionEvent::Notification(notification));
    }
}

pub struct CommandBridge {
    session: Session,
}

impl CommandBridge {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A transport connection opened; `None` when it must be refused
    pub fn client_connected(&mut self, remote_uri: &str) -> Option<Effects> {
        match self.session.on_connect(remote_uri) {
            ConnectOutcome::Accepted(notifications) => {
                let mut effects = Effects::default();
                for notification in notifications {
                    effects.notify(notification);
                }
                Some(effects)
            }
            ConnectOutcome::Rejected => None,
        }
    }

    pub fn client_disconnected(&mut self, code: Option<u16>) -> Effects {
        let mut effects = Effects::default();
        if let Some(notification) = self.session.on_disconnect(code) {
            effects.notify(notification);
        }
        effects
    }

    /// Authenticated client audio goes to the pipeline; anything else vanishes
    pub fn handle_client(&mut self, message: ClientToAlex) -> Effects {
        let mut effects = Effects::default();

        if !self.session.is_connected() {
            debug!("Dropping client message: no session");
            return effects;
        }

        if !self.session.authenticate(&message.key) {
            return effects;
        }

        if !message.speech.is_empty() {
            if let Some(frame) = self
                .session
                .relay()
                .relay_inbound(message.speech, self.session.is_connected())
            {
                effects.to_pipeline.push(SessionEvent::RecordedAudio(frame));
            }
        }

        if let Some(notification) = self
            .session
            .update_playing_utterance(message.currently_playing_utterance)
        {
            effects.notify(notification);
        }

        effects
    }

    pub fn handle_pipeline(&mut self, event: PipelineEvent) -> Effects {
        let mut effects = Effects::default();

        match event {
            PipelineEvent::Audio(frame) => {
                if !self.session.utterances().is_open() {
                    debug!("Dropping {} bytes of playback: no open utterance", frame.len());
                    return effects;
                }

                let relay = self.session.relay_mut();
                relay.enqueue_outbound(&frame.payload);
                for chunk in relay.drain() {
                    self.send(&mut effects, OutboundPayload::Speech(chunk));
                }
            }
            PipelineEvent::AsrResult(text) => {
                self.send(&mut effects, OutboundPayload::AsrResult(text.to_lowercase()));
            }
            PipelineEvent::SystemPrompt(text) => {
                self.send(&mut effects, OutboundPayload::SystemPrompt(text));
            }
            PipelineEvent::Command(command) => {
                debug!(
                    "Command {} from {} to {}",
                    command.kind, command.origin, command.destination
                );
                self.handle_command(command.kind, &mut effects);
            }
        }

        effects
    }

    fn handle_command(&mut self, kind: CommandKind, effects: &mut Effects) {
        match kind {
            CommandKind::Stop => {
                self.session.relay_mut().clear();
                effects.discard_queued_audio = true;
                effects.stop = true;
            }
            CommandKind::Flush => {
                let dropped = self.session.relay_mut().clear();
                debug!("Flush discarded {} buffered bytes", dropped);
                effects.discard_queued_audio = true;
            }
            CommandKind::FlushOut => {
                let dropped = self.session.relay_mut().clear();
                debug!("Flush-out discarded {} buffered bytes", dropped);
                effects.discard_queued_audio = true;
                self.send(effects, OutboundPayload::FlushOutAudio);
            }
            CommandKind::Reset => {
                if let Some(boundary) = self.session.utterances_mut().end() {
                    self.emit_boundary(boundary, effects);
                }
                self.session.reset();
            }
            CommandKind::UtteranceStart => {
                for boundary in self.session.utterances_mut().start() {
                    self.emit_boundary(boundary, effects);
                }
            }
            CommandKind::UtteranceEnd => {
                if let Some(boundary) = self.session.utterances_mut().end() {
                    self.emit_boundary(boundary, effects);
                }
            }
        }
    }

    fn emit_boundary(&mut self, boundary: Boundary, effects: &mut Effects) {
        match boundary {
            Boundary::Begin(utterance_id) => {
                self.send(effects, OutboundPayload::SpeechBegin { utterance_id });
                effects.notify(Notification::UtteranceStarted { utterance_id });
            }
            Boundary::End(utterance_id) => {
                self.send(effects, OutboundPayload::SpeechEnd { utterance_id });
                effects.notify(Notification::UtteranceEnded { utterance_id });
            }
        }
    }

    fn send(&mut self, effects: &mut Effects, payload: OutboundPayload) {
        if !self.session.is_connected() {
            debug!("Dropping {:?} message: no client connected", payload.kind());
            return;
        }

        let seq = self.session.next_sequence();
        effects.to_client.push(AlexToClient::new(seq, payload));
    }
}
