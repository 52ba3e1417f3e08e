//! Typed commands and notifications exchanged with the speech pipeline
//!
//! The pipeline bus historically speaks strings like `flush_out()` or
//! `call_disconnected(remote_uri="...", code="...")`. Those are parsed once here
//! (`FromStr`) and rendered once here (`Display`); everything else works on enums.

use std::fmt;
use std::str::FromStr;

use crate::error::CommandParseError;

/// Component name used as origin of everything this endpoint emits
pub const COMPONENT_NAME: &str = "WSIO";

/// Commands the pipeline may send to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Terminate the event loop
    Stop,
    /// Discard queued outbound audio without telling the client
    Flush,
    /// Discard queued outbound audio and tell the client to drop its playback buffer
    FlushOut,
    /// Reinitialize session state, keeping the transport connection
    Reset,
    UtteranceStart,
    UtteranceEnd,
}

impl CommandKind {
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Stop => "stop",
            CommandKind::Flush => "flush",
            CommandKind::FlushOut => "flush_out",
            CommandKind::Reset => "reset",
            CommandKind::UtteranceStart => "utterance_start",
            CommandKind::UtteranceEnd => "utterance_end",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.name())
    }
}

impl FromStr for CommandKind {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, args) = split_call(s)?;
        if !args.trim().is_empty() {
            return Err(CommandParseError::Malformed(s.to_string()));
        }

        match name {
            "stop" => Ok(CommandKind::Stop),
            "flush" => Ok(CommandKind::Flush),
            "flush_out" => Ok(CommandKind::FlushOut),
            "reset" => Ok(CommandKind::Reset),
            "utterance_start" => Ok(CommandKind::UtteranceStart),
            "utterance_end" => Ok(CommandKind::UtteranceEnd),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

/// A command together with its routing information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub origin: String,
    pub destination: String,
}

impl Command {
    pub fn new(kind: CommandKind, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            kind,
            origin: origin.into(),
            destination: destination.into(),
        }
    }

    /// Parse the bus string form, e.g. `Command::parse("flush()", "HUB", "WSIO")`
    pub fn parse(
        command: &str,
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<Self, CommandParseError> {
        Ok(Self::new(command.parse()?, origin, destination))
    }
}

/// Events the session reports to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    IncomingCall { remote_uri: String },
    CallConfirmed { remote_uri: String },
    CallDisconnected { remote_uri: String, code: Option<u16> },
    UtteranceStarted { utterance_id: i32 },
    UtteranceEnded { utterance_id: i32 },
    /// The client reported a new currently-playing utterance
    CurrentlyPlaying { utterance_id: i32 },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::IncomingCall { remote_uri } => {
                write!(f, "incoming_call(remote_uri=\"{}\")", remote_uri)
            }
            Notification::CallConfirmed { remote_uri } => {
                write!(f, "call_confirmed(remote_uri=\"{}\")", remote_uri)
            }
            Notification::CallDisconnected { remote_uri, code } => match code {
                Some(code) => write!(
                    f,
                    "call_disconnected(remote_uri=\"{}\", code=\"{}\")",
                    remote_uri, code
                ),
                None => write!(
                    f,
                    "call_disconnected(remote_uri=\"{}\", code=\"---\")",
                    remote_uri
                ),
            },
            Notification::UtteranceStarted { utterance_id } => {
                write!(f, "utterance_start(utterance_id={})", utterance_id)
            }
            Notification::UtteranceEnded { utterance_id } => {
                write!(f, "utterance_end(utterance_id={})", utterance_id)
            }
            Notification::CurrentlyPlaying { utterance_id } => {
                write!(f, "currently_playing(utterance_id={})", utterance_id)
            }
        }
    }
}

/// Split `name(args)` into its parts
fn split_call(s: &str) -> Result<(&str, &str), CommandParseError> {
    let s = s.trim();
    let open = s
        .find('(')
        .ok_or_else(|| CommandParseError::Malformed(s.to_string()))?;
    let rest = s[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| CommandParseError::Malformed(s.to_string()))?;
    let name = s[..open].trim();

    if name.is_empty() {
        return Err(CommandParseError::Malformed(s.to_string()));
    }

    Ok((name, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_call() {
        assert_eq!(split_call(" flush_out() "), Ok(("flush_out", "")));
        assert_eq!(split_call("x(a=1)"), Ok(("x", "a=1")));
        assert!(split_call("flush").is_err());
        assert!(split_call("()").is_err());
    }
}
