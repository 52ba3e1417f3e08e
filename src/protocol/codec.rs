// Binary encoding for the wire messages
//
// Layout (little-endian):
// - integers: fixed width (`u8` tags, `i32` numbers)
// - bytes/strings: `u32` length prefix followed by the raw data
//
// Message boundaries come from the WebSocket framing, so a decoded buffer must be
// consumed exactly; leftover bytes are an error.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::messages::{
    AlexToClient, ClientToAlex, MessageType, OutboundPayload, PingMessage, PingStatus,
    RouterRequest,
};
use crate::error::CodecError;

impl ClientToAlex {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(12 + self.key.len() + self.speech.len());
        put_str(&mut buf, &self.key);
        put_bytes(&mut buf, &self.speech);
        buf.put_i32_le(self.currently_playing_utterance);
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(data);
        let key = reader.string("key")?;
        let speech = reader.bytes()?;
        let currently_playing_utterance = reader.i32()?;
        reader.finish()?;

        Ok(Self {
            key,
            speech,
            currently_playing_utterance,
        })
    }
}

impl AlexToClient {
    pub fn encode(&self) -> Bytes {
        const EMPTY: &[u8] = &[];
        let (utterance_id, speech, asr_result, system_prompt) = match &self.payload {
            OutboundPayload::Speech(speech) => (0, &speech[..], "", ""),
            OutboundPayload::SpeechBegin { utterance_id }
            | OutboundPayload::SpeechEnd { utterance_id } => (*utterance_id, EMPTY, "", ""),
            OutboundPayload::AsrResult(text) => (0, EMPTY, text.as_str(), ""),
            OutboundPayload::SystemPrompt(text) => (0, EMPTY, "", text.as_str()),
            OutboundPayload::FlushOutAudio => (0, EMPTY, "", ""),
        };

        let mut buf = BytesMut::with_capacity(
            25 + speech.len() + asr_result.len() + system_prompt.len(),
        );
        buf.put_u8(self.kind().tag());
        buf.put_i32_le(self.seq);
        buf.put_i32_le(self.priority);
        buf.put_i32_le(utterance_id);
        put_bytes(&mut buf, speech);
        put_str(&mut buf, asr_result);
        put_str(&mut buf, system_prompt);
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(data);
        let tag = reader.u8()?;
        let kind = MessageType::from_tag(tag).ok_or(CodecError::UnknownMessageType(tag))?;
        let seq = reader.i32()?;
        let priority = reader.i32()?;
        let utterance_id = reader.i32()?;
        let speech = reader.bytes()?;
        let asr_result = reader.string("asr_result")?;
        let system_prompt = reader.string("system_prompt")?;
        reader.finish()?;

        let payload = match kind {
            MessageType::Speech => OutboundPayload::Speech(speech),
            MessageType::SpeechBegin => OutboundPayload::SpeechBegin { utterance_id },
            MessageType::SpeechEnd => OutboundPayload::SpeechEnd { utterance_id },
            MessageType::AsrResult => OutboundPayload::AsrResult(asr_result),
            MessageType::SystemPrompt => OutboundPayload::SystemPrompt(system_prompt),
            MessageType::FlushOutAudio => OutboundPayload::FlushOutAudio,
        };

        Ok(Self {
            seq,
            priority,
            payload,
        })
    }
}

impl RouterRequest {
    pub fn encode(&self) -> Bytes {
        match self {
            RouterRequest::Ping(ping) => {
                let mut buf = BytesMut::with_capacity(10 + ping.key.len() + ping.addr.len());
                buf.put_u8(Self::PING_TAG);
                buf.put_u8(ping.status.tag());
                put_str(&mut buf, &ping.key);
                put_str(&mut buf, &ping.addr);
                buf.freeze()
            }
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(data);
        let tag = reader.u8()?;
        if tag != Self::PING_TAG {
            return Err(CodecError::UnknownMessageType(tag));
        }
        let status_tag = reader.u8()?;
        let status =
            PingStatus::from_tag(status_tag).ok_or(CodecError::UnknownStatus(status_tag))?;
        let key = reader.string("key")?;
        let addr = reader.string("addr")?;
        reader.finish()?;

        Ok(RouterRequest::Ping(PingMessage { status, key, addr }))
    }
}

fn put_bytes(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u32_le(data.len() as u32);
    buf.put_slice(data);
}

fn put_str(buf: &mut BytesMut, s: &str) {
    put_bytes(buf, s.as_bytes());
}

/// Bounds-checked cursor over a received frame
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn need(&self, needed: usize) -> Result<(), CodecError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(CodecError::Truncated { needed, remaining });
        }
        Ok(())
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn i32(&mut self) -> Result<i32, CodecError> {
        self.need(4)?;
        Ok(self.buf.get_i32_le())
    }

    fn bytes(&mut self) -> Result<Bytes, CodecError> {
        self.need(4)?;
        let len = self.buf.get_u32_le() as usize;
        self.need(len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    fn string(&mut self, field: &'static str) -> Result<String, CodecError> {
        let raw = self.bytes()?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8(field))
    }

    fn finish(self) -> Result<(), CodecError> {
        match self.buf.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reports_truncated_length_prefix() {
        let mut reader = Reader::new(&[3, 0, 0, 0, b'a']);
        assert_eq!(
            reader.bytes(),
            Err(CodecError::Truncated {
                needed: 3,
                remaining: 1
            })
        );
    }

    #[test]
    fn test_reader_finish_rejects_leftovers() {
        let mut reader = Reader::new(&[1, 2]);
        assert_eq!(reader.u8(), Ok(1));
        assert_eq!(reader.finish(), Err(CodecError::TrailingBytes(1)));
    }
}
