// Wire codec tests
//
// These tests pin the binary layout of the three message schemas and the decoder's
// handling of malformed input.

use bytes::Bytes;
use voice_relay::protocol::{
    AlexToClient, ClientToAlex, MessageType, OutboundPayload, PingMessage, PingStatus,
    RouterRequest, DEFAULT_PRIORITY,
};
use voice_relay::CodecError;

#[test]
fn test_client_message_layout() {
    let msg = ClientToAlex {
        key: "K1".to_string(),
        speech: Bytes::from_static(b"abcd"),
        currently_playing_utterance: 7,
    };

    let encoded = msg.encode();

    let mut expected = Vec::new();
    expected.extend_from_slice(&2u32.to_le_bytes());
    expected.extend_from_slice(b"K1");
    expected.extend_from_slice(&4u32.to_le_bytes());
    expected.extend_from_slice(b"abcd");
    expected.extend_from_slice(&7i32.to_le_bytes());
    assert_eq!(&encoded[..], &expected[..]);

    let decoded = ClientToAlex::decode(&encoded).unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn test_speech_message_roundtrip() {
    let msg = AlexToClient::new(3, OutboundPayload::Speech(Bytes::from(vec![1u8; 640])));
    assert_eq!(msg.priority, DEFAULT_PRIORITY);
    assert_eq!(msg.kind(), MessageType::Speech);

    let decoded = AlexToClient::decode(&msg.encode()).unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn test_boundary_messages_carry_utterance_id() {
    let begin = AlexToClient::new(1, OutboundPayload::SpeechBegin { utterance_id: 4 });
    let end = AlexToClient::new(2, OutboundPayload::SpeechEnd { utterance_id: 4 });

    let begin_bytes = begin.encode();
    assert_eq!(begin_bytes[0], MessageType::SpeechBegin.tag());
    assert_eq!(&begin_bytes[1..5], &1i32.to_le_bytes());
    assert_eq!(&begin_bytes[5..9], &(-1i32).to_le_bytes());
    assert_eq!(&begin_bytes[9..13], &4i32.to_le_bytes());

    assert_eq!(AlexToClient::decode(&begin_bytes).unwrap(), begin);
    assert_eq!(AlexToClient::decode(&end.encode()).unwrap(), end);
}

#[test]
fn test_text_messages_roundtrip() {
    let asr = AlexToClient::new(5, OutboundPayload::AsrResult("dobrý den".to_string()));
    let prompt = AlexToClient::new(6, OutboundPayload::SystemPrompt("Hello.".to_string()));
    let flush = AlexToClient::new(7, OutboundPayload::FlushOutAudio);

    assert_eq!(AlexToClient::decode(&asr.encode()).unwrap(), asr);
    assert_eq!(AlexToClient::decode(&prompt.encode()).unwrap(), prompt);
    assert_eq!(AlexToClient::decode(&flush.encode()).unwrap(), flush);
}

#[test]
fn test_router_ping_roundtrip() {
    let request = RouterRequest::Ping(PingMessage {
        status: PingStatus::Busy,
        key: "ABC123".to_string(),
        addr: "ws://10.0.0.5:9000".to_string(),
    });

    let encoded = request.encode();
    assert_eq!(encoded[0], RouterRequest::PING_TAG);
    assert_eq!(encoded[1], PingStatus::Busy.tag());

    assert_eq!(RouterRequest::decode(&encoded).unwrap(), request);
}

#[test]
fn test_decode_rejects_unknown_message_type() {
    let mut encoded = AlexToClient::new(1, OutboundPayload::FlushOutAudio)
        .encode()
        .to_vec();
    encoded[0] = 42;

    assert_eq!(
        AlexToClient::decode(&encoded),
        Err(CodecError::UnknownMessageType(42))
    );
}

#[test]
fn test_decode_rejects_unknown_ping_status() {
    let mut encoded = RouterRequest::Ping(PingMessage {
        status: PingStatus::Available,
        key: String::new(),
        addr: String::new(),
    })
    .encode()
    .to_vec();
    encoded[1] = 9;

    assert_eq!(RouterRequest::decode(&encoded), Err(CodecError::UnknownStatus(9)));
}

#[test]
fn test_decode_rejects_truncated_input() {
    let encoded = ClientToAlex {
        key: "KEY".to_string(),
        speech: Bytes::from_static(b"audio"),
        currently_playing_utterance: 0,
    }
    .encode();

    let truncated = &encoded[..encoded.len() - 2];
    assert!(matches!(
        ClientToAlex::decode(truncated),
        Err(CodecError::Truncated { .. })
    ));
    assert!(matches!(ClientToAlex::decode(&[]), Err(CodecError::Truncated { .. })));
}

#[test]
fn test_decode_rejects_trailing_bytes() {
    let mut encoded = ClientToAlex {
        key: "KEY".to_string(),
        speech: Bytes::new(),
        currently_playing_utterance: 0,
    }
    .encode()
    .to_vec();
    encoded.push(0);

    assert_eq!(ClientToAlex::decode(&encoded), Err(CodecError::TrailingBytes(1)));
}

#[test]
fn test_decode_rejects_invalid_utf8_key() {
    let mut encoded = Vec::new();
    encoded.extend_from_slice(&2u32.to_le_bytes());
    encoded.extend_from_slice(&[0xff, 0xfe]);
    encoded.extend_from_slice(&0u32.to_le_bytes());
    encoded.extend_from_slice(&0i32.to_le_bytes());

    assert_eq!(
        ClientToAlex::decode(&encoded),
        Err(CodecError::InvalidUtf8("key"))
    );
}
