// Audio relay buffer tests

use bytes::{Bytes, BytesMut};
use voice_relay::audio::{AudioRelayBuffer, DEFAULT_CHUNK_SIZE};

#[test]
fn test_default_chunk_size() {
    let relay = AudioRelayBuffer::default();
    assert_eq!(relay.chunk_size(), DEFAULT_CHUNK_SIZE);
    assert_eq!(relay.chunk_size(), 640);
}

#[test]
fn test_drain_never_emits_partial_chunk() {
    let mut relay = AudioRelayBuffer::new(640);

    relay.enqueue_outbound(&[1u8; 639]);
    assert!(relay.drain().is_empty());
    assert_eq!(relay.buffered(), 639);

    relay.enqueue_outbound(&[2u8; 1]);
    let chunks = relay.drain();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].len(), 640);
    assert_eq!(relay.buffered(), 0);
}

#[test]
fn test_two_1000_byte_pushes() {
    let mut relay = AudioRelayBuffer::new(640);

    relay.enqueue_outbound(&[0u8; 1000]);
    let first = relay.drain();
    assert_eq!(first.len(), 1);
    assert_eq!(relay.buffered(), 360);

    relay.enqueue_outbound(&[0u8; 1000]);
    let second = relay.drain();
    assert_eq!(second.len(), 2);
    assert!(second.iter().all(|c| c.len() == 640));
    assert_eq!(relay.buffered(), 80);
}

#[test]
fn test_chunks_concatenate_to_input() {
    let push_sizes = [1usize, 7, 640, 1000, 3, 1279, 2, 641, 0, 5000];
    let mut relay = AudioRelayBuffer::new(640);
    let mut input = BytesMut::new();
    let mut output = BytesMut::new();
    let mut next = 0u8;

    for size in push_sizes {
        let data: Vec<u8> = (0..size)
            .map(|_| {
                next = next.wrapping_add(1);
                next
            })
            .collect();
        input.extend_from_slice(&data);
        relay.enqueue_outbound(&data);

        for chunk in relay.drain() {
            assert_eq!(chunk.len(), 640, "Every emitted chunk must be full size");
            output.extend_from_slice(&chunk);
        }
        assert!(relay.buffered() < 640);
    }

    let total: usize = push_sizes.iter().sum();
    assert_eq!(output.len(), total - total % 640);
    assert_eq!(&output[..], &input[..output.len()]);
    assert_eq!(relay.buffered(), total % 640);
}

#[test]
fn test_clear_discards_pending_audio() {
    let mut relay = AudioRelayBuffer::new(640);
    relay.enqueue_outbound(&[0u8; 900]);

    assert_eq!(relay.clear(), 900);
    assert_eq!(relay.buffered(), 0);
    assert!(relay.drain().is_empty());
}

#[test]
fn test_relay_inbound_requires_connection() {
    let relay = AudioRelayBuffer::new(640);

    let frame = relay
        .relay_inbound(Bytes::from_static(b"abcd"), true)
        .expect("connected relay forwards audio");
    assert_eq!(&frame.payload[..], b"abcd");

    assert!(relay.relay_inbound(Bytes::from_static(b"abcd"), false).is_none());
}
