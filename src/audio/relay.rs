// Audio relay buffer
//
// Outbound audio from the pipeline arrives in arbitrarily sized frames; the client
// expects fixed-size chunks. The relay accumulates bytes and hands out whole chunks
// only, carrying any remainder over to the next drain.

use bytes::{Bytes, BytesMut};
use tracing::debug;

use super::frame::AudioFrame;

/// Default chunk size: 20ms of 16kHz mono 16-bit PCM
pub const DEFAULT_CHUNK_SIZE: usize = 640;

#[derive(Debug)]
pub struct AudioRelayBuffer {
    chunk_size: usize,
    pending: BytesMut,
}

impl AudioRelayBuffer {
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");

        Self {
            chunk_size,
            pending: BytesMut::with_capacity(chunk_size * 4),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Bytes waiting for a full chunk
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn enqueue_outbound(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Remove every whole chunk from the head of the buffer, in arrival order
    pub fn drain(&mut self) -> Vec<Bytes> {
        let count = self.pending.len() / self.chunk_size;
        let mut chunks = Vec::with_capacity(count);

        for _ in 0..count {
            chunks.push(self.pending.split_to(self.chunk_size).freeze());
        }

        if count > 0 {
            debug!(
                "Drained {} chunks, {} bytes carried over",
                count,
                self.pending.len()
            );
        }

        chunks
    }

    /// Discard everything not yet sent
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Frame client audio for the pipeline; nothing is relayed without a connected client
    pub fn relay_inbound(&self, bytes: Bytes, connected: bool) -> Option<AudioFrame> {
        if !connected {
            debug!("Dropping {} inbound bytes: no client connected", bytes.len());
            return None;
        }

        Some(AudioFrame { payload: bytes })
    }
}

impl Default for AudioRelayBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}
