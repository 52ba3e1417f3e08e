use bytes::Bytes;

/// A slice of raw audio crossing the pipeline boundary
///
/// Payload is passed through untouched (16-bit PCM on both sides); no codec is applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioFrame {
    pub payload: Bytes,
}

impl AudioFrame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
