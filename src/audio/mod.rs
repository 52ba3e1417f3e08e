pub mod frame;
pub mod relay;

pub use frame::AudioFrame;
pub use relay::{AudioRelayBuffer, DEFAULT_CHUNK_SIZE};
