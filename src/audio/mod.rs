pub mod capture;
pub mod diagnostics;
pub mod ring_buffer;
pub mod shared;
pub mod synthetic;
pub mod system;

pub use capture::DeviceCapture;
pub use diagnostics::{
    Condition, DEFAULT_REPORT_INTERVAL, SharedThrottledCounter, ThrottledCounter,
};
pub use ring_buffer::CircularBuffer;
pub use shared::{RingStats, SampleConsumer, SampleProducer, SampleRing};
pub use synthetic::{ToneCapture, ToneGenerator};
pub use system::AudioSystem;
