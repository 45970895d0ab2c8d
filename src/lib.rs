pub mod audio;
pub mod config;
pub mod error;
pub mod output;
pub mod processing;
pub mod wav;

pub use audio::{AudioSystem, CircularBuffer, SampleRing};
pub use config::HarnessConfig;
pub use error::{CaptureError, Result};
pub use wav::save_wav;
