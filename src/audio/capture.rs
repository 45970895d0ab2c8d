use crate::config::AudioConfig;
use crate::error::{CaptureError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::SampleProducer;

/// Live input stream from the host's default capture device
pub struct DeviceCapture {
    stream: cpal::Stream,
}

impl DeviceCapture {
    /// Open the default input device and start pushing samples into `producer`
    pub fn start(config: &AudioConfig, mut producer: SampleProducer<f32>) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::AudioDevice("No input device found".into()))?;

        match device.description() {
            Ok(desc) => log::info!("Input device: {:?}", desc),
            Err(_) => log::info!("Input device: Unknown"),
        }

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.block_size as u32),
        };

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Never blocks; a full ring counts overruns instead
                    producer.push_slice(data);
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| CaptureError::AudioStream(format!("{}", e)))?;

        stream
            .play()
            .map_err(|e| CaptureError::AudioStream(format!("{}", e)))?;

        Ok(Self { stream })
    }

    pub fn stop(self) -> Result<()> {
        self.stream
            .pause()
            .map_err(|e| CaptureError::AudioStream(format!("{}", e)))
    }
}
