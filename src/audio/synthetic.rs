use std::f32::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::config::{AudioConfig, SourceConfig};
use crate::error::{CaptureError, Result};

use super::SampleProducer;

/// Sine oscillator producing interleaved blocks
///
/// Every channel carries the same tone. A channel count of zero is treated
/// as mono.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    phase: f32,
    phase_step: f32,
    amplitude: f32,
    channels: usize,
}

impl ToneGenerator {
    pub fn new(frequency_hz: f32, amplitude: f32, sample_rate: u32, channels: u16) -> Self {
        Self {
            phase: 0.0,
            phase_step: 2.0 * PI * frequency_hz / sample_rate as f32,
            amplitude,
            channels: channels.max(1) as usize,
        }
    }

    /// Fill `block` with whole frames; a trailing partial frame is zeroed
    pub fn fill(&mut self, block: &mut [f32]) {
        let mut frames = block.chunks_exact_mut(self.channels);
        for frame in &mut frames {
            let value = self.amplitude * self.phase.sin();
            frame.fill(value);
            self.phase = (self.phase + self.phase_step) % (2.0 * PI);
        }
        frames.into_remainder().fill(0.0);
    }
}

/// Paced tone source running on its own thread
///
/// Emits one block of `block_size` frames per block period, the way an audio
/// callback would.
pub struct ToneCapture {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ToneCapture {
    pub fn start(
        audio: &AudioConfig,
        source: &SourceConfig,
        mut producer: SampleProducer<f32>,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let mut generator = ToneGenerator::new(
            source.tone_hz,
            source.tone_amplitude,
            audio.sample_rate,
            audio.channels,
        );
        let mut block = vec![0.0f32; audio.samples_per_block()];
        let period = audio.block_duration();
        let block_size = audio.block_size as u32;
        let sample_rate = audio.sample_rate;

        log::info!(
            "Tone source: {:.1} Hz at amplitude {:.2}",
            source.tone_hz,
            source.tone_amplitude
        );

        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("tone-source".into())
            .spawn(move || {
                let rt_handle =
                    audio_thread_priority::promote_current_thread_to_real_time(block_size, sample_rate);
                let rt_handle = match rt_handle {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        log::warn!("Could not set real-time priority: {}", e);
                        None
                    }
                };

                let mut next_deadline = Instant::now();
                while flag.load(Ordering::Acquire) {
                    generator.fill(&mut block);
                    producer.push_slice(&block);

                    next_deadline += period;
                    let now = Instant::now();
                    if next_deadline > now {
                        thread::sleep(next_deadline - now);
                    } else {
                        // Fell behind; resynchronise instead of bursting
                        log::trace!("Tone source late by {:?}", now - next_deadline);
                        next_deadline = now;
                    }
                }

                if let Some(handle) = rt_handle {
                    if let Err(e) =
                        audio_thread_priority::demote_current_thread_from_real_time(handle)
                    {
                        log::debug!("Could not restore thread priority: {}", e);
                    }
                }
            })?;

        Ok(Self { running, handle })
    }

    /// Signal the generator thread and wait for it to exit
    pub fn stop(self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        self.handle
            .join()
            .map_err(|_| CaptureError::AudioStream("tone source thread panicked".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_generator_interleaves_channels() {
        let mut generator = ToneGenerator::new(1000.0, 0.5, 48000, 2);
        let mut block = vec![0.0f32; 96];
        generator.fill(&mut block);

        for frame in block.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert_eq!(block[0], 0.0);
        let peak = block.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert_abs_diff_eq!(peak, 0.5, epsilon = 0.01);
    }

    #[test]
    fn test_generator_phase_continues_across_blocks() {
        let mut whole = ToneGenerator::new(440.0, 1.0, 48000, 1);
        let mut split = whole.clone();

        let mut one = vec![0.0f32; 200];
        whole.fill(&mut one);

        let mut first = vec![0.0f32; 120];
        let mut second = vec![0.0f32; 80];
        split.fill(&mut first);
        split.fill(&mut second);

        first.extend_from_slice(&second);
        for (a, b) in one.iter().zip(&first) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_partial_frame_zeroed() {
        let mut generator = ToneGenerator::new(1000.0, 1.0, 48000, 2);
        let mut block = vec![9.0f32; 5];
        generator.fill(&mut block);
        assert_eq!(block[4], 0.0);
    }

    #[test]
    fn test_zero_channels_treated_as_mono() {
        let mut generator = ToneGenerator::new(1000.0, 1.0, 48000, 0);
        let mut mono = ToneGenerator::new(1000.0, 1.0, 48000, 1);
        let mut block = vec![9.0f32; 16];
        let mut expected = vec![0.0f32; 16];
        generator.fill(&mut block);
        mono.fill(&mut expected);
        assert_eq!(block, expected);
    }
}
