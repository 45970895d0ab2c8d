use crate::config::{HarnessConfig, SourceKind};
use crate::error::{CaptureError, Result};

use super::{DeviceCapture, RingStats, SampleConsumer, SampleRing, ToneCapture};

enum Session {
    Device(DeviceCapture),
    Tone(ToneCapture),
}

impl Session {
    fn stop(self) -> Result<()> {
        match self {
            Session::Device(capture) => capture.stop(),
            Session::Tone(capture) => capture.stop(),
        }
    }
}

/// Audio session controller
///
/// `start` opens the configured source and hands back the consuming half of
/// a fresh sample ring; `stop` ends the stream. Each session gets its own
/// ring, so counters start from zero on every `start`.
pub struct AudioSystem {
    config: HarnessConfig,
    session: Option<Session>,
    stats: Option<RingStats>,
}

impl AudioSystem {
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            session: None,
            stats: None,
        })
    }

    /// Begin producing samples
    pub fn start(&mut self) -> Result<SampleConsumer<f32>> {
        if self.session.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }

        let (producer, consumer) = SampleRing::from_config::<f32>(&self.config.buffer)?;
        let stats = producer.stats();

        let session = match self.config.source.kind {
            SourceKind::Device => {
                Session::Device(DeviceCapture::start(&self.config.audio, producer)?)
            }
            SourceKind::Tone => Session::Tone(ToneCapture::start(
                &self.config.audio,
                &self.config.source,
                producer,
            )?),
        };

        log::info!(
            "Audio session started ({:?} source, {} Hz, {} ch, ring {} samples, {:?}/{:?})",
            self.config.source.kind,
            self.config.audio.sample_rate,
            self.config.audio.channels,
            self.config.buffer.capacity,
            self.config.buffer.overrun_policy,
            self.config.buffer.underrun_policy
        );

        self.session = Some(session);
        self.stats = Some(stats);
        Ok(consumer)
    }

    /// Stop producing samples; a no-op when idle
    pub fn stop(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        session.stop()?;

        if let Some(stats) = &self.stats {
            log::info!(
                "Audio session stopped (overruns: {}, underruns: {})",
                stats.overruns(),
                stats.underruns()
            );
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Counters of the current or most recent session's ring
    pub fn stats(&self) -> Option<RingStats> {
        self.stats.clone()
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to stop audio session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        done()
    }

    fn tone_config() -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.source.kind = SourceKind::Tone;
        config.audio.block_size = 256;
        config
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = tone_config();
        config.buffer.capacity = 0;
        assert!(AudioSystem::new(&config).is_err());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut system = AudioSystem::new(&tone_config()).unwrap();
        assert!(!system.is_running());
        assert!(system.stop().is_ok());
        assert!(system.stats().is_none());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut system = AudioSystem::new(&tone_config()).unwrap();
        let _consumer = system.start().unwrap();
        assert!(system.is_running());
        assert!(matches!(system.start(), Err(CaptureError::AlreadyRunning)));
        system.stop().unwrap();
        assert!(!system.is_running());
    }

    #[test]
    fn test_tone_session_produces_samples() {
        let mut system = AudioSystem::new(&tone_config()).unwrap();
        let consumer = system.start().unwrap();

        assert!(wait_until(Duration::from_secs(5), || consumer.len() > 0));
        system.stop().unwrap();

        let stats = system.stats().unwrap();
        assert_eq!(stats.overruns(), 0);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut system = AudioSystem::new(&tone_config()).unwrap();
        let _first = system.start().unwrap();
        system.stop().unwrap();
        let second = system.start().unwrap();
        assert_eq!(second.capacity(), 48000);
        system.stop().unwrap();
    }
}
