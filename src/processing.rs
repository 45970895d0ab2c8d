use rolling_stats::Stats;
use serde::Serialize;

use crate::audio::SampleConsumer;

/// Signal level and ring health over one reporting window
#[derive(Debug, Clone, Serialize)]
pub struct LevelReport {
    /// Root mean square of the samples consumed in the window
    pub rms: f32,
    /// Largest absolute sample in the window
    pub peak: f32,
    /// Samples consumed in the window
    pub samples: usize,
    /// Samples left in the ring when the report was taken
    pub buffered: usize,
    pub capacity: usize,
    /// Running totals for the session
    pub overruns: u64,
    pub underruns: u64,
}

impl LevelReport {
    /// RMS level in dBFS, floored at -120 dB for silence
    pub fn rms_dbfs(&self) -> f32 {
        if self.rms <= 1e-6 {
            -120.0
        } else {
            20.0 * self.rms.log10()
        }
    }
}

/// Consumer routine draining a sample ring and measuring its level
///
/// Drains block-wise, so an empty ring never counts as an underrun here.
pub struct LevelMonitor {
    block: Vec<f32>,
    // Statistics over squared samples: mean gives RMS², max gives peak²
    power: Stats<f32>,
    recording: Option<Vec<f32>>,
}

impl LevelMonitor {
    /// # Arguments
    /// * `window` - Samples drained from the ring per block
    pub fn new(window: usize) -> Self {
        Self {
            block: vec![0.0; window.max(1)],
            power: Stats::new(),
            recording: None,
        }
    }

    /// Keep a copy of every consumed sample for [`take_recording`](Self::take_recording)
    pub fn with_recording(mut self) -> Self {
        self.recording = Some(Vec::new());
        self
    }

    /// Consume everything currently in the ring
    ///
    /// # Returns
    /// Number of samples consumed
    pub fn drain(&mut self, consumer: &mut SampleConsumer<f32>) -> usize {
        let mut total = 0;
        loop {
            let n = consumer.pop_into(&mut self.block);
            if n == 0 {
                break;
            }
            self.process(n);
            total += n;
        }
        log::trace!("Drained {} samples", total);
        total
    }

    fn process(&mut self, n: usize) {
        let samples = &self.block[..n];
        for &sample in samples {
            self.power.update(sample * sample);
        }
        if let Some(recording) = self.recording.as_mut() {
            recording.extend_from_slice(samples);
        }
    }

    /// Snapshot the current window and start a new one
    pub fn report(&mut self, consumer: &SampleConsumer<f32>) -> LevelReport {
        let stats = consumer.stats();
        let (rms, peak) = if self.power.count == 0 {
            (0.0, 0.0)
        } else {
            (self.power.mean.max(0.0).sqrt(), self.power.max.sqrt())
        };

        let report = LevelReport {
            rms,
            peak,
            samples: self.power.count,
            buffered: consumer.len(),
            capacity: consumer.capacity(),
            overruns: stats.overruns(),
            underruns: stats.underruns(),
        };

        self.power = Stats::new();
        report
    }

    /// Samples consumed since recording was enabled or last taken
    pub fn take_recording(&mut self) -> Vec<f32> {
        self.recording.as_mut().map(std::mem::take).unwrap_or_default()
    }
}
