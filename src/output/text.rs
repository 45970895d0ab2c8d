use super::{Formatter, LevelReport};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, report: &LevelReport) -> String {
        if self.verbose {
            format!(
                "{:>7.1} dBFS  rms {:.4}  peak {:.4}  {:>7} samples  fill {:>6}/{:<6}  overruns {}  underruns {}",
                report.rms_dbfs(),
                report.rms,
                report.peak,
                report.samples,
                report.buffered,
                report.capacity,
                report.overruns,
                report.underruns
            )
        } else {
            format!(
                "Level: {:>7.1} dBFS (peak {:.3})",
                report.rms_dbfs(),
                report.peak
            )
        }
    }

    fn header(&self) -> Option<&'static str> {
        self.verbose
            .then_some("  level     rms         peak        consumed     ring fill      diagnostics")
    }
}
