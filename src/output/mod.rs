mod json;
mod text;

use chrono::Utc;

pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

use crate::processing::LevelReport;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub trait Formatter: Send {
    fn format(&self, report: &LevelReport) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn sample_report() -> LevelReport {
        LevelReport {
            rms: 0.25,
            peak: 0.5,
            samples: 4800,
            buffered: 12,
            capacity: 48000,
            overruns: 3,
            underruns: 0,
        }
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = iso8601_timestamp();
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }

    #[test]
    fn test_text_formatter_has_header_in_verbose_mode_only() {
        assert!(create_formatter(OutputFormat::Text, true).header().is_some());
        assert!(create_formatter(OutputFormat::Text, false).header().is_none());
        assert!(create_formatter(OutputFormat::Json, false).header().is_none());
    }
}
