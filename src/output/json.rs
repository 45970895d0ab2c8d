use serde::Serialize;

use super::{Formatter, LevelReport, iso8601_timestamp};

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonLine<'a> {
    ts: String,
    rms_dbfs: f32,
    #[serde(flatten)]
    report: &'a LevelReport,
}

impl Formatter for JsonFormatter {
    fn format(&self, report: &LevelReport) -> String {
        let line = JsonLine {
            ts: iso8601_timestamp(),
            rms_dbfs: report.rms_dbfs(),
            report,
        };
        // Plain numeric fields cannot fail to serialize
        serde_json::to_string(&line).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::sample_report;
    use super::*;

    #[test]
    fn test_json_line_fields() {
        let line = JsonFormatter.format(&sample_report());
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert!(value["ts"].is_string());
        assert_eq!(value["samples"], 4800);
        assert_eq!(value["overruns"], 3);
        assert_eq!(value["underruns"], 0);
        assert_eq!(value["capacity"], 48000);
        assert!((value["rms"].as_f64().unwrap() - 0.25).abs() < 1e-6);
    }
}
