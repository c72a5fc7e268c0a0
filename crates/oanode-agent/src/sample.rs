// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample production.
//!
//! One measurement is produced per scheduler tick. The serialized form
//! appended to a ledger segment is byte-identical to the live payload,
//! so a buffered sample replays exactly as it would have been sent.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single telemetry measurement.
///
/// Wire form: `{"sData":"<comma-joined values>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Comma-joined measurement values.
    #[serde(rename = "sData")]
    pub s_data: String,
}

impl Sample {
    /// Build a sample from individual values.
    pub fn new(values: &[String]) -> Self {
        Self {
            s_data: values.join(","),
        }
    }

    /// Serialize to the wire form used for both live delivery and
    /// ledger records.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Source of one measurement per tick.
pub trait SampleSource: Send {
    /// Produce the next measurement.
    fn produce(&mut self) -> Sample;
}

/// Stock producer: three timestamp-derived values.
///
/// Emits the current Unix time plus two fixed offsets, matching the
/// collector's expected three-field `sData` layout.
#[derive(Debug, Default)]
pub struct ClockSampleSource;

impl SampleSource for ClockSampleSource {
    fn produce(&mut self) -> Sample {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Sample::new(&[
            now.to_string(),
            (now + 132).to_string(),
            (now + 500).to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_wire_form() {
        let sample = Sample::new(&["1".to_string(), "2".to_string(), "3".to_string()]);
        assert_eq!(sample.to_json().expect("serialize"), r#"{"sData":"1,2,3"}"#);
    }

    #[test]
    fn test_sample_roundtrip() {
        let sample = Sample::new(&["32".to_string(), "543".to_string(), "456.4".to_string()]);
        let json = sample.to_json().expect("serialize");
        let back: Sample = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, sample);
    }

    #[test]
    fn test_clock_source_three_fields() {
        let mut source = ClockSampleSource;
        let sample = source.produce();

        let values: Vec<u64> = sample
            .s_data
            .split(',')
            .map(|v| v.parse().expect("numeric field"))
            .collect();

        assert_eq!(values.len(), 3);
        assert_eq!(values[1] - values[0], 132);
        assert_eq!(values[2] - values[0], 500);
    }
}
