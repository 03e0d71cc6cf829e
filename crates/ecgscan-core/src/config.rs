// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digitizer configuration.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{EcgScanError, Result};
use crate::types::FailedLeadPolicy;

/// Reference level subtracted from a trace before voltage scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineMethod {
    /// Arithmetic mean of all samples.
    #[default]
    Mean,
    /// Median sample; less sensitive to tall QRS complexes.
    Median,
}

/// Pipeline settings that are not chosen per scan.
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitizerConfig {
    /// Physical size of one calibration grid square, in millimetres.
    pub grid_size_mm: f64,
    /// Column separator in exported files.
    pub separator: String,
    /// How the zero level of each trace is chosen.
    pub baseline: BaselineMethod,
    /// Whether leads with no extracted trace are omitted or zero-filled.
    pub failed_leads: FailedLeadPolicy,
    /// Minimum number of leads before extraction fans out across threads.
    pub parallel_threshold: usize,
    /// RGBA colour of the trace drawn on preview images.
    pub trace_color: [u8; 4],
}

impl Default for DigitizerConfig {
    fn default() -> Self {
        Self {
            grid_size_mm: 1.0,
            separator: "\t".to_owned(),
            baseline: BaselineMethod::Mean,
            failed_leads: FailedLeadPolicy::Omit,
            parallel_threshold: 2,
            trace_color: [255, 0, 0, 255],
        }
    }
}

impl DigitizerConfig {
    /// Parse a configuration from JSON text and validate it.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        debug!(?config, "Digitizer configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.grid_size_mm.is_finite() || self.grid_size_mm <= 0.0 {
            return Err(EcgScanError::InvalidParameter(format!(
                "grid_size_mm must be a positive number, got {}",
                self.grid_size_mm
            )));
        }
        if self.separator.is_empty() || self.separator.contains('\n') {
            return Err(EcgScanError::InvalidParameter(
                "separator must be non-empty and must not contain a newline".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_export_format() {
        let config = DigitizerConfig::default();
        assert_eq!(config.separator, "\t");
        assert_eq!(config.grid_size_mm, 1.0);
        assert_eq!(config.failed_leads, FailedLeadPolicy::Omit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = DigitizerConfig::from_json(r#"{ "separator": ",", "baseline": "median" }"#)
            .expect("parse config");
        assert_eq!(config.separator, ",");
        assert_eq!(config.baseline, BaselineMethod::Median);
        assert_eq!(config.grid_size_mm, 1.0);
        assert_eq!(config.parallel_threshold, 2);
    }

    #[test]
    fn invalid_grid_size_is_rejected() {
        let result = DigitizerConfig::from_json(r#"{ "grid_size_mm": 0.0 }"#);
        assert!(matches!(result, Err(EcgScanError::InvalidParameter(_))));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let result = DigitizerConfig::from_json("{ not json");
        assert!(matches!(result, Err(EcgScanError::Serialization(_))));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("digitizer.json");
        std::fs::write(&path, r#"{ "failed_leads": "zero_fill" }"#).expect("write config");

        let config = DigitizerConfig::load(&path).expect("load config");
        assert_eq!(config.failed_leads, FailedLeadPolicy::ZeroFill);
    }
}
