// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the ecgscan digitizer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EcgScanError, Result};

/// One of the twelve standard ECG leads.
///
/// Declaration order is the canonical rank (I first, V6 last), so the derived
/// `Ord` sorts leads the way a cardiologist expects to read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeadId {
    I,
    II,
    III,
    #[serde(rename = "aVR")]
    Avr,
    #[serde(rename = "aVL")]
    Avl,
    #[serde(rename = "aVF")]
    Avf,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
}

impl LeadId {
    /// All leads in canonical rank order.
    pub const ALL: [LeadId; 12] = [
        Self::I,
        Self::II,
        Self::III,
        Self::Avr,
        Self::Avl,
        Self::Avf,
        Self::V1,
        Self::V2,
        Self::V3,
        Self::V4,
        Self::V5,
        Self::V6,
    ];

    /// Stable rank used for export ordering (I = 0 … V6 = 11).
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Conventional printed name of the lead.
    pub fn name(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::Avr => "aVR",
            Self::Avl => "aVL",
            Self::Avf => "aVF",
            Self::V1 => "V1",
            Self::V2 => "V2",
            Self::V3 => "V3",
            Self::V4 => "V4",
            Self::V5 => "V5",
            Self::V6 => "V6",
        }
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LeadId {
    type Err = EcgScanError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|lead| lead.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| EcgScanError::InvalidParameter(format!("unknown lead name: {s:?}")))
    }
}

/// Axis-aligned rectangle in image pixel coordinates.
///
/// Unsigned fields make negative sizes unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge. Widened to `u64` so huge rectangles cannot wrap.
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the rectangle is non-empty and lies entirely inside an image
    /// of the given dimensions.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.right() <= u64::from(width) && self.bottom() <= u64::from(height)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Operator-supplied settings for a single lead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadRegion {
    /// Crop region in rotated-image coordinates.
    pub region: Rectangle,
    /// Offset of the lead's first sample within the recording, in seconds.
    pub start_time: f64,
}

impl LeadRegion {
    pub fn new(region: Rectangle, start_time: f64) -> Self {
        Self { region, start_time }
    }
}

/// Everything the operator chooses before a conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct InputParameters {
    /// Rotation correction applied to the whole scan, in degrees (clockwise).
    pub rotation: f32,
    /// Per-lead crop region and start time.
    pub leads: BTreeMap<LeadId, LeadRegion>,
    /// Paper voltage scale in mm per mV (10 on standard paper).
    pub volt_scale: f64,
    /// Paper speed in mm per second (25 on standard paper).
    pub time_scale: f64,
}

impl InputParameters {
    pub fn new(rotation: f32, volt_scale: f64, time_scale: f64) -> Self {
        Self {
            rotation,
            leads: BTreeMap::new(),
            volt_scale,
            time_scale,
        }
    }

    /// Add (or replace) a lead configuration, builder style.
    pub fn with_lead(mut self, lead: LeadId, region: Rectangle, start_time: f64) -> Self {
        self.leads.insert(lead, LeadRegion::new(region, start_time));
        self
    }

    /// Start time per configured lead.
    pub fn start_times(&self) -> BTreeMap<LeadId, f64> {
        self.leads
            .iter()
            .map(|(lead, config)| (*lead, config.start_time))
            .collect()
    }

    /// Reject parameter sets the pipeline cannot calibrate.
    ///
    /// Region bounds are not checked here: they depend on the rotated image
    /// and are enforced when cropping.
    pub fn validate(&self) -> Result<()> {
        if self.leads.is_empty() {
            return Err(EcgScanError::NoLeads);
        }
        if !self.rotation.is_finite() {
            return Err(EcgScanError::InvalidParameter(format!(
                "rotation must be finite, got {}",
                self.rotation
            )));
        }
        for (name, value) in [("volt_scale", self.volt_scale), ("time_scale", self.time_scale)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EcgScanError::InvalidParameter(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        for (lead, config) in &self.leads {
            if !config.start_time.is_finite() || config.start_time < 0.0 {
                return Err(EcgScanError::InvalidParameter(format!(
                    "start time for lead {lead} must be a non-negative number, got {}",
                    config.start_time
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of running an external extractor on one lead.
///
/// There is no partial state.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult<T> {
    Success(T),
    Failure(String),
}

impl<T> ExtractionResult<T> {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(reason) => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionResult<U> {
        match self {
            Self::Success(value) => ExtractionResult::Success(f(value)),
            Self::Failure(reason) => ExtractionResult::Failure(reason),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, String> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(reason) => Err(reason),
        }
    }
}

impl<T, E: fmt::Display> From<std::result::Result<T, E>> for ExtractionResult<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(err.to_string()),
        }
    }
}

/// Raw waveform samples as returned by a signal extractor.
///
/// Samples are image row coordinates (y grows downward) until the
/// normalizer converts them to millivolts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeadSignal {
    pub samples: Vec<f64>,
}

impl LeadSignal {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<f64>> for LeadSignal {
    fn from(samples: Vec<f64>) -> Self {
        Self::new(samples)
    }
}

/// Pixel column of each extracted sample.
pub type TimeSequence = Vec<f64>;

/// A successfully traced lead: the waveform and where each sample sits
/// horizontally in the crop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedTrace {
    pub signal: LeadSignal,
    pub time: TimeSequence,
}

impl ExtractedTrace {
    pub fn new(signal: impl Into<LeadSignal>, time: TimeSequence) -> Self {
        Self {
            signal: signal.into(),
            time,
        }
    }

    /// Build a trace with one sample per pixel column, starting at column 0.
    pub fn from_columns(samples: Vec<f64>) -> Self {
        let time = (0..samples.len()).map(|column| column as f64).collect();
        Self::new(samples, time)
    }
}

/// Pixel distance of one printed calibration grid unit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct GridEstimate(pub f64);

impl GridEstimate {
    pub fn pixels(&self) -> f64 {
        self.0
    }
}

/// Which extraction stage rejected a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStage {
    /// Trace extraction failed; the lead has no waveform.
    Signal,
    /// Grid estimation failed; the lead still contributes its waveform but
    /// not its spacing to the global calibration.
    Grid,
}

/// Diagnostic record for a lead that failed one of the extraction stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFailure {
    pub lead: LeadId,
    pub stage: ExtractionStage,
    pub reason: String,
}

/// What to do with leads whose trace could not be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedLeadPolicy {
    /// Leave them out of the dataset entirely.
    #[default]
    Omit,
    /// Emit an all-zero channel of the common length.
    ZeroFill,
}

/// Terminal artifact of a conversion: aligned, equal-length channels plus
/// the sampling period they share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedDataset {
    /// Seconds between consecutive samples.
    pub sampling_period: f64,
    pub leads: BTreeMap<LeadId, Vec<f64>>,
}

impl CalibratedDataset {
    pub fn new(sampling_period: f64, leads: BTreeMap<LeadId, Vec<f64>>) -> Self {
        Self {
            sampling_period,
            leads,
        }
    }

    pub fn lead_ids(&self) -> Vec<LeadId> {
        self.leads.keys().copied().collect()
    }

    /// Check the export invariants and return the common sequence length.
    ///
    /// Fails with `EmptyExportSet` when no lead is present and with
    /// `LengthIntegrityViolation` on the first lead (in rank order) whose
    /// length differs from the lowest-ranked lead.
    pub fn validate(&self) -> Result<usize> {
        let mut iter = self.leads.iter();
        let (_, first) = iter.next().ok_or(EcgScanError::EmptyExportSet)?;
        let expected = first.len();
        for (lead, samples) in iter {
            if samples.len() != expected {
                return Err(EcgScanError::LengthIntegrityViolation {
                    lead: *lead,
                    expected,
                    actual: samples.len(),
                });
            }
        }
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_rank_follows_clinical_order() {
        assert!(LeadId::I < LeadId::II);
        assert!(LeadId::III < LeadId::Avr);
        assert!(LeadId::Avf < LeadId::V1);
        assert_eq!(LeadId::I.rank(), 0);
        assert_eq!(LeadId::V6.rank(), 11);
    }

    #[test]
    fn lead_names_round_trip_through_from_str() {
        for lead in LeadId::ALL {
            let parsed: LeadId = lead.to_string().parse().expect("parse lead name");
            assert_eq!(parsed, lead);
        }
        assert_eq!("avr".parse::<LeadId>().expect("case-insensitive"), LeadId::Avr);
        assert!("V7".parse::<LeadId>().is_err());
    }

    #[test]
    fn rectangle_bounds() {
        let rect = Rectangle::new(10, 20, 30, 40);
        assert_eq!(rect.right(), 40);
        assert_eq!(rect.bottom(), 60);
        assert!(rect.fits_within(40, 60));
        assert!(!rect.fits_within(39, 60));
        assert!(!Rectangle::new(0, 0, 0, 10).fits_within(100, 100));
        assert!(!Rectangle::new(u32::MAX, 0, 2, 1).fits_within(u32::MAX, 10));
    }

    #[test]
    fn validate_rejects_bad_scales_and_start_times() {
        let region = Rectangle::new(0, 0, 10, 10);
        let ok = InputParameters::new(0.0, 10.0, 25.0).with_lead(LeadId::I, region, 0.0);
        assert!(ok.validate().is_ok());

        let no_leads = InputParameters::new(0.0, 10.0, 25.0);
        assert!(matches!(no_leads.validate(), Err(EcgScanError::NoLeads)));

        let zero_volt = InputParameters::new(0.0, 0.0, 25.0).with_lead(LeadId::I, region, 0.0);
        assert!(matches!(
            zero_volt.validate(),
            Err(EcgScanError::InvalidParameter(_))
        ));

        let negative_start =
            InputParameters::new(0.0, 10.0, 25.0).with_lead(LeadId::I, region, -0.1);
        assert!(matches!(
            negative_start.validate(),
            Err(EcgScanError::InvalidParameter(_))
        ));
    }

    #[test]
    fn extraction_result_converts_from_result() {
        let ok: ExtractionResult<u8> = Ok::<u8, String>(3).into();
        assert_eq!(ok.success(), Some(&3));

        let failed: ExtractionResult<u8> = Err::<u8, &str>("no trace").into();
        assert_eq!(failed.failure_reason(), Some("no trace"));
        assert!(!failed.is_success());
    }

    #[test]
    fn dataset_validate_reports_common_length() {
        let mut leads = BTreeMap::new();
        leads.insert(LeadId::II, vec![0.0; 4]);
        leads.insert(LeadId::I, vec![1.0; 4]);
        let dataset = CalibratedDataset::new(0.004, leads);
        assert_eq!(dataset.validate().expect("valid dataset"), 4);
        assert_eq!(dataset.lead_ids(), vec![LeadId::I, LeadId::II]);
    }

    #[test]
    fn dataset_validate_catches_length_mismatch() {
        let mut leads = BTreeMap::new();
        leads.insert(LeadId::I, vec![0.0; 4]);
        leads.insert(LeadId::V2, vec![0.0; 3]);
        let dataset = CalibratedDataset::new(0.004, leads);
        match dataset.validate() {
            Err(EcgScanError::LengthIntegrityViolation {
                lead,
                expected,
                actual,
            }) => {
                assert_eq!(lead, LeadId::V2);
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset = CalibratedDataset::new(0.004, BTreeMap::new());
        assert!(matches!(dataset.validate(), Err(EcgScanError::EmptyExportSet)));
    }
}
