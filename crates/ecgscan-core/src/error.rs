// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ecgscan.

use thiserror::Error;

use crate::types::{LeadId, Rectangle};

/// Top-level error type for all ecgscan operations.
///
/// Per-lead extraction failures are not errors: they travel as
/// `ExtractionResult::Failure` and end up as `LeadFailure` diagnostics.
/// Everything here aborts the whole conversion or export.
#[derive(Debug, Error)]
pub enum EcgScanError {
    // -- Input parameters --
    #[error("no leads configured")]
    NoLeads,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("region {region} for lead {lead} does not fit inside the {width}x{height} image")]
    RegionOutOfBounds {
        lead: LeadId,
        region: Rectangle,
        width: u32,
        height: u32,
    },

    // -- Extraction / calibration --
    #[error("signal extraction failed for all {attempted} leads")]
    TotalExtractionFailure { attempted: usize },

    #[error("grid estimation failed for all {attempted} leads")]
    TotalCalibrationFailure { attempted: usize },

    #[error("degenerate calibration: {quantity} is {value}")]
    DegenerateCalibration { quantity: &'static str, value: f64 },

    #[error("conversion cancelled")]
    Cancelled,

    // -- Export --
    #[error("lead {lead} has {actual} samples but {expected} were expected")]
    LengthIntegrityViolation {
        lead: LeadId,
        expected: usize,
        actual: usize,
    },

    #[error("nothing to export: dataset contains no leads")]
    EmptyExportSet,

    // -- Ambient --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EcgScanError>;
