// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing explanations for conversion and export failures.
//
// The editor shows these next to the crop/scale controls, so every message
// points at the control the operator should touch next.

use crate::error::EcgScanError;

/// How the operator can react to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Changing crops, scales, or the destination is likely to fix it.
    ActionRequired,
    /// The run was stopped on purpose; running it again is fine.
    Interrupted,
    /// Re-running with the same inputs will fail the same way.
    Permanent,
}

/// An error rewritten for the person operating the editor.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What to try next (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

/// Explain an `EcgScanError` in terms of the editor's controls.
pub fn humanize_error(err: &EcgScanError) -> HumanError {
    match err {
        // -- Input parameters --
        EcgScanError::NoLeads => HumanError {
            message: "No leads have been marked on the image.".into(),
            suggestion: "Draw a box around at least one lead, then process again.".into(),
            severity: Severity::ActionRequired,
        },

        EcgScanError::InvalidParameter(detail) => HumanError {
            message: "One of the settings is out of range.".into(),
            suggestion: format!(
                "Check the voltage scale, time scale, and lead start times. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        EcgScanError::RegionOutOfBounds { lead, .. } => HumanError {
            message: format!("The box for lead {lead} reaches outside the image."),
            suggestion: "Move or shrink the box so it sits fully inside the rotated image.".into(),
            severity: Severity::ActionRequired,
        },

        // -- Extraction / calibration --
        EcgScanError::TotalExtractionFailure { .. } => HumanError {
            message: "No lead trace could be found.".into(),
            suggestion: "Fit each box tightly around one trace and check the rotation.".into(),
            severity: Severity::ActionRequired,
        },

        EcgScanError::TotalCalibrationFailure { .. } => HumanError {
            message: "The paper grid could not be measured in any lead.".into(),
            suggestion: "Include more of the printed grid in each box, or rescan at a higher \
                         resolution."
                .into(),
            severity: Severity::ActionRequired,
        },

        EcgScanError::DegenerateCalibration { .. } => HumanError {
            message: "The grid measurement does not make sense.".into(),
            suggestion:
                "Check the voltage and time scales match the paper, then process again.".into(),
            severity: Severity::ActionRequired,
        },

        EcgScanError::Cancelled => HumanError {
            message: "Processing was stopped.".into(),
            suggestion: "Process the lead data again when ready.".into(),
            severity: Severity::Interrupted,
        },

        // -- Export --
        EcgScanError::EmptyExportSet => HumanError {
            message: "There is nothing to save.".into(),
            suggestion: "Process the lead data first; at least one lead must be traced.".into(),
            severity: Severity::ActionRequired,
        },

        EcgScanError::LengthIntegrityViolation { .. } => HumanError {
            message: "The processed leads are inconsistent.".into(),
            suggestion:
                "Process the lead data again. If this keeps happening, please report it.".into(),
            severity: Severity::Permanent,
        },

        // -- Ambient --
        EcgScanError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. \
                         Try saving it as a PNG or JPEG first."
                .into(),
            severity: Severity::Permanent,
        },

        EcgScanError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file or folder couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Choose the location again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "There is no permission to write there.".into(),
                suggestion: "Choose a different folder to save the signals in.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                severity: Severity::Permanent,
            },
        },

        EcgScanError::Serialization(_) => HumanError {
            message: "The digitizer settings file could not be read.".into(),
            suggestion:
                "Check the settings file is valid JSON, or delete it to use the defaults.".into(),
            severity: Severity::ActionRequired,
        },
    }
}
