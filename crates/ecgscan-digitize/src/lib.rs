// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ecgscan-digitize — Turns a scanned ECG printout into calibrated voltage
// signals.
//
// Rotates and crops the scan per lead, fans the crops out to pluggable trace
// and grid extractors, derives a shared pixel-to-millivolt calibration,
// aligns every lead on one time axis, and exports the result as delimited
// text.

pub mod align;
pub mod calibrate;
pub mod digitizer;
pub mod export;
pub mod extract;
pub mod geometry;
pub mod image;
pub mod scale;

// Re-export the primary types so callers can use `ecgscan_digitize::Digitizer` etc.
pub use digitizer::{Conversion, Digitizer};
pub use export::ExportReport;
pub use extract::{CancellationToken, GridExtractor, LeadRunner, SignalExtractor};
pub use image::{ImageProcessor, PreviewRenderer, TraceOverlay};
pub use scale::Calibration;
