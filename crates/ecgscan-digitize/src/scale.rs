// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signal normalizer/scaler — zero-baselining, pixel-to-millivolt scaling, and
// the global sampling period.
//
// All conversions are linear. Nothing is clipped or rounded here.

use ecgscan_core::config::BaselineMethod;
use ecgscan_core::error::{EcgScanError, Result};
use ecgscan_core::types::{GridEstimate, LeadSignal};
use tracing::debug;

/// Pixel-to-physical conversion shared by every lead of one scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Pixels per grid unit, used for both axes.
    pub grid_pixels: f64,
    /// Millivolts per pixel of vertical deflection.
    pub millivolts_per_pixel: f64,
    /// Seconds per sample (one sample per pixel column).
    pub sampling_period: f64,
    /// Paper voltage scale in mm/mV.
    pub volt_scale: f64,
    /// Physical size of one grid unit in mm.
    pub grid_size_mm: f64,
}

impl Calibration {
    /// Derive both scale factors from the global grid estimate.
    ///
    /// `volt_scale` is in mm/mV, `time_scale` in mm/s, and `grid_size_mm` is
    /// the physical size of one grid unit.
    pub fn derive(
        grid: GridEstimate,
        volt_scale: f64,
        time_scale: f64,
        grid_size_mm: f64,
    ) -> Result<Self> {
        let grid_pixels = grid.pixels();
        require_positive("grid spacing", grid_pixels)?;
        require_positive("voltage scale", volt_scale)?;
        require_positive("time scale", time_scale)?;
        require_positive("grid size", grid_size_mm)?;

        let millivolts_per_pixel = millivolts_per_pixel(grid_pixels, volt_scale, grid_size_mm);
        let sampling_period = sampling_period(grid_pixels, time_scale, grid_size_mm);
        require_positive("millivolts per pixel", millivolts_per_pixel)?;
        require_positive("sampling period", sampling_period)?;

        debug!(grid_pixels, millivolts_per_pixel, sampling_period, "Calibration derived");
        Ok(Self {
            grid_pixels,
            millivolts_per_pixel,
            sampling_period,
            volt_scale,
            grid_size_mm,
        })
    }

    /// Baseline and scale one extracted trace into millivolts.
    pub fn apply(&self, signal: &LeadSignal, baseline: BaselineMethod) -> Vec<f64> {
        scale_signal(signal, baseline, self.grid_pixels, self.volt_scale, self.grid_size_mm)
    }
}

/// Shift a trace so its reference level sits at zero.
///
/// Samples are image rows, which grow downward; the result is flipped so
/// that an upward deflection on paper comes out positive.
pub fn zero_baseline(signal: &LeadSignal, method: BaselineMethod) -> Vec<f64> {
    let samples = &signal.samples;
    if samples.is_empty() {
        return Vec::new();
    }
    let reference = match method {
        BaselineMethod::Mean => samples.iter().sum::<f64>() / samples.len() as f64,
        BaselineMethod::Median => median(samples),
    };
    samples.iter().map(|&row| reference - row).collect()
}

/// Zero-baseline a raw trace, then convert it from pixels to millivolts.
///
/// The baseline must come first: scaling an offset trace would scale the
/// offset with it.
pub fn scale_signal(
    signal: &LeadSignal,
    baseline: BaselineMethod,
    grid_pixels: f64,
    volt_scale: f64,
    grid_size_mm: f64,
) -> Vec<f64> {
    let zeroed = zero_baseline(signal, baseline);
    vertically_scale(&zeroed, grid_pixels, volt_scale, grid_size_mm)
}

/// Convert a zeroed trace from pixels to millivolts.
pub fn vertically_scale(
    samples: &[f64],
    grid_pixels: f64,
    volt_scale: f64,
    grid_size_mm: f64,
) -> Vec<f64> {
    let factor = millivolts_per_pixel(grid_pixels, volt_scale, grid_size_mm);
    samples.iter().map(|v| v * factor).collect()
}

/// Millivolts represented by one pixel of vertical deflection.
pub fn millivolts_per_pixel(grid_pixels: f64, volt_scale: f64, grid_size_mm: f64) -> f64 {
    let millimetres_per_pixel = grid_size_mm / grid_pixels;
    millimetres_per_pixel / volt_scale
}

/// Seconds represented by one pixel column.
pub fn sampling_period(grid_pixels: f64, time_scale: f64, grid_size_mm: f64) -> f64 {
    let millimetres_per_pixel = grid_size_mm / grid_pixels;
    millimetres_per_pixel / time_scale
}

fn median(samples: &[f64]) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn require_positive(quantity: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EcgScanError::DegenerateCalibration { quantity, value })
    }
}
