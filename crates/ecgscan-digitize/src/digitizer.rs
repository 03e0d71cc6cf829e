// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Digitizer — chains the geometry, extraction, calibration, scaling, and
// alignment stages into one conversion run per scan.

use std::collections::BTreeMap;
use std::path::Path;

use ecgscan_core::config::DigitizerConfig;
use ecgscan_core::error::{EcgScanError, Result};
use ecgscan_core::types::{
    CalibratedDataset, ExtractedTrace, ExtractionResult, ExtractionStage, FailedLeadPolicy,
    InputParameters, LeadFailure, LeadId,
};
use image::{DynamicImage, RgbaImage};
use tracing::{info, instrument, warn};

use crate::align::align;
use crate::calibrate::aggregate;
use crate::export::{ExportReport, export};
use crate::extract::{
    CancellationToken, GridExtractor, LeadRunner, SignalExtractor, estimate_grids, extract_all,
};
use crate::geometry::crop_leads;
use crate::image::{PreviewRenderer, TraceOverlay};
use crate::scale::Calibration;

/// Everything a successful conversion produces.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub dataset: CalibratedDataset,
    /// Trace overlays for the leads that were traced and rendered.
    pub previews: BTreeMap<LeadId, RgbaImage>,
    /// Leads that failed signal or grid extraction, with the reason.
    pub failures: Vec<LeadFailure>,
    pub calibration: Calibration,
}

impl Conversion {
    /// Leads that produced no waveform.
    pub fn dropped_leads(&self) -> Vec<LeadId> {
        self.failures
            .iter()
            .filter(|failure| failure.stage == ExtractionStage::Signal)
            .map(|failure| failure.lead)
            .collect()
    }
}

/// Converts cropped ECG leads into a calibrated, aligned dataset.
///
/// The trace and grid extractors are supplied by the host application.
///
/// ```ignore
/// let digitizer = Digitizer::new(my_tracer, my_grid_finder);
/// let conversion = digitizer.convert(&scan, &params)?;
/// digitizer.export(&conversion.dataset, "signals.txt")?;
/// ```
pub struct Digitizer {
    signal: Box<dyn SignalExtractor>,
    grid: Box<dyn GridExtractor>,
    preview: Box<dyn PreviewRenderer>,
    config: DigitizerConfig,
}

impl Digitizer {
    // -- Construction ---------------------------------------------------------

    pub fn new(signal: impl SignalExtractor + 'static, grid: impl GridExtractor + 'static) -> Self {
        let config = DigitizerConfig::default();
        Self {
            signal: Box::new(signal),
            grid: Box::new(grid),
            preview: Box::new(TraceOverlay::new(config.trace_color)),
            config,
        }
    }

    /// Replace the configuration. The preview colour follows the new config
    /// unless a custom renderer is installed afterwards.
    pub fn with_config(mut self, config: DigitizerConfig) -> Self {
        self.preview = Box::new(TraceOverlay::new(config.trace_color));
        self.config = config;
        self
    }

    pub fn with_preview_renderer(mut self, renderer: impl PreviewRenderer + 'static) -> Self {
        self.preview = Box::new(renderer);
        self
    }

    pub fn config(&self) -> &DigitizerConfig {
        &self.config
    }

    // -- Pipeline -------------------------------------------------------------

    /// Run the full conversion for one scan.
    ///
    /// Per-lead failures are tolerated and reported in
    /// `Conversion::failures`. The run fails as a whole when no lead can be
    /// traced, when no lead yields a grid estimate, or when the resulting
    /// calibration is degenerate.
    pub fn convert(&self, image: &DynamicImage, params: &InputParameters) -> Result<Conversion> {
        self.convert_cancellable(image, params, &CancellationToken::new())
    }

    /// Like [`Digitizer::convert`], but abandons leads not yet started once
    /// `cancel` is set and returns `Cancelled`.
    ///
    /// The token belongs to this run only. A later run on the same
    /// `Digitizer` needs its own token.
    #[instrument(skip_all, fields(leads = params.leads.len(), rotation = params.rotation))]
    pub fn convert_cancellable(
        &self,
        image: &DynamicImage,
        params: &InputParameters,
        cancel: &CancellationToken,
    ) -> Result<Conversion> {
        self.config.validate()?;
        params.validate()?;

        let crops = crop_leads(image, params.rotation, &params.leads)?;
        let runner = LeadRunner::new(self.config.parallel_threshold, cancel.clone());

        // -- Signals ----------------------------------------------------------
        let mut failures = Vec::new();
        let mut traces: BTreeMap<LeadId, ExtractedTrace> = BTreeMap::new();
        for (lead, result) in extract_all(self.signal.as_ref(), &crops, &runner)? {
            match result {
                ExtractionResult::Success(trace) => {
                    traces.insert(lead, trace);
                }
                ExtractionResult::Failure(reason) => failures.push(LeadFailure {
                    lead,
                    stage: ExtractionStage::Signal,
                    reason,
                }),
            }
        }
        if traces.is_empty() {
            return Err(EcgScanError::TotalExtractionFailure {
                attempted: crops.len(),
            });
        }

        let previews = self.render_previews(&traces, &crops);

        // -- Calibration ------------------------------------------------------
        let estimates = estimate_grids(self.grid.as_ref(), &crops, &runner)?;
        for (lead, result) in &estimates {
            if let Some(reason) = result.failure_reason() {
                failures.push(LeadFailure {
                    lead: *lead,
                    stage: ExtractionStage::Grid,
                    reason: reason.to_owned(),
                });
            }
        }
        let grid = aggregate(&estimates)
            .into_result()
            .map_err(|_| EcgScanError::TotalCalibrationFailure {
                attempted: estimates.len(),
            })?;
        let calibration = Calibration::derive(
            grid,
            params.volt_scale,
            params.time_scale,
            self.config.grid_size_mm,
        )?;

        // -- Scaling + alignment ----------------------------------------------
        let scaled: BTreeMap<LeadId, Vec<f64>> = traces
            .iter()
            .map(|(lead, trace)| (*lead, calibration.apply(&trace.signal, self.config.baseline)))
            .collect();
        let mut leads = align(scaled, &params.start_times(), calibration.sampling_period)?;

        if self.config.failed_leads == FailedLeadPolicy::ZeroFill {
            let length = leads.values().map(Vec::len).max().unwrap_or(0);
            for failure in failures.iter().filter(|f| f.stage == ExtractionStage::Signal) {
                leads.insert(failure.lead, vec![0.0; length]);
            }
        }

        let dataset = CalibratedDataset::new(calibration.sampling_period, leads);
        info!(
            leads = dataset.leads.len(),
            failures = failures.len(),
            sampling_period = dataset.sampling_period,
            grid_pixels = calibration.grid_pixels,
            "Conversion complete"
        );
        Ok(Conversion {
            dataset,
            previews,
            failures,
            calibration,
        })
    }

    /// Export a dataset with the configured separator.
    pub fn export(
        &self,
        dataset: &CalibratedDataset,
        destination: impl AsRef<Path>,
    ) -> Result<ExportReport> {
        export(dataset, destination, &self.config.separator)
    }

    /// Overlay each trace on its crop. A lead whose preview cannot be drawn
    /// is skipped; previews never abort the numeric pipeline.
    fn render_previews(
        &self,
        traces: &BTreeMap<LeadId, ExtractedTrace>,
        crops: &BTreeMap<LeadId, DynamicImage>,
    ) -> BTreeMap<LeadId, RgbaImage> {
        let mut previews = BTreeMap::new();
        for (lead, trace) in traces {
            let Some(crop) = crops.get(lead) else {
                continue;
            };
            match self.preview.render(trace, crop) {
                Ok(preview) => {
                    previews.insert(*lead, preview);
                }
                Err(err) => warn!(%lead, %err, "Preview rendering failed"),
            }
        }
        previews
    }
}
