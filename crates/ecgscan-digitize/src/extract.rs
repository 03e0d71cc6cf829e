// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction orchestrator — runs the external trace and grid extractors on
// every lead crop, in parallel when there is enough work, and joins the
// outcomes into a map ordered by lead.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ecgscan_core::error::{EcgScanError, Result};
use ecgscan_core::types::{ExtractedTrace, ExtractionResult, GridEstimate, LeadId};
use image::DynamicImage;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

/// Traces the waveform in a single-lead crop.
pub trait SignalExtractor: Send + Sync {
    fn extract_signal(&self, lead: LeadId, image: &DynamicImage)
    -> ExtractionResult<ExtractedTrace>;
}

/// Measures the printed calibration grid in a single-lead crop.
pub trait GridExtractor: Send + Sync {
    fn estimate_grid(&self, lead: LeadId, image: &DynamicImage) -> ExtractionResult<GridEstimate>;
}

impl<F> SignalExtractor for F
where
    F: Fn(LeadId, &DynamicImage) -> ExtractionResult<ExtractedTrace> + Send + Sync,
{
    fn extract_signal(
        &self,
        lead: LeadId,
        image: &DynamicImage,
    ) -> ExtractionResult<ExtractedTrace> {
        self(lead, image)
    }
}

impl<F> GridExtractor for F
where
    F: Fn(LeadId, &DynamicImage) -> ExtractionResult<GridEstimate> + Send + Sync,
{
    fn estimate_grid(&self, lead: LeadId, image: &DynamicImage) -> ExtractionResult<GridEstimate> {
        self(lead, image)
    }
}

/// Shared flag a host application sets to abandon outstanding lead work.
///
/// Clones observe the same flag. Leads already being extracted run to
/// completion; leads not yet started are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Fans per-lead work out and collects it back in lead order.
#[derive(Debug, Clone, Default)]
pub struct LeadRunner {
    /// Lead count at which work moves onto the rayon pool; 0 keeps every
    /// run sequential.
    pub parallel_threshold: usize,
    pub cancel: CancellationToken,
}

impl LeadRunner {
    pub fn new(parallel_threshold: usize, cancel: CancellationToken) -> Self {
        Self {
            parallel_threshold,
            cancel,
        }
    }

    /// Apply `task` to every lead image.
    ///
    /// Tasks share nothing mutable; completion order is irrelevant because
    /// the results are keyed by lead. Returns `Cancelled` if the token was set
    /// before every lead had started.
    pub fn run<T, F>(
        &self,
        images: &BTreeMap<LeadId, DynamicImage>,
        task: F,
    ) -> Result<BTreeMap<LeadId, T>>
    where
        T: Send,
        F: Fn(LeadId, &DynamicImage) -> T + Send + Sync,
    {
        let guarded = |(&lead, image): (&LeadId, &DynamicImage)| {
            if self.cancel.is_cancelled() {
                return Err(EcgScanError::Cancelled);
            }
            Ok((lead, task(lead, image)))
        };

        let use_parallel = self.parallel_threshold > 0 && images.len() >= self.parallel_threshold;
        if use_parallel {
            debug!(leads = images.len(), "Processing leads in parallel");
            images.par_iter().map(guarded).collect()
        } else {
            images.iter().map(guarded).collect()
        }
    }
}

/// Run the signal extractor on every lead crop.
#[instrument(skip_all, fields(leads = images.len()))]
pub fn extract_all(
    extractor: &dyn SignalExtractor,
    images: &BTreeMap<LeadId, DynamicImage>,
    runner: &LeadRunner,
) -> Result<BTreeMap<LeadId, ExtractionResult<ExtractedTrace>>> {
    let results = runner.run(images, |lead, image| extractor.extract_signal(lead, image))?;
    log_outcomes("signal", &results);
    Ok(results)
}

/// Run the grid extractor on every lead crop.
#[instrument(skip_all, fields(leads = images.len()))]
pub fn estimate_grids(
    extractor: &dyn GridExtractor,
    images: &BTreeMap<LeadId, DynamicImage>,
    runner: &LeadRunner,
) -> Result<BTreeMap<LeadId, ExtractionResult<GridEstimate>>> {
    let results = runner.run(images, |lead, image| extractor.estimate_grid(lead, image))?;
    log_outcomes("grid", &results);
    Ok(results)
}

fn log_outcomes<T>(stage: &'static str, results: &BTreeMap<LeadId, ExtractionResult<T>>) {
    for (lead, result) in results {
        if let Some(reason) = result.failure_reason() {
            warn!(stage, %lead, reason, "Lead extraction failed");
        }
    }
    let succeeded = results.values().filter(|r| r.is_success()).count();
    info!(stage, succeeded, failed = results.len() - succeeded, "Extraction finished");
}
