// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Calibration aggregator — reduces the per-lead grid estimates to one global
// pixels-per-grid-unit scale.

use std::collections::BTreeMap;

use ecgscan_core::types::{ExtractionResult, GridEstimate, LeadId};
use tracing::debug;

/// Mean of every successful estimate.
///
/// A lead whose grid detection was noisy or failed does not block the
/// others; one surviving estimate is used as-is. Fails only when no lead
/// produced an estimate.
///
/// The result is later used for both axes: the printed grid is assumed to be
/// square in pixel space.
pub fn aggregate(
    estimates: &BTreeMap<LeadId, ExtractionResult<GridEstimate>>,
) -> ExtractionResult<GridEstimate> {
    let survivors: Vec<f64> = estimates
        .values()
        .filter_map(|result| result.success().map(GridEstimate::pixels))
        .collect();

    if survivors.is_empty() {
        return ExtractionResult::failure(format!(
            "no grid estimate survived ({} leads attempted)",
            estimates.len()
        ));
    }

    let mean = survivors.iter().sum::<f64>() / survivors.len() as f64;
    debug!(survivors = survivors.len(), mean, "Grid estimates aggregated");
    ExtractionResult::Success(GridEstimate(mean))
}
