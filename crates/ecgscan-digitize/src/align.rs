// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temporal aligner — shifts each lead to its configured start time and pads
// every lead to a common length.

use std::collections::BTreeMap;

use ecgscan_core::error::{EcgScanError, Result};
use ecgscan_core::types::LeadId;
use tracing::{debug, instrument};

/// Upper bound on an aligned sequence, in samples.
///
/// At the 4 ms period of standard paper this is over 12 days of recording,
/// so only a mistyped start time reaches it.
pub const MAX_ALIGNED_SAMPLES: usize = 1 << 28;

/// Number of zero samples that place a lead at `start_time` seconds.
///
/// Truncates toward zero, so a start time that falls between two samples
/// snaps to the earlier one. Offsets beyond [`MAX_ALIGNED_SAMPLES`] are
/// rejected.
pub fn left_padding(start_time: f64, sampling_period: f64) -> Result<usize> {
    if !sampling_period.is_finite() || sampling_period <= 0.0 {
        return Err(EcgScanError::DegenerateCalibration {
            quantity: "sampling period",
            value: sampling_period,
        });
    }
    if !start_time.is_finite() || start_time < 0.0 {
        return Err(EcgScanError::InvalidParameter(format!(
            "start time must be a non-negative number, got {start_time}"
        )));
    }
    let samples = (start_time / sampling_period).trunc();
    if samples > MAX_ALIGNED_SAMPLES as f64 {
        return Err(too_long(start_time, samples));
    }
    Ok(samples as usize)
}

/// Left-pad each lead by its start time, then right-pad all leads to the
/// longest padded length.
///
/// Leads missing from `start_times` start at zero. After this call every
/// sequence in the returned map has the same length.
#[instrument(skip_all, fields(leads = scaled.len(), sampling_period = sampling_period))]
pub fn align(
    scaled: BTreeMap<LeadId, Vec<f64>>,
    start_times: &BTreeMap<LeadId, f64>,
    sampling_period: f64,
) -> Result<BTreeMap<LeadId, Vec<f64>>> {
    let mut padded = BTreeMap::new();
    for (lead, samples) in scaled {
        let start = start_times.get(&lead).copied().unwrap_or(0.0);
        let offset = left_padding(start, sampling_period)?;
        let total = offset
            .checked_add(samples.len())
            .filter(|&total| total <= MAX_ALIGNED_SAMPLES)
            .ok_or_else(|| too_long(start, (offset as f64) + samples.len() as f64))?;

        let mut shifted = Vec::new();
        shifted.try_reserve_exact(total).map_err(|err| {
            EcgScanError::InvalidParameter(format!("cannot pad lead {lead}: {err}"))
        })?;
        shifted.resize(offset, 0.0);
        shifted.extend(samples);
        debug!(%lead, offset, len = shifted.len(), "Lead shifted to start time");
        padded.insert(lead, shifted);
    }

    let max_length = padded.values().map(Vec::len).max().unwrap_or(0);
    for samples in padded.values_mut() {
        samples.resize(max_length, 0.0);
    }
    debug!(max_length, "Leads padded to common length");
    Ok(padded)
}

fn too_long(start_time: f64, samples: f64) -> EcgScanError {
    EcgScanError::InvalidParameter(format!(
        "start time {start_time}s needs {samples} samples, \
         more than the {MAX_ALIGNED_SAMPLES} allowed"
    ))
}
