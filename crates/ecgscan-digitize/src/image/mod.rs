// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — scan loading, rotation, lead cropping, and trace previews.

pub mod overlay;
pub mod processor;

pub use overlay::{PreviewRenderer, TraceOverlay};
pub use processor::ImageProcessor;
