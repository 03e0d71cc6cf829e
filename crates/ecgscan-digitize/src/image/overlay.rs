// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview rendering — draws an extracted trace on top of its lead crop so the
// operator can judge the extraction at a glance.

use ecgscan_core::error::EcgScanError;
use ecgscan_core::types::ExtractedTrace;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;

/// Produces the preview image shown for a successfully traced lead.
pub trait PreviewRenderer: Send + Sync {
    fn render(
        &self,
        trace: &ExtractedTrace,
        crop: &DynamicImage,
    ) -> Result<RgbaImage, EcgScanError>;
}

/// Draws the trace as a polyline in a single colour.
///
/// Sample `i` is placed at `(trace.time[i], trace.signal.samples[i])` in crop
/// coordinates. Points are clamped to a one-pixel margin around the canvas
/// before drawing: `imageproc` visits every point of a segment, so a wild
/// sample would otherwise cost time proportional to its distance.
#[derive(Debug, Clone, Copy)]
pub struct TraceOverlay {
    color: Rgba<u8>,
}

impl TraceOverlay {
    pub fn new(color: [u8; 4]) -> Self {
        Self { color: Rgba(color) }
    }
}

impl Default for TraceOverlay {
    fn default() -> Self {
        Self::new([255, 0, 0, 255])
    }
}

impl PreviewRenderer for TraceOverlay {
    fn render(
        &self,
        trace: &ExtractedTrace,
        crop: &DynamicImage,
    ) -> Result<RgbaImage, EcgScanError> {
        let samples = &trace.signal.samples;
        if samples.len() != trace.time.len() {
            return Err(EcgScanError::ImageError(format!(
                "trace has {} samples but {} time marks",
                samples.len(),
                trace.time.len()
            )));
        }
        if samples.iter().chain(&trace.time).any(|v| !v.is_finite()) {
            return Err(EcgScanError::ImageError(
                "trace contains non-finite coordinates".into(),
            ));
        }

        let mut canvas = crop.to_rgba8();
        let (max_x, max_y) = (f64::from(canvas.width()), f64::from(canvas.height()));
        let points: Vec<(f32, f32)> = trace
            .time
            .iter()
            .zip(samples)
            .map(|(&x, &y)| (x.clamp(-1.0, max_x) as f32, y.clamp(-1.0, max_y) as f32))
            .collect();

        match points.as_slice() {
            [] => {}
            [only] => draw_line_segment_mut(&mut canvas, *only, *only, self.color),
            _ => {
                for pair in points.windows(2) {
                    draw_line_segment_mut(&mut canvas, pair[0], pair[1], self.color);
                }
            }
        }
        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn blank_crop() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, WHITE))
    }

    #[test]
    fn flat_trace_draws_horizontal_line() {
        let trace = ExtractedTrace::from_columns(vec![5.0; 10]);
        let preview = TraceOverlay::default()
            .render(&trace, &blank_crop())
            .expect("render preview");

        assert_eq!(preview.dimensions(), (10, 10));
        for x in 0..10 {
            assert_eq!(preview.get_pixel(x, 5), &RED, "column {x} not drawn");
        }
        assert_eq!(preview.get_pixel(0, 0), &WHITE);
    }

    #[test]
    fn far_off_canvas_samples_are_clamped() {
        let trace = ExtractedTrace::from_columns(vec![5.0, 2e9, 5.0, 2e9]);
        let started = std::time::Instant::now();
        let preview = TraceOverlay::default()
            .render(&trace, &blank_crop())
            .expect("render preview");

        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(preview.get_pixel(0, 5), &RED);
        assert_eq!(preview.get_pixel(2, 5), &RED);
        // Segments run to the bottom edge instead of off into the distance.
        assert!((0..10).any(|x| preview.get_pixel(x, 9) == &RED));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let trace = ExtractedTrace::new(vec![1.0, 2.0], vec![0.0]);
        assert!(TraceOverlay::default().render(&trace, &blank_crop()).is_err());
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let trace = ExtractedTrace::from_columns(vec![1.0, f64::NAN]);
        assert!(TraceOverlay::default().render(&trace, &blank_crop()).is_err());
    }

    #[test]
    fn empty_trace_leaves_crop_untouched() {
        let preview = TraceOverlay::default()
            .render(&ExtractedTrace::default(), &blank_crop())
            .expect("render preview");
        assert!(preview.pixels().all(|p| *p == WHITE));
    }
}
