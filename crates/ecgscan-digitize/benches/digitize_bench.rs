// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the ecgscan-digitize crate. Runs the full
// conversion on a synthetic twelve-lead scan with trivial extractors, so the
// numbers reflect the pipeline's own overhead (rotation, cropping, fan-out,
// scaling, alignment, and preview rendering).

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use ecgscan_core::{
    DigitizerConfig, ExtractedTrace, ExtractionResult, GridEstimate, InputParameters, LeadId,
    Rectangle,
};
use ecgscan_digitize::Digitizer;
use ecgscan_digitize::export::render_dataset;

const LEAD_WIDTH: u32 = 250;
const LEAD_HEIGHT: u32 = 120;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 4x3 lead layout on a white page, each lead one cell.
fn synthetic_scan() -> (DynamicImage, InputParameters) {
    let img = GrayImage::from_pixel(LEAD_WIDTH * 4, LEAD_HEIGHT * 3, Luma([250u8]));
    let mut params = InputParameters::new(0.0, 10.0, 25.0);
    for (index, lead) in LeadId::ALL.iter().enumerate() {
        let (column, row) = (index as u32 / 3, index as u32 % 3);
        let region =
            Rectangle::new(column * LEAD_WIDTH, row * LEAD_HEIGHT, LEAD_WIDTH, LEAD_HEIGHT);
        params = params.with_lead(*lead, region, f64::from(column) * 2.5);
    }
    (DynamicImage::ImageLuma8(img), params)
}

/// One sample per column following a slow sine around the middle row.
fn sine_trace(_: LeadId, image: &DynamicImage) -> ExtractionResult<ExtractedTrace> {
    let mid = f64::from(image.height()) / 2.0;
    let samples = (0..image.width()).map(|x| mid + 20.0 * (f64::from(x) / 15.0).sin()).collect();
    ExtractionResult::Success(ExtractedTrace::from_columns(samples))
}

fn fixed_grid(_: LeadId, _: &DynamicImage) -> ExtractionResult<GridEstimate> {
    ExtractionResult::Success(GridEstimate(10.0))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Full conversion, sequential versus rayon fan-out.
fn bench_convert(c: &mut Criterion) {
    let (scan, params) = synthetic_scan();

    let sequential = Digitizer::new(sine_trace, fixed_grid).with_config(DigitizerConfig {
        parallel_threshold: 0,
        ..Default::default()
    });
    c.bench_function("convert (12 leads, sequential)", |b| {
        b.iter(|| sequential.convert(black_box(&scan), &params).is_ok());
    });

    let parallel = Digitizer::new(sine_trace, fixed_grid);
    c.bench_function("convert (12 leads, parallel)", |b| {
        b.iter(|| parallel.convert(black_box(&scan), &params).is_ok());
    });
}

/// Text rendering of an aligned twelve-lead dataset.
fn bench_render(c: &mut Criterion) {
    let (scan, params) = synthetic_scan();
    let digitizer = Digitizer::new(sine_trace, fixed_grid);
    let Ok(conversion) = digitizer.convert(&scan, &params) else {
        return;
    };

    c.bench_function("render_dataset (12 leads)", |b| {
        b.iter(|| render_dataset(black_box(&conversion.dataset), "\t").is_ok());
    });
}

criterion_group!(benches, bench_convert, bench_render);
criterion_main!(benches);
