// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the ocrprep-document crate. Covers skew estimation
// and the full cleaning pipeline on small synthetic pages.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ocrprep_core::{CleanConfig, Raster};
use ocrprep_document::{clean, estimate_skew};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// White page with dark ruled lines tilted by `degrees`.
fn ruled_page(size: u32, degrees: f64) -> Raster {
    let centre = size as f64 / 2.0;
    let (sin, cos) = degrees.to_radians().sin_cos();
    Raster::from_gray_fn(size, size, |x, y| {
        let (px, py) = (x as f64 - centre, y as f64 - centre);
        let across = -px * sin + py * cos;
        if across.rem_euclid(24.0) < 4.0 { 0 } else { 255 }
    })
    .expect("fixture dimensions are non-zero")
}

/// Photographed-looking page: left-to-right lighting gradient with strokes.
fn shaded_page(width: u32, height: u32) -> Raster {
    Raster::from_gray_fn(width, height, |x, y| {
        let background = 140 + (x * 100 / (width - 1)) as u8;
        if y % 12 < 2 && x % 9 < 6 {
            background - 90
        } else {
            background
        }
    })
    .expect("fixture dimensions are non-zero")
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Skew estimation on a 300x300 page tilted by 7 degrees.
fn bench_estimate_skew(c: &mut Criterion) {
    let page = ruled_page(300, 7.0);

    c.bench_function("estimate_skew (300x300)", |b| {
        b.iter(|| black_box(estimate_skew(black_box(&page)).ok()));
    });
}

/// Full Document-branch cleaning (shadows + denoise) on a 96x64 page. Kept
/// small: non-local means dominates the cost.
fn bench_clean_document(c: &mut Criterion) {
    let page = shaded_page(96, 64);
    let config = CleanConfig::default();

    c.bench_function("clean document (96x64)", |b| {
        b.iter(|| black_box(clean(black_box(&page), &config).ok()));
    });
}

criterion_group!(benches, bench_estimate_skew, bench_clean_document);
criterion_main!(benches);
