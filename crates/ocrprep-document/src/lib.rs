// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrprep-document — Image pre-processing ahead of OCR.
//
// Classifies an input raster (dark background, screenshot, photographed
// document), then cleans it: shadow removal, non-local-means denoising,
// Sauvola binarization and Hough-based deskewing.

pub mod analysis;
pub mod image;
pub mod scan;

// Re-export the primary entry points so callers can use `ocrprep_document::clean` etc.
pub use analysis::{Assessment, ImageClassifier};
pub use image::processor::ImageProcessor;
pub use scan::{
    CleaningPipeline, NlMeansDenoiser, SauvolaBinarizer, ShadowRemover, SkewEstimator, binarize,
    clean, denoise, estimate_skew, preprocess, remove_shadows,
};
