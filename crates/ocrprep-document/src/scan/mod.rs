// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cleaning stages — shadow removal, denoising, adaptive binarization, line
// detection and skew estimation, plus the orchestrator that chains them.

pub mod binarize;
pub mod denoise;
pub mod hough;
pub(crate) mod integral;
pub mod pipeline;
pub mod shadow;
pub mod skew;

pub use binarize::{SauvolaBinarizer, binarize};
pub use denoise::{NlMeansDenoiser, denoise};
pub use hough::{LineSegment, SegmentDetectionOptions, detect_segments};
pub use pipeline::{CleaningPipeline, clean, preprocess};
pub use shadow::{ShadowRemover, remove_shadows};
pub use skew::{SkewEstimator, estimate_skew, normalize_rotation};
