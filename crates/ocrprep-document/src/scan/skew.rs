// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Skew estimation — find the dominant line orientation of a page and turn it
// into the rotation that makes text horizontal.

use image::{GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use ocrprep_core::error::{OcrPrepError, Result};
use ocrprep_core::{Raster, SkewSettings};
use tracing::{debug, info, instrument, warn};

use super::hough::{LineSegment, SegmentDetectionOptions, detect_segments};
use crate::analysis::histogram::{AngleHistogram, IntensityHistogram};

/// Gaussian scale applied before edge detection.
const BLUR_SIGMA: f32 = 3.0;

/// Buckets in the angle-voting histogram.
const ANGLE_BINS: usize = 180;

/// A segment orientation in degrees, within `(-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct AngleSample(f64);

impl AngleSample {
    pub fn from_segment(segment: &LineSegment) -> Self {
        Self(segment.slope().atan().to_degrees())
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }
}

/// Dominant-orientation skew estimator.
///
/// ## Pipeline
///
/// 1. Otsu threshold and binarize
/// 2. Gaussian blur (sigma 3) to suppress speckle
/// 3. Canny edge detection
/// 4. Probabilistic Hough transform for line segments
/// 5. Segment slopes → angles (vertical segments count as 0°)
/// 6. 180-bucket angle histogram; left edge of the tallest bucket
/// 7. Fold near-vertical detections into the equivalent small rotation
#[derive(Debug, Clone, Default)]
pub struct SkewEstimator {
    settings: SkewSettings,
}

impl SkewEstimator {
    pub fn new(settings: SkewSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Estimate the counter-clockwise rotation (degrees) that deskews the page.
    ///
    /// When no line segments are found the page is assumed straight and 0 is
    /// returned.
    pub fn estimate(&self, raster: &Raster) -> Result<f64> {
        match self.try_estimate(raster) {
            Ok(angle) => Ok(angle),
            Err(OcrPrepError::InsufficientEvidence(detail)) => {
                warn!(%detail, "No skew evidence; assuming 0 degrees");
                Ok(0.0)
            }
            Err(err) => Err(err),
        }
    }

    /// Like [`estimate`](Self::estimate), but reports a page without line
    /// segments as `InsufficientEvidence`.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn try_estimate(&self, raster: &Raster) -> Result<f64> {
        info!("Estimating skew");

        let gray = raster.to_gray_image()?;

        // Step 1: Otsu binarization.
        let threshold = IntensityHistogram::from_samples(gray.as_raw()).otsu_threshold();
        let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([if gray.get_pixel(x, y).0[0] > threshold { 255 } else { 0 }])
        });
        debug!(threshold, "Otsu threshold computed");

        // Step 2+3: blur and edges.
        let blurred = gaussian_blur_f32(&binary, BLUR_SIGMA);
        let edges = canny(&blurred, self.settings.canny_low, self.settings.canny_high);

        // Step 4: line segments.
        let segments = detect_segments(
            &edges,
            SegmentDetectionOptions {
                vote_threshold: self.settings.hough_threshold,
                min_line_length: self.settings.min_line_length,
                max_line_gap: self.settings.max_line_gap,
                seed: self.settings.seed,
            },
        );
        if segments.is_empty() {
            return Err(OcrPrepError::InsufficientEvidence(
                "no line segments detected".into(),
            ));
        }

        // Step 5+6: vote on segment angles.
        let angles: Vec<f64> = segments
            .iter()
            .map(|s| AngleSample::from_segment(s).degrees())
            .collect();
        let histogram = AngleHistogram::build(&angles, ANGLE_BINS)?;
        let raw = histogram.peak_left_edge();

        // Step 7: fold into the principal range.
        let corrected = normalize_rotation(raw);
        debug!(segments = segments.len(), raw, corrected, "Skew estimated");
        Ok(corrected)
    }
}

/// Estimate skew with default settings; 0 when the page has no lines.
pub fn estimate_skew(raster: &Raster) -> Result<f64> {
    SkewEstimator::default().estimate(raster)
}

/// Collapse a near-vertical dominant angle into the small rotation that makes
/// text horizontal: above 45° becomes `-(90 - a)`, below -45° becomes
/// `90 - |a|`.
pub fn normalize_rotation(angle: f64) -> f64 {
    if angle > 45.0 {
        -(90.0 - angle)
    } else if angle < -45.0 {
        90.0 - angle.abs()
    } else {
        angle
    }
}
