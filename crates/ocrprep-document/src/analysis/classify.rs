// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image classifier — decides whether an image is already processed (dark
// background), a digital screenshot, or a photographed/scanned document.

use ocrprep_core::error::{OcrPrepError, Result};
use ocrprep_core::{Classification, Raster};
use tracing::{debug, instrument};

use super::histogram::IntensityHistogram;

/// Normalized mean below which an image counts as dark background.
pub const DARK_MEAN_CUTOFF: f64 = 0.5;

/// Classifier verdict together with the evidence it was based on.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub classification: Classification,
    /// Normalized mean luma.
    pub mean: f64,
    /// Buckets at or above half the tallest bucket; `None` for dark images,
    /// which are decided before the histogram is built.
    pub spikes: Option<usize>,
    /// Screenshot with light text on a dark background; invert before saving.
    pub needs_inversion: bool,
}

/// Histogram-shape classifier.
#[derive(Debug, Clone, Copy)]
pub struct ImageClassifier {
    /// An image with at most this many spikes is a screenshot.
    spike_threshold: u32,
}

impl ImageClassifier {
    pub fn new(spike_threshold: u32) -> Result<Self> {
        if spike_threshold == 0 || spike_threshold > 256 {
            return Err(OcrPrepError::UnsupportedConfiguration(format!(
                "spike_threshold must be within 1..=256, got {spike_threshold}"
            )));
        }
        Ok(Self { spike_threshold })
    }

    /// Label the raster. Multi-channel input is judged on its luma.
    pub fn classify(&self, raster: &Raster) -> Result<Classification> {
        Ok(self.assess(raster)?.classification)
    }

    /// Label the raster and report the statistics behind the label.
    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn assess(&self, raster: &Raster) -> Result<Assessment> {
        let gray = raster.to_grayscale()?;
        let mean = gray.mean_intensity();

        if mean < DARK_MEAN_CUTOFF {
            debug!(mean, "Dark background; leaving untouched");
            return Ok(Assessment {
                classification: Classification::DarkBackground,
                mean,
                spikes: None,
                needs_inversion: false,
            });
        }

        let histogram = IntensityHistogram::from_samples(gray.samples());
        let spikes = histogram.spike_count();

        if spikes as u64 <= self.spike_threshold as u64 {
            let needs_inversion = screenshot_needs_inversion(&histogram);
            debug!(mean, spikes, needs_inversion, "Classified as screenshot");
            Ok(Assessment {
                classification: Classification::Screenshot,
                mean,
                spikes: Some(spikes),
                needs_inversion,
            })
        } else {
            debug!(mean, spikes, "Classified as document");
            Ok(Assessment {
                classification: Classification::Document,
                mean,
                spikes: Some(spikes),
                needs_inversion: false,
            })
        }
    }
}

/// A screenshot whose darker half outweighs its lighter half is light text on
/// a dark background.
pub fn screenshot_needs_inversion(histogram: &IntensityHistogram) -> bool {
    histogram.lower_half_mass() > histogram.upper_half_mass()
}
