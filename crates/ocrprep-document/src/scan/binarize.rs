// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sauvola binarization — a locally adaptive threshold driven by the mean and
// standard deviation of each pixel's neighbourhood.

use ocrprep_core::config::MAX_WINDOW_RADIUS;
use ocrprep_core::error::{OcrPrepError, Result};
use ocrprep_core::{BinaryRaster, CleanConfig, Raster};
use tracing::{debug, info, instrument};

use super::integral::IntegralImage;

/// Sauvola thresholding parameters.
///
/// For each pixel the threshold is `m * (1 + k * (s / R - 1))`, where `m` and
/// `s` are the mean and standard deviation over a `2 * window_radius + 1`
/// square window clamped to the image.
#[derive(Debug, Clone, Copy)]
pub struct SauvolaBinarizer {
    window_radius: u32,
    k: f64,
    /// Dynamic range of the standard deviation, in 8-bit levels.
    r: f64,
}

impl SauvolaBinarizer {
    /// `r` is a fraction of full scale: 0.5 is the textbook 128.
    pub fn new(window_radius: u32, k: f64, r: f64) -> Result<Self> {
        if window_radius == 0 || window_radius > MAX_WINDOW_RADIUS {
            return Err(OcrPrepError::UnsupportedConfiguration(format!(
                "window_radius must be within 1..={MAX_WINDOW_RADIUS}, got {window_radius}"
            )));
        }
        if !k.is_finite() || !(0.0..=1.0).contains(&k) || !r.is_finite() || r <= 0.0 || r > 1.0 {
            return Err(OcrPrepError::UnsupportedConfiguration(format!(
                "Sauvola k must be within 0..=1 and r within (0, 1], got k={k} r={r}"
            )));
        }
        Ok(Self {
            window_radius,
            k,
            r: r * 255.0,
        })
    }

    pub fn from_config(config: &CleanConfig) -> Result<Self> {
        Self::new(config.window_radius, config.sauvola_k, config.sauvola_r)
    }

    /// Mark every pixel at or above its local threshold. Multi-channel input
    /// is thresholded on its luma.
    #[instrument(skip_all, fields(window_radius = self.window_radius, k = self.k, r = self.r))]
    pub fn binarize(&self, raster: &Raster) -> Result<BinaryRaster> {
        info!("Applying Sauvola binarization");

        let gray = raster.to_gray_image()?;
        let (width, height) = gray.dimensions();
        let integral = IntegralImage::new(&gray);

        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let (mean, std) = integral.mean_and_std(x, y, self.window_radius);
                let threshold = mean * (1.0 + self.k * (std / self.r - 1.0));
                bits.push(gray.get_pixel(x, y).0[0] as f64 >= threshold);
            }
        }

        let binary = BinaryRaster::new(width, height, bits)?;
        debug!(set = binary.count_set(), "Binarization complete");
        Ok(binary)
    }
}

/// Binarize with an explicit window radius and the default sensitivity.
pub fn binarize(raster: &Raster, window_radius: u32) -> Result<BinaryRaster> {
    let defaults = CleanConfig::default();
    SauvolaBinarizer::new(window_radius, defaults.sauvola_k, defaults.sauvola_r)?.binarize(raster)
}
