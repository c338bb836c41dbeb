// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{OcrPrepError, Result};

/// Largest accepted Sauvola window radius.
pub const MAX_WINDOW_RADIUS: u32 = 1024;

/// Largest accepted non-local-means search window (pixels per side).
pub const MAX_SEARCH_WINDOW: u32 = 101;

/// Largest accepted border padding in pixels.
pub const MAX_BORDER_PX: u32 = 4096;

/// Settings for one cleaning run.
///
/// Every field has a default, so a partial JSON document deserializes into a
/// complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Sauvola neighbourhood radius; the window is `2 * radius + 1` pixels wide.
    pub window_radius: u32,
    /// Sauvola local-contrast sensitivity `k`.
    pub sauvola_k: f64,
    /// Sauvola dynamic range `R` as a fraction of full scale (0.2 → 51).
    pub sauvola_r: f64,
    /// Maximum number of histogram spikes for an image to count as a screenshot.
    pub spike_threshold: u32,
    /// Binarize, estimate skew and rotate in the `Document` branch.
    pub enable_deskew: bool,
    /// Run the shadow remover in the `Document` branch.
    pub remove_shadows: bool,
    /// Run the denoiser in the `Document` branch. Cost grows with
    /// `search_window²` per pixel; multi-megapixel photos take seconds even
    /// with rows filtered in parallel.
    pub denoise: bool,
    /// Constant white border added around cleaned documents (0 disables).
    pub border_px: u32,
    pub denoise_settings: DenoiseSettings,
    pub skew_settings: SkewSettings,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            window_radius: 5,
            sauvola_k: 0.2,
            sauvola_r: 0.2,
            spike_threshold: 2,
            enable_deskew: false,
            remove_shadows: true,
            denoise: true,
            border_px: 0,
            denoise_settings: DenoiseSettings::default(),
            skew_settings: SkewSettings::default(),
        }
    }
}

impl CleanConfig {
    /// Reject out-of-range tunables before any pixel is touched.
    pub fn validate(&self) -> Result<()> {
        if self.window_radius == 0 || self.window_radius > MAX_WINDOW_RADIUS {
            return Err(unsupported(format!(
                "window_radius must be within 1..={MAX_WINDOW_RADIUS}, got {}",
                self.window_radius
            )));
        }
        if !self.sauvola_k.is_finite() || !(0.0..=1.0).contains(&self.sauvola_k) {
            return Err(unsupported(format!(
                "sauvola_k must be within 0.0..=1.0, got {}",
                self.sauvola_k
            )));
        }
        if !self.sauvola_r.is_finite() || self.sauvola_r <= 0.0 || self.sauvola_r > 1.0 {
            return Err(unsupported(format!(
                "sauvola_r must be within (0.0, 1.0], got {}",
                self.sauvola_r
            )));
        }
        if self.spike_threshold == 0 || self.spike_threshold > 256 {
            return Err(unsupported(format!(
                "spike_threshold must be within 1..=256, got {}",
                self.spike_threshold
            )));
        }
        if self.border_px > MAX_BORDER_PX {
            return Err(unsupported(format!(
                "border_px must be at most {MAX_BORDER_PX}, got {}",
                self.border_px
            )));
        }
        self.denoise_settings.validate()?;
        self.skew_settings.validate()
    }
}

/// Non-local-means parameters tuned for document scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseSettings {
    /// Filter strength `h`; larger values remove more noise and more detail.
    pub strength: f32,
    /// Side length of the comparison patch (odd).
    pub template_window: u32,
    /// Side length of the area searched for similar patches (odd).
    pub search_window: u32,
}

impl Default for DenoiseSettings {
    fn default() -> Self {
        Self {
            strength: 10.0,
            template_window: 7,
            search_window: 21,
        }
    }
}

impl DenoiseSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.strength.is_finite() || self.strength <= 0.0 {
            return Err(unsupported(format!(
                "denoise strength must be positive, got {}",
                self.strength
            )));
        }
        if self.template_window % 2 == 0 || self.search_window % 2 == 0 {
            return Err(unsupported(format!(
                "denoise windows must be odd, got template {} and search {}",
                self.template_window, self.search_window
            )));
        }
        if self.template_window > self.search_window || self.search_window > MAX_SEARCH_WINDOW {
            return Err(unsupported(format!(
                "denoise windows must satisfy template <= search <= {MAX_SEARCH_WINDOW}, got {} and {}",
                self.template_window, self.search_window
            )));
        }
        Ok(())
    }
}

/// Edge and line detection parameters for skew estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkewSettings {
    /// Canny hysteresis low threshold (gradient magnitude).
    pub canny_low: f32,
    /// Canny hysteresis high threshold (gradient magnitude).
    pub canny_high: f32,
    /// Minimum accumulator votes before a line is traced.
    pub hough_threshold: u32,
    /// Minimum projected length of an accepted segment, in pixels.
    pub min_line_length: u32,
    /// Largest run of missing edge pixels bridged inside one segment.
    pub max_line_gap: u32,
    /// Seed for the order in which edge points are visited.
    pub seed: u64,
}

impl Default for SkewSettings {
    fn default() -> Self {
        Self {
            canny_low: 20.0,
            canny_high: 50.0,
            hough_threshold: 10,
            min_line_length: 50,
            max_line_gap: 10,
            seed: 0,
        }
    }
}

impl SkewSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.canny_low.is_finite()
            || !self.canny_high.is_finite()
            || self.canny_low < 0.0
            || self.canny_high < self.canny_low
        {
            return Err(unsupported(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {} and {}",
                self.canny_low, self.canny_high
            )));
        }
        if self.hough_threshold == 0 || self.min_line_length == 0 {
            return Err(unsupported(format!(
                "hough_threshold and min_line_length must be positive, got {} and {}",
                self.hough_threshold, self.min_line_length
            )));
        }
        Ok(())
    }
}

fn unsupported(detail: String) -> OcrPrepError {
    OcrPrepError::UnsupportedConfiguration(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CleanConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_window_radius_is_rejected() {
        let config = CleanConfig {
            window_radius: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OcrPrepError::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn spike_threshold_out_of_range_is_rejected() {
        let config = CleanConfig {
            spike_threshold: 300,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn even_denoise_window_is_rejected() {
        let config = CleanConfig {
            denoise_settings: DenoiseSettings {
                template_window: 6,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_canny_thresholds_are_rejected() {
        let settings = SkewSettings {
            canny_low: 80.0,
            canny_high: 40.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: CleanConfig =
            serde_json::from_str(r#"{ "spike_threshold": 1, "enable_deskew": true }"#)
                .expect("partial config should parse");
        assert_eq!(config.spike_threshold, 1);
        assert!(config.enable_deskew);
        assert_eq!(config.window_radius, 5);
        assert_eq!(config.denoise_settings, DenoiseSettings::default());
    }
}
