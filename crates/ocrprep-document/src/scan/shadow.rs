// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shadow removal — estimate a slowly varying illumination background per
// channel and flatten it out.

use image::{GrayImage, Luma};
use imageproc::filter::median_filter;
use imageproc::morphology::{Mask, grayscale_dilate};
use ocrprep_core::Raster;
use ocrprep_core::error::Result;
use tracing::{debug, info, instrument};

/// Background-subtraction shadow remover.
///
/// Per channel:
///
/// 1. Dilate with a square structuring element (local maximum), which erases
///    thin dark text and keeps the paper brightness.
/// 2. Median-filter that estimate with a large kernel to get a smooth
///    illumination model.
/// 3. `255 - |channel - background|`, so paper goes to white and ink stays dark.
/// 4. Min–max stretch back to the full `0..=255` range.
#[derive(Debug, Clone, Copy)]
pub struct ShadowRemover {
    /// Half-width of the dilation square (3 gives 7x7).
    dilation_radius: u8,
    /// Half-width of the median kernel (10 gives 21x21).
    median_radius: u32,
}

impl Default for ShadowRemover {
    fn default() -> Self {
        Self {
            dilation_radius: 3,
            median_radius: 10,
        }
    }
}

impl ShadowRemover {
    #[instrument(skip_all, fields(
        width = raster.width(),
        height = raster.height(),
        channels = raster.channels(),
    ))]
    pub fn remove(&self, raster: &Raster) -> Result<Raster> {
        info!("Removing shadows");

        let mut planes = Vec::with_capacity(raster.channels() as usize);
        for channel in 0..raster.channels() {
            let plane = raster.channel_plane(channel)?;
            planes.push(self.flatten_plane(&plane));
        }

        let result = Raster::from_planes(&planes)?;
        debug!("Shadow removal complete");
        Ok(result)
    }

    /// Illumination model for one plane: local maximum, then a wide median.
    fn background(&self, plane: &GrayImage) -> GrayImage {
        let dilated = grayscale_dilate(plane, &Mask::square(self.dilation_radius));
        median_filter(&dilated, self.median_radius, self.median_radius)
    }

    fn flatten_plane(&self, plane: &GrayImage) -> GrayImage {
        let background = self.background(plane);

        let diff = GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
            let v = plane.get_pixel(x, y).0[0];
            let b = background.get_pixel(x, y).0[0];
            Luma([255 - v.abs_diff(b)])
        });

        stretch_min_max(&diff)
    }
}

/// Convenience wrapper with the default 7x7 dilation and 21x21 median.
pub fn remove_shadows(raster: &Raster) -> Result<Raster> {
    ShadowRemover::default().remove(raster)
}

/// Linearly map the plane's `[min, max]` onto `[0, 255]`. A constant plane
/// carries no ink and becomes flat white.
fn stretch_min_max(plane: &GrayImage) -> GrayImage {
    let min = plane.pixels().map(|p| p.0[0]).min().unwrap_or(0);
    let max = plane.pixels().map(|p| p.0[0]).max().unwrap_or(0);

    if min == max {
        return GrayImage::from_pixel(plane.width(), plane.height(), Luma([255]));
    }

    let scale = 255.0 / (max - min) as f32;
    GrayImage::from_fn(plane.width(), plane.height(), |x, y| {
        let v = plane.get_pixel(x, y).0[0];
        Luma([((v - min) as f32 * scale).round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lighting gradient from 120 (left) to 230 (right) with thin dark strokes
    /// 100 levels below the local background.
    fn shaded_page() -> Raster {
        Raster::from_gray_fn(200, 120, |x, y| {
            let background = 120 + (x * 110 / 199) as u8;
            if y % 15 == 7 && x % 10 < 7 {
                background - 100
            } else {
                background
            }
        })
        .unwrap()
    }

    fn is_text(x: u32, y: u32) -> bool {
        y % 15 == 7 && x % 10 < 7
    }

    /// Variance of per-strip background means across ten vertical strips.
    fn cross_region_background_variance(raster: &Raster) -> f64 {
        let strip = raster.width() / 10;
        let means: Vec<f64> = (0..10)
            .map(|s| {
                let mut sum = 0.0;
                let mut n = 0.0;
                for y in 0..raster.height() {
                    for x in s * strip..(s + 1) * strip {
                        if !is_text(x, y) {
                            sum += raster.sample(x, y, 0) as f64;
                            n += 1.0;
                        }
                    }
                }
                sum / n
            })
            .collect();
        let mean = means.iter().sum::<f64>() / means.len() as f64;
        means.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / means.len() as f64
    }

    #[test]
    fn flattens_illumination_gradient() {
        let page = shaded_page();
        let before = cross_region_background_variance(&page);
        let after = cross_region_background_variance(&remove_shadows(&page).unwrap());
        assert!(
            after <= before * 0.5,
            "background variance should at least halve: before {before}, after {after}"
        );
    }

    #[test]
    fn text_stays_darker_than_background() {
        let cleaned = remove_shadows(&shaded_page()).unwrap();
        let ink = cleaned.sample(52, 22, 0);
        let paper = cleaned.sample(52, 30, 0);
        assert!(ink + 50 < paper, "ink {ink} should be well below paper {paper}");
    }

    #[test]
    fn preserves_shape_and_channels() {
        let raster = Raster::filled(30, 20, 3, 200).unwrap();
        let cleaned = remove_shadows(&raster).unwrap();
        assert_eq!(cleaned.dimensions(), (30, 20));
        assert_eq!(cleaned.channels(), 3);
    }

    #[test]
    fn flat_page_becomes_white() {
        let cleaned = remove_shadows(&Raster::filled(25, 25, 1, 90).unwrap()).unwrap();
        assert!(cleaned.samples().iter().all(|&s| s == 255));
    }

    #[test]
    fn background_erases_thin_strokes() {
        let plane = GrayImage::from_fn(60, 60, |x, y| {
            if y == 30 && (10..50).contains(&x) { Luma([20]) } else { Luma([200]) }
        });
        let background = ShadowRemover::default().background(&plane);
        assert_eq!(background.get_pixel(30, 30).0[0], 200);
        assert!(background.pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn background_keeps_broad_brightness() {
        // Left half dim, right half bright: the estimate follows both.
        let plane = GrayImage::from_fn(80, 40, |x, _| Luma([if x < 40 { 100 } else { 220 }]));
        let background = ShadowRemover::default().background(&plane);
        assert_eq!(background.get_pixel(5, 20).0[0], 100);
        assert_eq!(background.get_pixel(75, 20).0[0], 220);
    }

    #[test]
    fn stretch_spans_full_range() {
        let plane = GrayImage::from_fn(3, 1, |x, _| Luma([100 + 20 * x as u8]));
        let stretched = stretch_min_max(&plane);
        assert_eq!(stretched.get_pixel(0, 0).0[0], 0);
        assert_eq!(stretched.get_pixel(1, 0).0[0], 128);
        assert_eq!(stretched.get_pixel(2, 0).0[0], 255);
    }
}
