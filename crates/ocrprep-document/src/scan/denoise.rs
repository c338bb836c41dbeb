// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Non-local-means denoising tuned for scanned text.

use image::GrayImage;
use ocrprep_core::error::{OcrPrepError, Result};
use ocrprep_core::{DenoiseSettings, Raster};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use super::integral::{Window, fill_summed_area, window_sum};

/// Weights below `exp(-WEIGHT_CUTOFF)` are treated as zero.
const WEIGHT_CUTOFF: f64 = 30.0;

/// Output rows per parallel work item.
const BAND_ROWS: u32 = 32;

/// Non-local-means filter.
///
/// Each output pixel is a weighted average of the pixels in its search window,
/// weighted by `exp(-d / h²)`, where `d` is the mean squared difference between
/// the template patches around the two pixels. Patch distances come from one
/// summed-area table per search offset, so the cost does not depend on the
/// template size. Out-of-image pixels replicate the nearest edge.
///
/// Rows are split into bands that are filtered in parallel; each band builds
/// its tables over its own rows plus a template-radius margin.
#[derive(Debug, Clone, Copy)]
pub struct NlMeansDenoiser {
    strength: f64,
    template_radius: u32,
    search_radius: u32,
}

impl Default for NlMeansDenoiser {
    fn default() -> Self {
        let settings = DenoiseSettings::default();
        Self {
            strength: settings.strength as f64,
            template_radius: settings.template_window / 2,
            search_radius: settings.search_window / 2,
        }
    }
}

impl NlMeansDenoiser {
    pub fn new(settings: &DenoiseSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            strength: settings.strength as f64,
            template_radius: settings.template_window / 2,
            search_radius: settings.search_window / 2,
        })
    }

    /// Denoise every channel independently.
    #[instrument(skip_all, fields(
        width = raster.width(),
        height = raster.height(),
        strength = self.strength,
    ))]
    pub fn denoise(&self, raster: &Raster) -> Result<Raster> {
        info!(
            template_radius = self.template_radius,
            search_radius = self.search_radius,
            "Applying non-local-means denoising"
        );

        let mut planes = Vec::with_capacity(raster.channels() as usize);
        for channel in 0..raster.channels() {
            planes.push(self.denoise_plane(&raster.channel_plane(channel)?)?);
        }

        let result = Raster::from_planes(&planes)?;
        debug!("Denoising complete");
        Ok(result)
    }

    fn denoise_plane(&self, plane: &GrayImage) -> Result<GrayImage> {
        let (w, h) = plane.dimensions();
        let mut out = vec![0u8; w as usize * h as usize];

        out.par_chunks_mut(BAND_ROWS as usize * w as usize)
            .enumerate()
            .for_each(|(band, rows)| self.denoise_band(plane, band as u32 * BAND_ROWS, rows));

        GrayImage::from_raw(w, h, out)
            .ok_or_else(|| OcrPrepError::InvalidRaster("denoised plane has the wrong length".into()))
    }

    /// Filter the rows starting at `y0` into `rows`.
    fn denoise_band(&self, plane: &GrayImage, y0: u32, rows: &mut [u8]) {
        let (w, h) = plane.dimensions();
        let band_h = (rows.len() / w as usize) as u32;
        let top = y0.saturating_sub(self.template_radius);
        let span = (y0 + band_h + self.template_radius).min(h) - top;
        let h2 = self.strength * self.strength;
        let search = self.search_radius as i64;

        let at = |x: i64, y: i64| -> u8 {
            let cx = x.clamp(0, w as i64 - 1) as u32;
            let cy = y.clamp(0, h as i64 - 1) as u32;
            plane.get_pixel(cx, cy).0[0]
        };

        let mut weight_sum = vec![0f64; rows.len()];
        let mut value_sum = vec![0f64; rows.len()];
        let mut table = Vec::new();

        for dy in -search..=search {
            for dx in -search..=search {
                fill_summed_area(&mut table, w, span, |x, ly| {
                    let y = ly + top;
                    let a = plane.get_pixel(x, y).0[0] as i64;
                    let b = at(x as i64 + dx, y as i64 + dy) as i64;
                    ((a - b) * (a - b)) as u64
                });

                for by in 0..band_h {
                    let y = y0 + by;
                    for x in 0..w {
                        let window = Window::around(x, y - top, self.template_radius, w, span);
                        let distance = window_sum(&table, w, window) as f64 / window.area() as f64;
                        let exponent = distance / h2;
                        if exponent > WEIGHT_CUTOFF {
                            continue;
                        }
                        let weight = (-exponent).exp();
                        let idx = by as usize * w as usize + x as usize;
                        weight_sum[idx] += weight;
                        value_sum[idx] += weight * at(x as i64 + dx, y as i64 + dy) as f64;
                    }
                }
            }
        }

        // The zero offset always contributes weight 1.
        for (out, (value, weight)) in rows.iter_mut().zip(value_sum.iter().zip(&weight_sum)) {
            *out = (value / weight).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Denoise with the document-scan defaults (h = 10, 7x7 template, 21x21 search).
pub fn denoise(raster: &Raster) -> Result<Raster> {
    NlMeansDenoiser::default().denoise(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocrprep_core::OcrPrepError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn variance(samples: &[u8]) -> f64 {
        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64;
        samples.iter().map(|&s| (s as f64 - mean).powi(2)).sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn flat_raster_is_unchanged() {
        let raster = Raster::filled(24, 24, 1, 140).unwrap();
        assert_eq!(denoise(&raster).unwrap(), raster);
    }

    #[test]
    fn reduces_random_noise_on_flat_background() {
        let mut rng = StdRng::seed_from_u64(7);
        let noisy = Raster::from_gray_fn(40, 40, |_, _| {
            (128 + rng.random_range(-20i32..=20)) as u8
        })
        .unwrap();
        let cleaned = denoise(&noisy).unwrap();
        let before = variance(noisy.samples());
        let after = variance(cleaned.samples());
        assert!(after < before * 0.5, "variance before {before}, after {after}");
    }

    #[test]
    fn keeps_strong_edges() {
        let raster = Raster::from_gray_fn(40, 40, |x, _| if x < 20 { 30 } else { 230 }).unwrap();
        let cleaned = denoise(&raster).unwrap();
        assert!(cleaned.sample(5, 20, 0) < 60);
        assert!(cleaned.sample(35, 20, 0) > 200);
    }

    #[test]
    fn preserves_channel_count() {
        let raster = Raster::filled(12, 12, 3, 90).unwrap();
        let cleaned = denoise(&raster).unwrap();
        assert_eq!(cleaned.channels(), 3);
        assert_eq!(cleaned.dimensions(), (12, 12));
    }

    /// Direct evaluation of every patch distance, one pixel at a time.
    fn reference_nl_means(raster: &Raster, settings: &DenoiseSettings) -> Vec<u8> {
        let (w, h) = raster.dimensions();
        let (tr, sr) = (settings.template_window / 2, (settings.search_window / 2) as i64);
        let h2 = (settings.strength as f64).powi(2);
        let at = |x: i64, y: i64| {
            raster.sample(x.clamp(0, w as i64 - 1) as u32, y.clamp(0, h as i64 - 1) as u32, 0) as i64
        };
        let mut out = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let window = Window::around(x, y, tr, w, h);
                let (mut weights, mut values) = (0.0, 0.0);
                for dy in -sr..=sr {
                    for dx in -sr..=sr {
                        let mut sum = 0i64;
                        for py in window.y1..window.y2 {
                            for px in window.x1..window.x2 {
                                let (px, py) = (px as i64, py as i64);
                                let d = at(px, py) - at(px + dx, py + dy);
                                sum += d * d;
                            }
                        }
                        let exponent = sum as f64 / window.area() as f64 / h2;
                        if exponent > WEIGHT_CUTOFF {
                            continue;
                        }
                        let weight = (-exponent).exp();
                        weights += weight;
                        values += weight * at(x as i64 + dx, y as i64 + dy) as f64;
                    }
                }
                out.push((values / weights).round().clamp(0.0, 255.0) as u8);
            }
        }
        out
    }

    #[test]
    fn banded_filtering_matches_direct_evaluation() {
        // Taller than two bands, so band seams fall inside the image.
        let mut rng = StdRng::seed_from_u64(11);
        let raster = Raster::from_gray_fn(14, 75, |x, y| {
            let base: i32 = if (x + y / 5) % 6 < 3 { 60 } else { 190 };
            (base + rng.random_range(-25i32..=25)) as u8
        })
        .unwrap();
        let settings = DenoiseSettings {
            strength: 12.0,
            template_window: 3,
            search_window: 5,
        };

        let banded = NlMeansDenoiser::new(&settings).unwrap().denoise(&raster).unwrap();
        let direct = reference_nl_means(&raster, &settings);

        for (i, (&a, &b)) in banded.samples().iter().zip(&direct).enumerate() {
            assert!(a.abs_diff(b) <= 1, "pixel {i}: banded {a}, direct {b}");
        }
    }

    #[test]
    fn rejects_even_windows() {
        let settings = DenoiseSettings {
            search_window: 20,
            ..Default::default()
        };
        assert!(matches!(
            NlMeansDenoiser::new(&settings),
            Err(OcrPrepError::UnsupportedConfiguration(_))
        ));
    }
}
