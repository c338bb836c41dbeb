// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Histogram utilities — 256-bucket intensity histograms (with Otsu's threshold
// and spike counting) and equal-width angle histograms.

use ocrprep_core::Raster;
use ocrprep_core::error::{OcrPrepError, Result};

/// Number of intensity buckets (one per 8-bit level).
pub const INTENSITY_BUCKETS: usize = 256;

/// Sample counts per 8-bit intensity level.
///
/// Always built over the luma rendition of a raster, so the counts sum to the
/// raster's pixel count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityHistogram {
    counts: [u64; INTENSITY_BUCKETS],
    total: u64,
}

impl IntensityHistogram {
    /// Histogram of the raster's luma. Multi-channel rasters are converted
    /// first.
    pub fn from_raster(raster: &Raster) -> Result<Self> {
        let gray = raster.to_grayscale()?;
        Ok(Self::from_samples(gray.samples()))
    }

    /// Histogram of raw 8-bit samples.
    pub fn from_samples(samples: &[u8]) -> Self {
        let mut counts = [0u64; INTENSITY_BUCKETS];
        for &s in samples {
            counts[s as usize] += 1;
        }
        Self {
            counts,
            total: samples.len() as u64,
        }
    }

    pub fn counts(&self) -> &[u64; INTENSITY_BUCKETS] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Buckets holding at least half of the tallest bucket's count.
    pub fn spike_count(&self) -> usize {
        let max = self.max_count();
        self.counts.iter().filter(|&&c| c * 2 >= max).count()
    }

    /// Summed counts of the darker half (levels 0..128).
    pub fn lower_half_mass(&self) -> u64 {
        self.counts[..INTENSITY_BUCKETS / 2].iter().sum()
    }

    /// Summed counts of the lighter half (levels 128..256).
    pub fn upper_half_mass(&self) -> u64 {
        self.counts[INTENSITY_BUCKETS / 2..].iter().sum()
    }

    /// Otsu's threshold: the level maximising between-class variance.
    ///
    /// Levels strictly above the returned value form the light class. A
    /// single-level histogram yields 0; the first of equal maxima wins.
    pub fn otsu_threshold(&self) -> u8 {
        if self.total == 0 {
            return 128;
        }

        let total = self.total as f64;
        let grand_mean = self
            .counts
            .iter()
            .enumerate()
            .map(|(level, &count)| level as f64 * count as f64)
            .sum::<f64>()
            / total;

        // Running (dark-class pixel count, first moment) at each candidate level;
        // sigma_b^2 = (grand_mean * w - mu)^2 / (w * (1 - w)) with w the dark
        // class probability.
        self.counts
            .iter()
            .enumerate()
            .scan((0u64, 0.0f64), |(weight, moment), (level, &count)| {
                *weight += count;
                *moment += level as f64 * count as f64;
                Some((level, *weight, *moment))
            })
            .filter(|&(_, weight, _)| weight > 0 && weight < self.total)
            .map(|(level, weight, moment)| {
                let w = weight as f64 / total;
                let mu = moment / total;
                (level, (grand_mean * w - mu).powi(2) / (w * (1.0 - w)))
            })
            .fold((0u8, 0.0f64), |best, (level, variance)| {
                if variance > best.1 { (level as u8, variance) } else { best }
            })
            .0
    }
}

/// Equal-width histogram over continuous angle samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleHistogram {
    /// `bins + 1` ascending bucket edges.
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl AngleHistogram {
    /// Bucket `angles` into `bins` equal-width buckets spanning the observed
    /// range. The last bucket is closed on the right. A degenerate range
    /// (all samples equal) is widened by half a degree each side.
    pub fn build(angles: &[f64], bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(OcrPrepError::UnsupportedConfiguration(
                "angle histogram needs at least one bin".into(),
            ));
        }
        if angles.is_empty() {
            return Err(OcrPrepError::InsufficientEvidence(
                "no angle samples to histogram".into(),
            ));
        }
        if angles.iter().any(|a| !a.is_finite()) {
            return Err(OcrPrepError::InvalidRaster(
                "non-finite angle sample".into(),
            ));
        }

        let mut lo = angles.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = angles.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0u64; bins];
        for &angle in angles {
            let idx = (((angle - lo) / (hi - lo)) * bins as f64) as usize;
            counts[idx.min(bins - 1)] += 1;
        }

        Ok(Self { edges, counts })
    }

    /// Index of the tallest bucket; the first one wins ties.
    pub fn peak_index(&self) -> usize {
        let mut best = 0;
        for (i, &count) in self.counts.iter().enumerate() {
            if count > self.counts[best] {
                best = i;
            }
        }
        best
    }

    /// Left edge of the tallest bucket.
    pub fn peak_left_edge(&self) -> f64 {
        self.edges[self.peak_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_sum_to_pixel_count() {
        let raster = Raster::from_gray_fn(10, 7, |x, y| (x * 20 + y) as u8).unwrap();
        let hist = IntensityHistogram::from_raster(&raster).unwrap();
        assert_eq!(hist.total(), 70);
        assert_eq!(hist.counts().iter().sum::<u64>(), 70);
    }

    #[test]
    fn rgb_histogram_counts_pixels_not_samples() {
        let raster = Raster::filled(4, 4, 3, 200).unwrap();
        let hist = IntensityHistogram::from_raster(&raster).unwrap();
        assert_eq!(hist.total(), 16);
    }

    #[test]
    fn flat_image_has_one_spike() {
        let hist = IntensityHistogram::from_samples(&[240; 100]);
        assert_eq!(hist.spike_count(), 1);
        assert_eq!(hist.max_count(), 100);
    }

    #[test]
    fn spike_counting_uses_half_max() {
        let mut samples = vec![250u8; 100];
        samples.extend(std::iter::repeat_n(10u8, 50));
        samples.extend(std::iter::repeat_n(128u8, 49));
        let hist = IntensityHistogram::from_samples(&samples);
        assert_eq!(hist.spike_count(), 2);
    }

    #[test]
    fn half_masses_split_at_128() {
        let hist = IntensityHistogram::from_samples(&[0, 127, 128, 255, 255]);
        assert_eq!(hist.lower_half_mass(), 2);
        assert_eq!(hist.upper_half_mass(), 3);
    }

    #[test]
    fn otsu_separates_two_levels() {
        let mut samples = vec![30u8; 500];
        samples.extend(std::iter::repeat_n(220u8, 500));
        let t = IntensityHistogram::from_samples(&samples).otsu_threshold();
        assert!((30..220).contains(&t), "threshold {t} should split the modes");
    }

    #[test]
    fn otsu_picks_first_level_of_a_flat_gap() {
        // Every level in 10..200 separates the classes equally well.
        let mut samples = vec![10u8; 40];
        samples.extend(std::iter::repeat_n(200u8, 60));
        assert_eq!(IntensityHistogram::from_samples(&samples).otsu_threshold(), 10);
    }

    #[test]
    fn otsu_single_level_is_zero() {
        assert_eq!(IntensityHistogram::from_samples(&[77; 64]).otsu_threshold(), 0);
    }

    #[test]
    fn otsu_splits_at_the_widest_gap() {
        // Three clusters; the split must fall between the two that are farther apart.
        let mut samples = vec![20u8; 300];
        samples.extend(std::iter::repeat_n(40u8, 300));
        samples.extend(std::iter::repeat_n(230u8, 400));
        let t = IntensityHistogram::from_samples(&samples).otsu_threshold();
        assert!((40..230).contains(&t), "threshold {t}");
    }

    #[test]
    fn otsu_on_binary_input_keeps_white_above() {
        let mut samples = vec![0u8; 10];
        samples.extend(std::iter::repeat_n(255u8, 10));
        let t = IntensityHistogram::from_samples(&samples).otsu_threshold();
        assert!(t < 255);
    }

    #[test]
    fn angle_histogram_matches_equal_width_binning() {
        let hist = AngleHistogram::build(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // 4.0 lands in the closed last bucket.
        assert_eq!(hist.counts, vec![1, 1, 1, 2]);
        assert_eq!(hist.peak_index(), 3);
        assert_eq!(hist.peak_left_edge(), 3.0);
    }

    #[test]
    fn angle_histogram_widens_degenerate_range() {
        let hist = AngleHistogram::build(&[10.0, 10.0, 10.0], 180).unwrap();
        assert_eq!(hist.counts.iter().sum::<u64>(), 3);
        assert!((hist.edges[0] - 9.5).abs() < 1e-9);
        assert!((hist.edges[180] - 10.5).abs() < 1e-9);
        let peak = hist.peak_left_edge();
        assert!((peak - 10.0).abs() < 0.01, "peak edge {peak}");
    }

    #[test]
    fn angle_histogram_first_peak_wins_ties() {
        let hist = AngleHistogram::build(&[-5.0, 5.0], 10).unwrap();
        assert_eq!(hist.peak_index(), 0);
        assert_eq!(hist.peak_left_edge(), -5.0);
    }

    #[test]
    fn empty_angles_are_insufficient_evidence() {
        assert!(matches!(
            AngleHistogram::build(&[], 180),
            Err(OcrPrepError::InsufficientEvidence(_))
        ));
    }
}
