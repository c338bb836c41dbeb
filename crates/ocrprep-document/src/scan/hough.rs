// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progressive probabilistic Hough transform — recovers finite line segments
// from a binary edge map.
//
// Edge points are visited in a shuffled order. Each point votes in a
// (rho, theta) accumulator; as soon as a bin reaches the vote threshold the
// line through the point is traced in both directions over the edge map,
// bridging small gaps. Traced pixels are removed from the map (and their votes
// withdrawn) so each edge contributes to at most one segment.

use image::GrayImage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

/// Number of accumulator angles over `[-90°, 90°)`.
const THETA_STEPS: usize = 180;

/// Fixed-point shift used while walking along a traced line.
const SHIFT: u32 = 16;

/// A detected segment between two pixel endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub start: (i64, i64),
    pub end: (i64, i64),
}

impl LineSegment {
    /// `dy / dx`, with vertical segments reported as slope 0.
    pub fn slope(&self) -> f64 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        if dx == 0 { 0.0 } else { dy as f64 / dx as f64 }
    }
}

/// Parameters for [`detect_segments`].
#[derive(Debug, Clone, Copy)]
pub struct SegmentDetectionOptions {
    /// Minimum accumulator votes before a point's line is traced.
    pub vote_threshold: u32,
    /// Minimum extent along x or y for a traced segment to be kept.
    pub min_line_length: u32,
    /// Largest run of missing edge pixels bridged inside one segment.
    pub max_line_gap: u32,
    /// Seed for the point visiting order.
    pub seed: u64,
}

/// Run the probabilistic Hough transform over the non-zero pixels of `edges`.
pub fn detect_segments(edges: &GrayImage, options: SegmentDetectionOptions) -> Vec<LineSegment> {
    let (width, height) = edges.dimensions();
    let (w, h) = (width as i64, height as i64);

    let mut mask: Vec<bool> = edges.pixels().map(|p| p.0[0] > 0).collect();
    let mut points: Vec<(i64, i64)> = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .filter(|&(x, y)| mask[(y * w + x) as usize])
        .collect();
    points.shuffle(&mut StdRng::seed_from_u64(options.seed));

    let max_distance = ((w * w + h * h) as f64).sqrt().ceil() as i64;
    let offset = max_distance;
    let rho_bins = (2 * max_distance + 1) as usize;

    let (cos_t, sin_t): (Vec<f64>, Vec<f64>) = (0..THETA_STEPS)
        .map(|j| {
            let theta = -std::f64::consts::FRAC_PI_2 + std::f64::consts::PI * j as f64 / THETA_STEPS as f64;
            (theta.cos(), theta.sin())
        })
        .unzip();

    let rho_index = |x: i64, y: i64, j: usize| -> usize {
        ((cos_t[j] * x as f64 + sin_t[j] * y as f64).round() as i64 + offset) as usize
    };

    let mut accumulator = vec![0u32; rho_bins * THETA_STEPS];
    let mut segments = Vec::new();
    let in_bounds = |x: i64, y: i64| x >= 0 && x < w && y >= 0 && y < h;

    for &(x, y) in &points {
        if !mask[(y * w + x) as usize] {
            continue;
        }

        // Vote and remember the strongest bin for this point.
        let mut max_value = options.vote_threshold.saturating_sub(1);
        let mut max_theta = None;
        for j in 0..THETA_STEPS {
            let cell = &mut accumulator[rho_index(x, y, j) * THETA_STEPS + j];
            *cell += 1;
            if *cell > max_value {
                max_value = *cell;
                max_theta = Some(j);
            }
        }
        let Some(theta) = max_theta else {
            continue;
        };

        // Walk direction along the line, in fixed point on the minor axis.
        let a = -sin_t[theta];
        let b = cos_t[theta];
        let x_major = a.abs() > b.abs();
        let (x0, y0, dx0, dy0) = if x_major {
            let dx0 = if a > 0.0 { 1 } else { -1 };
            let dy0 = (b * (1i64 << SHIFT) as f64 / a.abs()).round() as i64;
            (x, (y << SHIFT) + (1 << (SHIFT - 1)), dx0, dy0)
        } else {
            let dy0 = if b > 0.0 { 1 } else { -1 };
            let dx0 = (a * (1i64 << SHIFT) as f64 / b.abs()).round() as i64;
            ((x << SHIFT) + (1 << (SHIFT - 1)), y, dx0, dy0)
        };
        let to_pixel = |px: i64, py: i64| {
            if x_major { (px, py >> SHIFT) } else { (px >> SHIFT, py) }
        };

        // Pass 1: find both ends, bridging gaps up to max_line_gap.
        let mut ends = [(x, y); 2];
        for (k, end) in ends.iter_mut().enumerate() {
            let (dx, dy) = if k == 0 { (dx0, dy0) } else { (-dx0, -dy0) };
            let (mut px, mut py) = (x0, y0);
            let mut gap = 0;
            loop {
                let (x1, y1) = to_pixel(px, py);
                if !in_bounds(x1, y1) {
                    break;
                }
                gap += 1;
                if mask[(y1 * w + x1) as usize] {
                    gap = 0;
                    *end = (x1, y1);
                } else if gap > options.max_line_gap {
                    break;
                }
                px += dx;
                py += dy;
            }
        }

        let long_enough = (ends[1].0 - ends[0].0).abs() >= options.min_line_length as i64
            || (ends[1].1 - ends[0].1).abs() >= options.min_line_length as i64;

        // Pass 2: clear traced pixels; withdraw their votes if the line is kept.
        for (k, &end) in ends.iter().enumerate() {
            let (dx, dy) = if k == 0 { (dx0, dy0) } else { (-dx0, -dy0) };
            let (mut px, mut py) = (x0, y0);
            loop {
                let (x1, y1) = to_pixel(px, py);
                if !in_bounds(x1, y1) {
                    break;
                }
                let idx = (y1 * w + x1) as usize;
                if mask[idx] {
                    if long_enough {
                        for j in 0..THETA_STEPS {
                            let cell = &mut accumulator[rho_index(x1, y1, j) * THETA_STEPS + j];
                            *cell = cell.saturating_sub(1);
                        }
                    }
                    mask[idx] = false;
                }
                if (x1, y1) == end {
                    break;
                }
                px += dx;
                py += dy;
            }
        }

        if long_enough {
            segments.push(LineSegment {
                start: ends[0],
                end: ends[1],
            });
        }
    }

    debug!(
        edge_points = points.len(),
        segments = segments.len(),
        "Probabilistic Hough transform complete"
    );
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn options() -> SegmentDetectionOptions {
        SegmentDetectionOptions {
            vote_threshold: 10,
            min_line_length: 50,
            max_line_gap: 10,
            seed: 0,
        }
    }

    #[test]
    fn empty_edge_map_has_no_segments() {
        let edges = GrayImage::new(100, 100);
        assert!(detect_segments(&edges, options()).is_empty());
    }

    #[test]
    fn finds_horizontal_line() {
        let mut edges = GrayImage::new(200, 100);
        for x in 20..180 {
            edges.put_pixel(x, 50, Luma([255]));
        }
        let segments = detect_segments(&edges, options());
        assert_eq!(segments.len(), 1);
        let segment = segments[0];
        assert_eq!(segment.start.1, 50);
        assert_eq!(segment.end.1, 50);
        assert!((segment.start.0 - segment.end.0).abs() >= 150);
        assert_eq!(segment.slope(), 0.0);
    }

    #[test]
    fn finds_diagonal_line_slope() {
        let mut edges = GrayImage::new(200, 200);
        for i in 20..180 {
            edges.put_pixel(i, i, Luma([255]));
        }
        let segments = detect_segments(&edges, options());
        assert!(!segments.is_empty());
        let slope = segments[0].slope();
        assert!((slope - 1.0).abs() < 0.05, "slope {slope}");
    }

    #[test]
    fn short_strokes_are_rejected() {
        let mut edges = GrayImage::new(100, 100);
        for x in 10..30 {
            edges.put_pixel(x, 40, Luma([255]));
        }
        assert!(detect_segments(&edges, options()).is_empty());
    }

    #[test]
    fn vertical_segment_reports_zero_slope() {
        let segment = LineSegment {
            start: (10, 0),
            end: (10, 80),
        };
        assert_eq!(segment.slope(), 0.0);
    }
}
