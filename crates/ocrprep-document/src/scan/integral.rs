// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Summed-area tables for constant-time window statistics.

use image::GrayImage;

/// Clamped square window `[x1, x2) x [y1, y2)` around a centre pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl Window {
    /// Square of the given radius centred on `(cx, cy)`, clamped to the image.
    pub fn around(cx: u32, cy: u32, radius: u32, width: u32, height: u32) -> Self {
        Self {
            x1: cx.saturating_sub(radius) as usize,
            y1: cy.saturating_sub(radius) as usize,
            x2: (cx as usize + radius as usize + 1).min(width as usize),
            y2: (cy as usize + radius as usize + 1).min(height as usize),
        }
    }

    pub fn area(&self) -> usize {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }
}

/// Fill `table` with the summed-area table of `value(x, y)`.
///
/// `table[y * (width+1) + x]` holds the sum over `[0, x) x [0, y)`; the table
/// is `(width+1) x (height+1)` with a zero border. `table` is resized as
/// needed so callers can reuse one allocation across many passes.
pub(crate) fn fill_summed_area(
    table: &mut Vec<u64>,
    width: u32,
    height: u32,
    mut value: impl FnMut(u32, u32) -> u64,
) {
    let stride = width as usize + 1;
    table.clear();
    table.resize(stride * (height as usize + 1), 0);

    for y in 0..height {
        let mut row_sum: u64 = 0;
        for x in 0..width {
            row_sum += value(x, y);
            let idx = (y as usize + 1) * stride + x as usize + 1;
            let above = y as usize * stride + x as usize + 1;
            table[idx] = row_sum + table[above];
        }
    }
}

/// Sum of the table's source values inside `window`.
pub(crate) fn window_sum(table: &[u64], width: u32, window: Window) -> u64 {
    let stride = width as usize + 1;
    // S = I[y2][x2] - I[y1][x2] - I[y2][x1] + I[y1][x1], ordered to stay unsigned.
    table[window.y2 * stride + window.x2] + table[window.y1 * stride + window.x1]
        - table[window.y1 * stride + window.x2]
        - table[window.y2 * stride + window.x1]
}

/// Integral images of a grayscale plane and of its squares.
pub(crate) struct IntegralImage {
    width: u32,
    height: u32,
    sums: Vec<u64>,
    squares: Vec<u64>,
}

impl IntegralImage {
    pub fn new(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let mut sums = Vec::new();
        let mut squares = Vec::new();
        fill_summed_area(&mut sums, width, height, |x, y| gray.get_pixel(x, y).0[0] as u64);
        fill_summed_area(&mut squares, width, height, |x, y| {
            let v = gray.get_pixel(x, y).0[0] as u64;
            v * v
        });
        Self {
            width,
            height,
            sums,
            squares,
        }
    }

    /// Mean and population standard deviation inside the clamped square of
    /// `radius` around `(cx, cy)`.
    pub fn mean_and_std(&self, cx: u32, cy: u32, radius: u32) -> (f64, f64) {
        let window = Window::around(cx, cy, radius, self.width, self.height);
        let area = window.area() as f64;
        let sum = window_sum(&self.sums, self.width, window) as f64;
        let sum_sq = window_sum(&self.squares, self.width, window) as f64;
        let mean = sum / area;
        let variance = (sum_sq / area - mean * mean).max(0.0);
        (mean, variance.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn window_clamps_at_corners() {
        let window = Window::around(0, 0, 2, 10, 10);
        assert_eq!(window, Window { x1: 0, y1: 0, x2: 3, y2: 3 });
        assert_eq!(window.area(), 9);
    }

    #[test]
    fn window_sum_matches_direct_sum() {
        let gray = GrayImage::from_fn(6, 5, |x, y| Luma([(x * 10 + y) as u8]));
        let mut table = Vec::new();
        fill_summed_area(&mut table, 6, 5, |x, y| gray.get_pixel(x, y).0[0] as u64);
        let window = Window::around(3, 2, 1, 6, 5);
        let direct: u64 = (1..4)
            .flat_map(|y| (2..5).map(move |x| (x * 10 + y) as u64))
            .sum();
        assert_eq!(window_sum(&table, 6, window), direct);
    }

    #[test]
    fn flat_region_has_zero_deviation() {
        let gray = GrayImage::from_pixel(8, 8, Luma([77u8]));
        let integral = IntegralImage::new(&gray);
        let (mean, std) = integral.mean_and_std(4, 4, 2);
        assert!((mean - 77.0).abs() < 1e-9);
        assert!(std.abs() < 1e-9);
    }

    #[test]
    fn checkerboard_deviation_is_half_range() {
        let gray = GrayImage::from_fn(4, 4, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 200 }]));
        let integral = IntegralImage::new(&gray);
        let window = Window::around(1, 1, 10, 4, 4);
        assert_eq!(window.area(), 16);
        let (mean, std) = integral.mean_and_std(1, 1, 10);
        assert!((mean - 100.0).abs() < 1e-9);
        assert!((std - 100.0).abs() < 1e-9);
    }
}
