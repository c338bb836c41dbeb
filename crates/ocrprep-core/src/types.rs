// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: rasters, classification labels and pipeline results.

use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{OcrPrepError, Result};

/// A 2-D grid of 8-bit intensity samples with 1 to 4 interleaved channels.
///
/// Samples span the native range `0..=255`; normalized intensities (as used by
/// the classifier) are `sample / 255`. Dimensions are non-zero and fixed at
/// construction. Stages never mutate a raster they were given; they return a
/// new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

impl Raster {
    // -- Construction ---------------------------------------------------------

    /// Wrap interleaved samples, validating shape and channel count.
    pub fn new(width: u32, height: u32, channels: u8, samples: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(OcrPrepError::InvalidRaster(format!(
                "raster must not be empty, got {width}x{height}"
            )));
        }
        if !(1..=4).contains(&channels) {
            return Err(OcrPrepError::InvalidRaster(format!(
                "channel count must be within 1..=4, got {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if samples.len() != expected {
            return Err(OcrPrepError::InvalidRaster(format!(
                "{width}x{height}x{channels} raster needs {expected} samples, got {}",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// A raster with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self> {
        let len = width as usize * height as usize * channels as usize;
        Self::new(width, height, channels, vec![value; len])
    }

    /// Build a single-channel raster from a per-pixel function.
    pub fn from_gray_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Result<Self> {
        let mut samples = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                samples.push(f(x, y));
            }
        }
        Self::new(width, height, 1, samples)
    }

    /// Take ownership of an `image` grayscale buffer.
    pub fn from_gray_image(image: GrayImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::new(width, height, 1, image.into_raw())
    }

    /// Convert a decoded image. 8-bit layouts are kept as-is; deeper or
    /// floating-point layouts are reduced to 8 bits per channel.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());
        let (channels, samples) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.as_raw().clone()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => (3, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => (4, buf.as_raw().clone()),
            other => {
                let color = other.color();
                if color.has_alpha() {
                    (4, other.to_rgba8().into_raw())
                } else if color.has_color() {
                    (3, other.to_rgb8().into_raw())
                } else {
                    (1, other.to_luma8().into_raw())
                }
            }
        };
        Self::new(width, height, channels, samples)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    /// Number of pixels (not samples).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Interleaved samples, row-major.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Sample at `(x, y)` in `channel`. Panics when out of bounds, like slice
    /// indexing.
    pub fn sample(&self, x: u32, y: u32, channel: u8) -> u8 {
        let idx = (y as usize * self.width as usize + x as usize) * self.channels as usize
            + channel as usize;
        self.samples[idx]
    }

    /// Mean over all samples on the normalized `0.0..=1.0` scale.
    pub fn mean_intensity(&self) -> f64 {
        let sum: u64 = self.samples.iter().map(|&s| s as u64).sum();
        sum as f64 / (self.samples.len() as f64 * 255.0)
    }

    // -- Conversions ----------------------------------------------------------

    /// Apply `f` to every sample, keeping shape.
    pub fn map_samples(&self, f: impl Fn(u8) -> u8) -> Self {
        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            samples: self.samples.iter().map(|&s| f(s)).collect(),
        }
    }

    /// Re-wrap as an `image` crate buffer of the matching layout.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let data = self.samples.clone();
        let image = match self.channels {
            1 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            2 => GrayAlphaImage::from_raw(w, h, data).map(DynamicImage::ImageLumaA8),
            3 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
            _ => None,
        };
        image.ok_or_else(|| {
            OcrPrepError::InvalidRaster(format!(
                "cannot express {w}x{h}x{} raster as an image buffer",
                self.channels
            ))
        })
    }

    /// Luma rendition (Rec. 709 weights, alpha ignored) as an `image` buffer.
    pub fn to_gray_image(&self) -> Result<GrayImage> {
        if self.channels == 1 {
            return self.channel_plane(0);
        }
        Ok(self.to_dynamic()?.to_luma8())
    }

    /// Luma rendition as a single-channel raster.
    pub fn to_grayscale(&self) -> Result<Self> {
        if self.channels == 1 {
            return Ok(self.clone());
        }
        Self::from_gray_image(self.to_gray_image()?)
    }

    /// Extract one channel as its own grayscale buffer.
    pub fn channel_plane(&self, channel: u8) -> Result<GrayImage> {
        if channel >= self.channels {
            return Err(OcrPrepError::InvalidRaster(format!(
                "channel {channel} out of range for {}-channel raster",
                self.channels
            )));
        }
        let plane: Vec<u8> = self
            .samples
            .iter()
            .skip(channel as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect();
        ImageBuffer::from_raw(self.width, self.height, plane).ok_or_else(|| {
            OcrPrepError::InvalidRaster("channel plane has the wrong length".into())
        })
    }

    /// Interleave equally-sized planes back into one raster, in order.
    pub fn from_planes(planes: &[GrayImage]) -> Result<Self> {
        let first = planes
            .first()
            .ok_or_else(|| OcrPrepError::InvalidRaster("no channel planes given".into()))?;
        let (width, height) = first.dimensions();
        if planes.iter().any(|p| p.dimensions() != (width, height)) {
            return Err(OcrPrepError::InvalidRaster(
                "channel planes differ in size".into(),
            ));
        }
        let channels = u8::try_from(planes.len()).map_err(|_| {
            OcrPrepError::InvalidRaster(format!("too many channel planes: {}", planes.len()))
        })?;
        let mut samples = Vec::with_capacity(width as usize * height as usize * planes.len());
        for idx in 0..(width as usize * height as usize) {
            for plane in planes {
                samples.push(plane.as_raw()[idx]);
            }
        }
        Self::new(width, height, channels, samples)
    }

    /// SHA-256 over shape and samples, as lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update([self.channels]);
        hasher.update(&self.samples);
        hex::encode(hasher.finalize())
    }
}

/// Per-pixel boolean mask produced by binarization.
///
/// `true` marks a pixel at or above its local threshold (light background);
/// `false` marks ink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRaster {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryRaster {
    pub fn new(width: u32, height: u32, bits: Vec<bool>) -> Result<Self> {
        if width == 0 || height == 0 || bits.len() != width as usize * height as usize {
            return Err(OcrPrepError::InvalidRaster(format!(
                "binary raster {width}x{height} needs {} bits, got {}",
                width as usize * height as usize,
                bits.len()
            )));
        }
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn count_set(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Render as a grayscale raster: set bits become 255, cleared bits 0.
    pub fn to_raster(&self) -> Raster {
        Raster {
            width: self.width,
            height: self.height,
            channels: 1,
            samples: self.bits.iter().map(|&b| if b { 255 } else { 0 }).collect(),
        }
    }
}

/// What kind of image the classifier believes it is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Mean intensity below one half: already processed or inverted. Left alone.
    DarkBackground,
    /// Few dominant intensity spikes: a digital capture with flat background.
    Screenshot,
    /// Broad intensity distribution: a photographed or scanned page.
    Document,
}

/// Outcome tag reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    DidNothing,
    JustGrayscale,
    ImageInverted,
    Cleaned,
}

impl PipelineStatus {
    /// Stable tag printed by the CLI and matched by downstream tooling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DidNothing => "DID_NOTHING",
            Self::JustGrayscale => "JUST_GRAYSCALE",
            Self::ImageInverted => "IMAGE_INVERTED",
            Self::Cleaned => "CLEANED",
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the orchestrator hands back for one input raster.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub raster: Raster,
    pub classification: Classification,
    pub status: PipelineStatus,
    /// Rotation applied to deskew the page, in degrees counter-clockwise.
    pub skew_angle: Option<f64>,
}
