// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster processor — grayscale, tonal inversion, rotation with background
// fill, and border padding. Operates on in-memory rasters using the `image`
// and `imageproc` crates.

use image::{DynamicImage, GenericImage, Luma, LumaA, Pixel, Rgb, Rgba};
use imageproc::definitions::Image;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use ocrprep_core::Raster;
use ocrprep_core::error::{OcrPrepError, Result};
use tracing::{debug, info, instrument};

/// Chainable transforms over a single raster.
///
/// Every method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed raster; the input raster is never modified.
///
/// ```ignore
/// let page = ImageProcessor::from_raster(raster)
///     .grayscale()?
///     .rotate(-2.5, 255)?
///     .pad(10, 255)?
///     .into_raster();
/// ```
pub struct ImageProcessor {
    raster: Raster,
}

impl ImageProcessor {
    pub fn from_raster(raster: Raster) -> Self {
        Self { raster }
    }

    pub fn as_raster(&self) -> &Raster {
        &self.raster
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Convert to single-channel luma.
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Result<Self> {
        debug!(channels = self.raster.channels(), "Converting to grayscale");
        Ok(Self {
            raster: self.raster.to_grayscale()?,
        })
    }

    /// Tonal inverse: every sample `v` becomes `255 - v`.
    #[instrument(skip(self))]
    pub fn invert(self) -> Self {
        info!("Inverting image");
        Self {
            raster: self.raster.map_samples(|v| 255 - v),
        }
    }

    /// Rotate counter-clockwise by `degrees` about the centre, keeping the
    /// canvas size. Pixels exposed by the rotation take `fill` in every
    /// colour channel (alpha stays opaque).
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f64, fill: u8) -> Result<Self> {
        if !degrees.is_finite() {
            return Err(OcrPrepError::InvalidRaster(format!(
                "rotation angle must be finite, got {degrees}"
            )));
        }
        if degrees.rem_euclid(360.0).abs() < 1e-6 {
            return Ok(self);
        }

        info!(degrees, "Rotating image");
        // imageproc rotates clockwise for positive angles.
        let theta = -(degrees.to_radians() as f32);

        let rotated = match self.raster.to_dynamic()? {
            DynamicImage::ImageLuma8(buf) => {
                DynamicImage::ImageLuma8(rotate(&buf, theta, Luma([fill])))
            }
            DynamicImage::ImageLumaA8(buf) => {
                DynamicImage::ImageLumaA8(rotate(&buf, theta, LumaA([fill, 255])))
            }
            DynamicImage::ImageRgb8(buf) => {
                DynamicImage::ImageRgb8(rotate(&buf, theta, Rgb([fill; 3])))
            }
            DynamicImage::ImageRgba8(buf) => {
                DynamicImage::ImageRgba8(rotate(&buf, theta, Rgba([fill, fill, fill, 255])))
            }
            other => {
                return Err(OcrPrepError::InvalidRaster(format!(
                    "unexpected pixel layout {:?}",
                    other.color()
                )));
            }
        };

        debug!("Rotation applied");
        Ok(Self {
            raster: Raster::from_dynamic(&rotated)?,
        })
    }

    /// Surround the raster with a constant border `px` pixels wide.
    #[instrument(skip(self), fields(px, fill))]
    pub fn pad(self, px: u32, fill: u8) -> Result<Self> {
        if px == 0 {
            return Ok(self);
        }
        info!(px, "Adding border");

        let padded = match self.raster.to_dynamic()? {
            DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(pad(&buf, px, Luma([fill]))?),
            DynamicImage::ImageLumaA8(buf) => {
                DynamicImage::ImageLumaA8(pad(&buf, px, LumaA([fill, 255]))?)
            }
            DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(pad(&buf, px, Rgb([fill; 3]))?),
            DynamicImage::ImageRgba8(buf) => {
                DynamicImage::ImageRgba8(pad(&buf, px, Rgba([fill, fill, fill, 255]))?)
            }
            other => {
                return Err(OcrPrepError::InvalidRaster(format!(
                    "unexpected pixel layout {:?}",
                    other.color()
                )));
            }
        };

        Ok(Self {
            raster: Raster::from_dynamic(&padded)?,
        })
    }
}

fn rotate<P>(image: &Image<P>, theta: f32, default: P) -> Image<P>
where
    P: Pixel<Subpixel = u8> + Send + Sync,
{
    rotate_about_center(image, theta, Interpolation::Bilinear, default)
}

fn pad<P>(image: &Image<P>, px: u32, fill: P) -> Result<Image<P>>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = image.dimensions();
    let mut canvas = Image::<P>::from_pixel(w + 2 * px, h + 2 * px, fill);
    canvas
        .copy_from(image, px, px)
        .map_err(|err| OcrPrepError::InvalidRaster(format!("failed to pad raster: {err}")))?;
    Ok(canvas)
}
