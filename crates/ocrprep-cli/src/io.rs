// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File collaborators — decode and encode rasters, copy untouched sources and
// read JSON configuration.

use std::path::Path;

use ocrprep_core::error::{OcrPrepError, Result};
use ocrprep_core::{CleanConfig, Raster};
use tracing::{debug, info, instrument};

/// Decode an image file into a raster.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_raster(path: &Path) -> Result<Raster> {
    let image = image::open(path).map_err(|err| match err {
        image::ImageError::IoError(io_err) => OcrPrepError::Io(io_err),
        other => OcrPrepError::ImageError(format!(
            "failed to open image {}: {other}",
            path.display()
        )),
    })?;
    let raster = Raster::from_dynamic(&image)?;
    info!(
        width = raster.width(),
        height = raster.height(),
        channels = raster.channels(),
        fingerprint = %raster.fingerprint(),
        "Source loaded"
    );
    Ok(raster)
}

/// Encode `raster` to `path`; the format follows the file extension.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn save_raster(raster: &Raster, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    raster.to_dynamic()?.save(path).map_err(|err| match err {
        image::ImageError::IoError(io_err) => OcrPrepError::Io(io_err),
        other => OcrPrepError::ImageError(format!(
            "failed to encode image to {}: {other}",
            path.display()
        )),
    })?;
    info!(fingerprint = %raster.fingerprint(), "Result written");
    Ok(())
}

/// Copy the source file byte-for-byte. A destination that is the source
/// itself is left alone.
#[instrument(skip_all, fields(source = %source.display(), dest = %dest.display()))]
pub fn copy_verbatim(source: &Path, dest: &Path) -> Result<()> {
    ensure_parent_dir(dest)?;
    if dest.exists() && std::fs::canonicalize(source)? == std::fs::canonicalize(dest)? {
        debug!("Destination is the source; nothing to copy");
        return Ok(());
    }
    let bytes = std::fs::copy(source, dest)?;
    debug!(bytes, "Source copied unchanged");
    Ok(())
}

/// Read a JSON [`CleanConfig`]. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<CleanConfig> {
    let data = std::fs::read_to_string(path)?;
    let config = serde_json::from_str(&data)?;
    Ok(config)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
