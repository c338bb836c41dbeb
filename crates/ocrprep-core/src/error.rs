// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ocrprep.

use thiserror::Error;

/// Top-level error type for all pre-processing operations.
#[derive(Debug, Error)]
pub enum OcrPrepError {
    // -- Pipeline errors --
    /// Malformed or empty input raster. Fatal.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// Not enough structure in the image to estimate something (e.g. no line
    /// segments for skew estimation). Callers usually recover with a default.
    #[error("insufficient evidence: {0}")]
    InsufficientEvidence(String),

    /// Out-of-range tunable, rejected before any work is done.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    // -- Collaborator errors (decode/encode, files) --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OcrPrepError>;
