// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command-line front end.
//
// Every pipeline error is mapped to plain English with a clear suggestion and
// the process exit code the CLI should use.

use crate::error::OcrPrepError;

/// Who has to act to fix the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The input image itself is unusable.
    BadInput,
    /// A tunable was out of range; fix the flags or config file.
    BadConfiguration,
    /// Filesystem or encoder trouble outside the pipeline.
    Environment,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
    /// Process exit code for the CLI.
    pub exit_code: i32,
}

/// Convert an `OcrPrepError` into a `HumanError`.
pub fn humanize_error(err: &OcrPrepError) -> HumanError {
    match err {
        OcrPrepError::InvalidRaster(detail) => HumanError {
            message: "The image could not be processed.".into(),
            suggestion: format!("Check that the file is a non-empty picture of a page. ({detail})"),
            severity: Severity::BadInput,
            exit_code: 65,
        },

        // Normally absorbed inside the skew estimator; only surfaces if a
        // caller asks for the strict estimate.
        OcrPrepError::InsufficientEvidence(detail) => HumanError {
            message: "No text lines were found to straighten the page.".into(),
            suggestion: format!("Try a sharper or higher-resolution image. ({detail})"),
            severity: Severity::BadInput,
            exit_code: 65,
        },

        OcrPrepError::UnsupportedConfiguration(detail) => HumanError {
            message: "One of the settings is out of range.".into(),
            suggestion: format!("Fix the option or config file value and run again. ({detail})"),
            severity: Severity::BadConfiguration,
            exit_code: 64,
        },

        OcrPrepError::ImageError(detail) => {
            if detail.contains("decode") || detail.contains("open") {
                HumanError {
                    message: "The source file is not an image we can read.".into(),
                    suggestion: format!("Use a PNG, JPEG or TIFF file. ({detail})"),
                    severity: Severity::BadInput,
                    exit_code: 65,
                }
            } else {
                HumanError {
                    message: "The cleaned image could not be written.".into(),
                    suggestion: format!(
                        "Pick a destination ending in .png, .jpg or .tif. ({detail})"
                    ),
                    severity: Severity::Environment,
                    exit_code: 73,
                }
            }
        }

        OcrPrepError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file could not be found.".into(),
                suggestion: "Check the path and try again.".into(),
                severity: Severity::Environment,
                exit_code: 66,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: "Check that you can read the source and write the destination.".into(),
                severity: Severity::Environment,
                exit_code: 77,
            },
            _ => HumanError {
                message: "A file operation failed.".into(),
                suggestion: format!("Check the disk and paths. ({io_err})"),
                severity: Severity::Environment,
                exit_code: 74,
            },
        },

        OcrPrepError::Serialization(json_err) => HumanError {
            message: "The config file could not be read.".into(),
            suggestion: format!("Make sure it is valid JSON. ({json_err})"),
            severity: Severity::BadConfiguration,
            exit_code: 78,
        },
    }
}
