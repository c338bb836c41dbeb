// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrprep-cli — Command-line surface for the OCR pre-processing pipeline.

pub mod io;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use ocrprep_core::error::Result;
use ocrprep_core::{CleanConfig, PipelineStatus};
use ocrprep_document::CleaningPipeline;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "ocrprep")]
#[command(version, about = "Prepare photographed pages and screenshots for OCR", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify an image and clean it; prints the outcome tag on stdout
    Clean {
        /// Image to clean
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Where to write the result (format follows the extension)
        #[arg(value_name = "DEST")]
        dest: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Binarize and straighten an image without classifying it
    Deskew {
        /// Image to straighten
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Where to write the result (format follows the extension)
        #[arg(value_name = "DEST")]
        dest: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },
}

/// Tunables shared by every subcommand. Flags override the config file.
#[derive(Debug, Default, Args)]
pub struct TuningArgs {
    /// JSON config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sauvola window radius in pixels
    #[arg(long, value_name = "PX")]
    pub window_radius: Option<u32>,

    /// Maximum histogram spikes for an image to count as a screenshot
    #[arg(long, value_name = "N")]
    pub spike_threshold: Option<u32>,

    /// Binarize and deskew cleaned documents
    #[arg(long)]
    pub deskew: bool,

    /// Skip shadow removal
    #[arg(long)]
    pub no_shadows: bool,

    /// Skip non-local-means denoising
    #[arg(long)]
    pub no_denoise: bool,

    /// White border added around cleaned documents
    #[arg(long, value_name = "PX")]
    pub border: Option<u32>,
}

impl TuningArgs {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn resolve(&self) -> Result<CleanConfig> {
        let mut config = match &self.config {
            Some(path) => io::load_config(path)?,
            None => CleanConfig::default(),
        };
        if let Some(radius) = self.window_radius {
            config.window_radius = radius;
        }
        if let Some(threshold) = self.spike_threshold {
            config.spike_threshold = threshold;
        }
        if self.deskew {
            config.enable_deskew = true;
        }
        if self.no_shadows {
            config.remove_shadows = false;
        }
        if self.no_denoise {
            config.denoise = false;
        }
        if let Some(px) = self.border {
            config.border_px = px;
        }
        Ok(config)
    }
}

/// Execute one parsed command and return the status tag to report.
pub fn run(cli: &Cli) -> Result<PipelineStatus> {
    match &cli.command {
        Commands::Clean {
            source,
            dest,
            tuning,
        } => run_clean(source, dest, tuning.resolve()?),
        Commands::Deskew {
            source,
            dest,
            tuning,
        } => run_deskew(source, dest, tuning.resolve()?),
    }
}

/// Clean `source` into `dest`. Untouched images are copied byte-for-byte.
pub fn run_clean(source: &Path, dest: &Path, config: CleanConfig) -> Result<PipelineStatus> {
    let pipeline = CleaningPipeline::new(config)?;
    let raster = io::load_raster(source)?;
    let result = pipeline.clean(&raster)?;

    if result.status == PipelineStatus::DidNothing {
        io::copy_verbatim(source, dest)?;
    } else {
        io::save_raster(&result.raster, dest)?;
    }
    info!(status = %result.status, skew_angle = ?result.skew_angle, "Clean finished");
    Ok(result.status)
}

/// Straighten `source` into `dest`.
pub fn run_deskew(source: &Path, dest: &Path, config: CleanConfig) -> Result<PipelineStatus> {
    let pipeline = CleaningPipeline::new(config)?;
    let raster = io::load_raster(source)?;
    let result = pipeline.preprocess(&raster)?;
    io::save_raster(&result.raster, dest)?;
    info!(skew_angle = ?result.skew_angle, "Deskew finished");
    Ok(result.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "ocrprep",
            "clean",
            "in.png",
            "out.png",
            "--window-radius",
            "9",
            "--spike-threshold",
            "1",
            "--deskew",
            "--no-denoise",
            "--border",
            "10",
        ]);
        let Commands::Clean { tuning, .. } = &cli.command else {
            panic!("expected clean subcommand");
        };
        let config = tuning.resolve().unwrap();
        assert_eq!(config.window_radius, 9);
        assert_eq!(config.spike_threshold, 1);
        assert!(config.enable_deskew);
        assert!(!config.denoise);
        assert!(config.remove_shadows);
        assert_eq!(config.border_px, 10);
    }

    #[test]
    fn no_flags_yield_default_config() {
        assert_eq!(TuningArgs::default().resolve().unwrap(), CleanConfig::default());
    }

    #[test]
    fn deskew_subcommand_parses() {
        let cli = Cli::parse_from(["ocrprep", "deskew", "a.jpg", "b.png"]);
        assert!(matches!(cli.command, Commands::Deskew { .. }));
    }
}
