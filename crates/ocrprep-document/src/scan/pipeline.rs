// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cleaning orchestrator — classify an input raster and route it through the
// matching chain of stages.

use ocrprep_core::error::Result;
use ocrprep_core::{Classification, CleanConfig, PipelineResult, PipelineStatus, Raster};
use tracing::{debug, info, instrument};

use super::binarize::SauvolaBinarizer;
use super::denoise::NlMeansDenoiser;
use super::shadow::ShadowRemover;
use super::skew::SkewEstimator;
use crate::analysis::classify::ImageClassifier;
use crate::image::processor::ImageProcessor;

/// Background fill for pixels exposed by rotation and padding.
const PAGE_WHITE: u8 = 255;

/// Validated, reusable pipeline. Holds no per-image state, so one instance may
/// be shared across threads.
///
/// | Classification   | Stages                                             | Status           |
/// |------------------|----------------------------------------------------|------------------|
/// | `DarkBackground` | none, source returned as-is                        | `DID_NOTHING`    |
/// | `Screenshot`     | grayscale, then invert if the dark half dominates  | `JUST_GRAYSCALE` / `IMAGE_INVERTED` |
/// | `Document`       | shadows, denoise, optional binarize + deskew, pad  | `CLEANED`        |
#[derive(Debug, Clone)]
pub struct CleaningPipeline {
    config: CleanConfig,
    classifier: ImageClassifier,
    shadows: ShadowRemover,
    denoiser: NlMeansDenoiser,
    binarizer: SauvolaBinarizer,
    skew: SkewEstimator,
}

impl CleaningPipeline {
    /// Build a pipeline, rejecting out-of-range configuration up front.
    pub fn new(config: CleanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: ImageClassifier::new(config.spike_threshold)?,
            shadows: ShadowRemover::default(),
            denoiser: NlMeansDenoiser::new(&config.denoise_settings)?,
            binarizer: SauvolaBinarizer::from_config(&config)?,
            skew: SkewEstimator::new(config.skew_settings.clone())?,
            config,
        })
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Classify `source` and produce the cleaned raster with its status tag.
    #[instrument(skip_all, fields(
        width = source.width(),
        height = source.height(),
        channels = source.channels(),
    ))]
    pub fn clean(&self, source: &Raster) -> Result<PipelineResult> {
        let gray = source.to_grayscale()?;
        let assessment = self.classifier.assess(&gray)?;
        info!(classification = ?assessment.classification, "Image classified");

        let result = match assessment.classification {
            Classification::DarkBackground => PipelineResult {
                raster: source.clone(),
                classification: Classification::DarkBackground,
                status: PipelineStatus::DidNothing,
                skew_angle: None,
            },
            Classification::Screenshot => {
                let processor = ImageProcessor::from_raster(gray);
                let (processor, status) = if assessment.needs_inversion {
                    (processor.invert(), PipelineStatus::ImageInverted)
                } else {
                    (processor, PipelineStatus::JustGrayscale)
                };
                PipelineResult {
                    raster: processor.into_raster(),
                    classification: Classification::Screenshot,
                    status,
                    skew_angle: None,
                }
            }
            Classification::Document => self.clean_document(gray)?,
        };

        info!(status = %result.status, "Pipeline finished");
        Ok(result)
    }

    /// Binarize, estimate skew and rotate, skipping classification entirely.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn preprocess(&self, source: &Raster) -> Result<PipelineResult> {
        let gray = source.to_grayscale()?;
        let (raster, angle) = self.deskew(&gray)?;
        Ok(PipelineResult {
            raster,
            classification: Classification::Document,
            status: PipelineStatus::Cleaned,
            skew_angle: Some(angle),
        })
    }

    fn clean_document(&self, gray: Raster) -> Result<PipelineResult> {
        let mut page = gray;
        if self.config.remove_shadows {
            page = self.shadows.remove(&page)?;
        }
        if self.config.denoise {
            page = self.denoiser.denoise(&page)?;
        }

        let mut skew_angle = None;
        if self.config.enable_deskew {
            let (rotated, angle) = self.deskew(&page)?;
            page = rotated;
            skew_angle = Some(angle);
        }

        let raster = ImageProcessor::from_raster(page)
            .pad(self.config.border_px, PAGE_WHITE)?
            .into_raster();

        Ok(PipelineResult {
            raster,
            classification: Classification::Document,
            status: PipelineStatus::Cleaned,
            skew_angle,
        })
    }

    /// Sauvola-binarize `page`, measure its skew and rotate the binary page
    /// upright. Returns the rotated page and the applied angle.
    fn deskew(&self, page: &Raster) -> Result<(Raster, f64)> {
        let binary = self.binarizer.binarize(page)?.to_raster();
        let angle = self.skew.estimate(&binary)?;
        debug!(angle, "Deskewing binarized page");

        let rotated = ImageProcessor::from_raster(binary)
            .rotate(angle, PAGE_WHITE)?
            .into_raster();
        Ok((rotated, angle))
    }
}

/// One-shot [`CleaningPipeline::clean`].
pub fn clean(source: &Raster, config: &CleanConfig) -> Result<PipelineResult> {
    CleaningPipeline::new(config.clone())?.clean(source)
}

/// One-shot [`CleaningPipeline::preprocess`].
pub fn preprocess(source: &Raster, config: &CleanConfig) -> Result<PipelineResult> {
    CleaningPipeline::new(config.clone())?.preprocess(source)
}
