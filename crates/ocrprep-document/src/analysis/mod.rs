// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image analysis — intensity/angle histograms and histogram-shape
// classification.

pub mod classify;
pub mod histogram;

pub use classify::{Assessment, ImageClassifier};
pub use histogram::{AngleHistogram, IntensityHistogram};
