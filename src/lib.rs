//! # segaug
//!
//! Stochastic augmentations for paired image / label arrays, used to enlarge
//! training sets for dense-prediction models.
//!
//! Three independent transforms are provided:
//!
//! - [`FlipAugmentation`]: mirrors image and labels together along one axis.
//! - [`ScaleAugmentation`]: isotropic nearest-neighbour zoom of both arrays by
//!   one log-uniformly sampled factor, with optional depth-channel correction.
//! - [`PcaColorAugmentation`]: colour jitter along the principal axes of a
//!   colour covariance learned from a training corpus.
//!
//! Arrays carry caller-defined axis layouts, described once with a [`Layout`]
//! of named [`AxisRole`]s. Every augmentation owns its own seeded random
//! source, so pipelines are reproducible and can run on separate threads.
//!
//! ```ignore
//! use segaug::{AugmentationPipeline, FlipAugmentation, ScaleAugmentation};
//!
//! let flip = FlipAugmentation::builder().chance(0.5).build()?;
//! let scale = ScaleAugmentation::builder().min_scale(1.2).max_scale(1.2).build()?;
//! let mut pipeline = AugmentationPipeline::new().seed(7).then(flip).then(scale);
//! let (image, labels) = pipeline.apply(image, labels)?;
//! ```

#![warn(missing_docs)]

pub mod axis;
pub mod error;
pub mod transforms;

#[cfg(feature = "python")]
mod python;

pub use axis::{AxisRole, Layout};
pub use error::{Error, Result};
pub use transforms::{
    Augmentation, AugmentationPipeline, FlipAugmentation, FlipAugmentationBuilder,
    PcaBasis, PcaColorAugmentation, PcaColorAugmentationBuilder, ScaleAugmentation,
    ScaleAugmentationBuilder,
};
