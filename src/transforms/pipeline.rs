//! Seeded composition of augmentations.

use std::fmt;

use ndarray::ArrayD;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use super::{get_rng, Augmentation, Pair};
use crate::error::{Error, Result};

/// Ordered chain of augmentations driven by one random source.
///
/// Steps run in insertion order and all draw from the pipeline's generator,
/// so one seed reproduces the whole chain.
///
/// # Example
///
/// ```ignore
/// let mut pipeline = AugmentationPipeline::new()
///     .seed(42)
///     .then(FlipAugmentation::builder().build()?)
///     .then(ScaleAugmentation::builder().build()?);
/// let (image, labels) = pipeline.apply(image, labels)?;
/// ```
pub struct AugmentationPipeline<L> {
    steps: Vec<Box<dyn Augmentation<L>>>,
    rng: ChaCha8Rng,
}

impl<L> Default for AugmentationPipeline<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> fmt::Debug for AugmentationPipeline<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AugmentationPipeline")
            .field("steps", &self.step_names())
            .finish_non_exhaustive()
    }
}

impl<L> AugmentationPipeline<L> {
    /// Create an empty pipeline seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            rng: get_rng(None),
        }
    }

    /// Reseed the pipeline's generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = get_rng(Some(seed));
        self
    }

    /// Append a step.
    pub fn then<A: Augmentation<L> + 'static>(mut self, step: A) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Append an already boxed step.
    pub fn push(&mut self, step: Box<dyn Augmentation<L>>) {
        self.steps.push(step);
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the steps in order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step on the pair.
    ///
    /// A failing step aborts the chain and is reported by name.
    pub fn apply(&mut self, image: ArrayD<f32>, semantics: ArrayD<L>) -> Result<Pair<f32, L>> {
        let (mut image, mut semantics) = (image, semantics);
        for step in &self.steps {
            (image, semantics) = step
                .augment(image, semantics, &mut self.rng)
                .map_err(|e| Error::TransformError {
                    operation: step.name().to_string(),
                    reason: e.to_string(),
                })?;
            trace!(step = step.name(), shape = ?image.shape(), "pipeline step done");
        }
        Ok((image, semantics))
    }
}
