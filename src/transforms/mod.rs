//! Paired image / label augmentations.
//!
//! Every augmentation maps `(image, semantics)` to a new pair and applies the
//! same geometric change to both arrays, so pixel-to-label correspondence is
//! preserved exactly.

mod color;
mod flip;
mod pipeline;
mod scale;

pub use color::{PcaBasis, PcaColorAugmentation, PcaColorAugmentationBuilder, PcaConfig};
pub use flip::{FlipAugmentation, FlipAugmentationBuilder, FlipConfig};
pub use pipeline::AugmentationPipeline;
pub use scale::{nearest_indices, zoomed_extent, ScaleAugmentation, ScaleAugmentationBuilder, ScaleConfig};

use crate::error::Result;
use ndarray::ArrayD;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// An image array and its aligned label array.
pub type Pair<A, L> = (ArrayD<A>, ArrayD<L>);

/// Random number generator with optional seeding for reproducibility.
#[allow(clippy::option_if_let_else)] // match is clearer than map_or_else here
pub(crate) fn get_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Object-safe interface shared by all augmentations so they can be chained.
///
/// `L` is the label element type. Images are `f32`.
pub trait Augmentation<L>: Send + Sync {
    /// Short name used in error reports and logs.
    fn name(&self) -> &'static str;

    /// Augment one pair, drawing randomness from `rng`.
    fn augment(
        &self,
        image: ArrayD<f32>,
        semantics: ArrayD<L>,
        rng: &mut dyn RngCore,
    ) -> Result<Pair<f32, L>>;
}
