//! Synchronized random mirroring of an image and its labels.

use ndarray::{ArrayD, Axis};
use rand::{Rng, RngCore};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use super::{get_rng, Augmentation, Pair};
use crate::axis::{AxisRole, Layout};
use crate::error::{Error, Result};

/// Immutable flip parameters with roles resolved to axis indices.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipConfig {
    chance: f64,
    role: AxisRole,
    image_layout: Layout,
    semantic_layout: Layout,
    image_axis: usize,
    semantic_axis: usize,
}

impl FlipConfig {
    /// Probability of flipping a pair.
    pub fn chance(&self) -> f64 {
        self.chance
    }

    /// Role of the mirror axis.
    pub fn role(&self) -> AxisRole {
        self.role
    }

    /// Mirror axis index in the image.
    pub fn image_axis(&self) -> usize {
        self.image_axis
    }

    /// Mirror axis index in the label array.
    pub fn semantic_axis(&self) -> usize {
        self.semantic_axis
    }

    fn flip_pair<A, L, R>(
        &self,
        image: ArrayD<A>,
        semantics: ArrayD<L>,
        rng: &mut R,
    ) -> Result<Pair<A, L>>
    where
        A: Clone,
        L: Clone,
        R: Rng + ?Sized,
    {
        self.image_layout.check_rank(image.shape(), "image")?;
        self.semantic_layout
            .check_rank(semantics.shape(), "semantic image")?;

        let image_len = image.len_of(Axis(self.image_axis));
        let semantic_len = semantics.len_of(Axis(self.semantic_axis));
        if image_len != semantic_len {
            return Err(Error::ShapeMismatch(format!(
                "flip axis ({}) has extent {} in the image but {} in the semantic image",
                self.role, image_len, semantic_len
            )));
        }

        let draw: f64 = rng.gen();
        let flipped = draw < self.chance;
        trace!(draw, chance = self.chance, flipped, "flip augmentation");

        if flipped {
            Ok((
                reverse_axis(image, self.image_axis),
                reverse_axis(semantics, self.semantic_axis),
            ))
        } else {
            Ok((image, semantics))
        }
    }
}

/// Reverse `array` along `axis` and return it in standard layout.
fn reverse_axis<T: Clone>(mut array: ArrayD<T>, axis: usize) -> ArrayD<T> {
    array.invert_axis(Axis(axis));
    array.as_standard_layout().into_owned()
}

/// Randomly mirror an image and its labels along the same axis.
///
/// One uniform draw in `[0, 1)` per call decides for both arrays: they are
/// reversed together along the configured axis or returned unchanged. No
/// other axis is touched and shapes are preserved.
///
/// # Example
///
/// ```ignore
/// let mut flip = FlipAugmentation::builder().chance(0.5).seed(42).build()?;
/// let (image, labels) = flip.apply(image, labels)?;
/// ```
#[derive(Debug, Clone)]
pub struct FlipAugmentation {
    config: FlipConfig,
    rng: ChaCha8Rng,
}

impl FlipAugmentation {
    /// Start configuring a flip augmentation.
    pub fn builder() -> FlipAugmentationBuilder {
        FlipAugmentationBuilder::new()
    }

    /// Resolved parameters.
    pub fn config(&self) -> &FlipConfig {
        &self.config
    }

    /// Flip using the augmentation's own random source.
    #[must_use = "this function returns the augmented pair"]
    pub fn apply<A: Clone, L: Clone>(
        &mut self,
        image: ArrayD<A>,
        semantics: ArrayD<L>,
    ) -> Result<Pair<A, L>> {
        self.config.flip_pair(image, semantics, &mut self.rng)
    }

    /// Flip using a caller-supplied random source.
    #[must_use = "this function returns the augmented pair"]
    pub fn apply_with_rng<A: Clone, L: Clone, R: Rng + ?Sized>(
        &self,
        image: ArrayD<A>,
        semantics: ArrayD<L>,
        rng: &mut R,
    ) -> Result<Pair<A, L>> {
        self.config.flip_pair(image, semantics, rng)
    }
}

impl<L: Clone> Augmentation<L> for FlipAugmentation {
    fn name(&self) -> &'static str {
        "flip"
    }

    fn augment(
        &self,
        image: ArrayD<f32>,
        semantics: ArrayD<L>,
        rng: &mut dyn RngCore,
    ) -> Result<Pair<f32, L>> {
        self.config.flip_pair(image, semantics, rng)
    }
}

/// Builder for [`FlipAugmentation`].
#[derive(Debug, Clone)]
pub struct FlipAugmentationBuilder {
    chance: f64,
    role: AxisRole,
    image_layout: Layout,
    semantic_layout: Layout,
    seed: Option<u64>,
}

impl Default for FlipAugmentationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlipAugmentationBuilder {
    /// Flip along the width axis half of the time, `bchw` images, `bhw` labels.
    pub fn new() -> Self {
        Self {
            chance: 0.5,
            role: AxisRole::Width,
            image_layout: Layout::bchw(),
            semantic_layout: Layout::bhw(),
            seed: None,
        }
    }

    /// Probability of flipping, in `[0, 1]`.
    pub fn chance(mut self, chance: f64) -> Self {
        self.chance = chance;
        self
    }

    /// Axis role to mirror (default: width).
    pub fn axis(mut self, role: AxisRole) -> Self {
        self.role = role;
        self
    }

    /// Axis layout of the image.
    pub fn image_layout(mut self, layout: Layout) -> Self {
        self.image_layout = layout;
        self
    }

    /// Axis layout of the label array.
    pub fn semantic_layout(mut self, layout: Layout) -> Self {
        self.semantic_layout = layout;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set an optional seed.
    pub fn seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Validate parameters and resolve the mirror axis in both layouts.
    pub fn build(self) -> Result<FlipAugmentation> {
        if !self.chance.is_finite() || !(0.0..=1.0).contains(&self.chance) {
            return Err(Error::Configuration(format!(
                "flip chance must be between 0.0 and 1.0 (got {})",
                self.chance
            )));
        }
        let image_axis = self.image_layout.index_of(self.role)?;
        let semantic_axis = self.semantic_layout.index_of(self.role)?;
        debug!(
            image_layout = %self.image_layout,
            semantic_layout = %self.semantic_layout,
            image_axis,
            semantic_axis,
            "resolved flip axes"
        );

        Ok(FlipAugmentation {
            config: FlipConfig {
                chance: self.chance,
                role: self.role,
                image_layout: self.image_layout,
                semantic_layout: self.semantic_layout,
                image_axis,
                semantic_axis,
            },
            rng: get_rng(self.seed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    fn ramp(shape: &[usize]) -> ArrayD<f32> {
        let n: usize = shape.iter().product();
        Array::from_shape_vec(IxDyn(shape), (0..n).map(|i| i as f32).collect()).unwrap()
    }

    fn labels(shape: &[usize]) -> ArrayD<u8> {
        let n: usize = shape.iter().product();
        Array::from_shape_vec(IxDyn(shape), (0..n).map(|i| (i % 7) as u8).collect()).unwrap()
    }

    #[test]
    fn test_always_flip_mirrors_both() {
        let mut flip = FlipAugmentation::builder()
            .chance(1.0)
            .seed(3)
            .build()
            .unwrap();
        let image = ramp(&[1, 2, 3, 4]);
        let semantics = labels(&[1, 3, 4]);

        let (out_img, out_sem) = flip.apply(image.clone(), semantics.clone()).unwrap();
        assert_eq!(out_img.shape(), image.shape());
        assert_eq!(out_sem.shape(), semantics.shape());
        for c in 0..2 {
            for y in 0..3 {
                for x in 0..4 {
                    assert_eq!(out_img[[0, c, y, x]], image[[0, c, y, 3 - x]]);
                }
            }
        }
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(out_sem[[0, y, x]], semantics[[0, y, 3 - x]]);
            }
        }
        assert!(out_img.is_standard_layout());
    }

    #[test]
    fn test_never_flip_is_identity() {
        let mut flip = FlipAugmentation::builder()
            .chance(0.0)
            .seed(3)
            .build()
            .unwrap();
        let image = ramp(&[2, 1, 3, 5]);
        let semantics = labels(&[2, 3, 5]);
        for _ in 0..20 {
            let (a, b) = flip.apply(image.clone(), semantics.clone()).unwrap();
            assert_eq!(a, image);
            assert_eq!(b, semantics);
        }
    }

    #[test]
    fn test_height_axis_with_custom_layouts() {
        let mut flip = FlipAugmentation::builder()
            .chance(1.0)
            .axis(AxisRole::Height)
            .image_layout(Layout::hwc())
            .semantic_layout(Layout::hw())
            .build()
            .unwrap();
        let image = ramp(&[3, 2, 3]);
        let semantics = labels(&[3, 2]);
        let (out_img, out_sem) = flip.apply(image.clone(), semantics.clone()).unwrap();
        assert_eq!(out_img[[0, 1, 2]], image[[2, 1, 2]]);
        assert_eq!(out_sem[[0, 1]], semantics[[2, 1]]);
        assert_eq!(out_sem[[1, 0]], semantics[[1, 0]]);
    }

    #[test]
    fn test_flip_with_seed_is_reproducible() {
        let image = ramp(&[1, 1, 2, 6]);
        let semantics = labels(&[1, 2, 6]);
        let run = |seed| {
            let mut flip = FlipAugmentation::builder().seed(seed).build().unwrap();
            (0..16)
                .map(|_| flip.apply(image.clone(), semantics.clone()).unwrap().0)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_invalid_chance_rejected() {
        for chance in [-0.1, 1.5, f64::NAN] {
            let err = FlipAugmentation::builder().chance(chance).build().unwrap_err();
            assert!(matches!(err, Error::Configuration(_)));
        }
    }

    #[test]
    fn test_missing_role_rejected() {
        let err = FlipAugmentation::builder()
            .axis(AxisRole::Slice)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_rank_and_extent_mismatch() {
        let mut flip = FlipAugmentation::builder().build().unwrap();

        let err = flip.apply(ramp(&[2, 3, 4]), labels(&[1, 2, 4])).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions(_)));

        let err = flip.apply(ramp(&[1, 1, 2, 4]), labels(&[1, 2, 5])).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    fn assert_same_stream(a: &mut ChaCha8Rng, b: &mut ChaCha8Rng) {
        for _ in 0..4 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_each_call_draws_one_uniform() {
        let flip = FlipAugmentation::builder().build().unwrap();
        let mut used = get_rng(Some(21));
        let mut twin = used.clone();
        for _ in 0..3 {
            flip.apply_with_rng(ramp(&[1, 1, 2, 4]), labels(&[1, 2, 4]), &mut used)
                .unwrap();
            let _: f64 = twin.gen();
        }
        assert_same_stream(&mut used, &mut twin);
    }

    #[test]
    fn test_rejected_pair_draws_nothing() {
        let flip = FlipAugmentation::builder().build().unwrap();
        let mut used = get_rng(Some(22));
        let mut twin = used.clone();
        assert!(flip
            .apply_with_rng(ramp(&[1, 1, 2, 4]), labels(&[1, 2, 5]), &mut used)
            .is_err());
        assert!(flip
            .apply_with_rng(ramp(&[1, 2, 4]), labels(&[1, 2, 4]), &mut used)
            .is_err());
        assert_same_stream(&mut used, &mut twin);
    }
}
