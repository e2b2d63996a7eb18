//! Random isotropic zoom of an image and its labels.
//!
//! Resampling is nearest-neighbour (order 0) with corner-aligned sampling
//! grids, so label values are copied and never interpolated.

use ndarray::{ArrayD, Axis};
use rand::{Rng, RngCore};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use super::{get_rng, Augmentation, Pair};
use crate::axis::{AxisRole, Layout};
use crate::error::{Error, Result};

/// Output extent of an axis of length `extent` zoomed by `factor`.
///
/// Never smaller than one element.
pub fn zoomed_extent(extent: usize, factor: f64) -> usize {
    ((extent as f64 * factor).round() as usize).max(1)
}

/// Source index for each output position of a nearest-neighbour resample
/// from `n_in` to `n_out` elements.
///
/// First and last samples of input and output are aligned.
pub fn nearest_indices(n_in: usize, n_out: usize) -> Vec<usize> {
    if n_in == 0 {
        return Vec::new();
    }
    if n_out <= 1 {
        return vec![0; n_out];
    }
    let ratio = (n_in - 1) as f64 / (n_out - 1) as f64;
    (0..n_out)
        .map(|o| ((o as f64 * ratio + 0.5).floor() as usize).min(n_in - 1))
        .collect()
}

/// Channels holding physical depth values, which scale inversely to zoom.
#[derive(Debug, Clone, PartialEq)]
struct DepthChannels {
    axis: usize,
    channels: Vec<usize>,
}

/// Immutable zoom parameters with roles resolved to axis indices.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleConfig {
    log2_low: f64,
    log2_high: f64,
    image_layout: Layout,
    semantic_layout: Layout,
    image_axes: [usize; 2],
    semantic_axes: [usize; 2],
    depth: Option<DepthChannels>,
}

impl ScaleConfig {
    /// Smallest and largest zoom factor that can be sampled.
    pub fn factor_range(&self) -> (f64, f64) {
        let (a, b) = (self.log2_low.exp2(), self.log2_high.exp2());
        (a.min(b), a.max(b))
    }

    /// (height, width) axis indices in the image.
    pub fn image_axes(&self) -> [usize; 2] {
        self.image_axes
    }

    /// (height, width) axis indices in the label array.
    pub fn semantic_axes(&self) -> [usize; 2] {
        self.semantic_axes
    }

    /// Configured depth channels, if any.
    pub fn depth_channels(&self) -> Option<&[usize]> {
        self.depth.as_ref().map(|d| d.channels.as_slice())
    }

    /// Draw a zoom factor, log-uniform between the configured bounds.
    ///
    /// Consumes exactly one uniform draw.
    pub fn sample_factor<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        (self.log2_low + u * (self.log2_high - self.log2_low)).exp2()
    }

    fn check_inputs<L>(&self, image: &ArrayD<f32>, semantics: &ArrayD<L>) -> Result<()> {
        self.image_layout.check_rank(image.shape(), "image")?;
        self.semantic_layout
            .check_rank(semantics.shape(), "semantic image")?;

        for (&ia, &sa) in self.image_axes.iter().zip(&self.semantic_axes) {
            let (ni, ns) = (image.len_of(Axis(ia)), semantics.len_of(Axis(sa)));
            if ni == 0 {
                return Err(Error::InvalidDimensions(format!(
                    "cannot zoom an empty spatial axis (image shape {:?})",
                    image.shape()
                )));
            }
            if ni != ns {
                return Err(Error::ShapeMismatch(format!(
                    "image spatial shape {:?} does not match semantic spatial shape {:?}",
                    self.image_axes.map(|a| image.len_of(Axis(a))),
                    self.semantic_axes.map(|a| semantics.len_of(Axis(a))),
                )));
            }
        }

        if let Some(depth) = &self.depth {
            let available = image.len_of(Axis(depth.axis));
            if let Some(&bad) = depth.channels.iter().find(|&&c| c >= available) {
                return Err(Error::InvalidDimensions(format!(
                    "depth channel {} out of range for axis {} with {} channels",
                    bad, depth.axis, available
                )));
            }
        }
        Ok(())
    }

    fn zoom_pair<L, R>(
        &self,
        image: ArrayD<f32>,
        semantics: ArrayD<L>,
        rng: &mut R,
    ) -> Result<(ArrayD<f32>, ArrayD<L>, f64)>
    where
        L: Clone,
        R: Rng + ?Sized,
    {
        self.check_inputs(&image, &semantics)?;

        let factor = self.sample_factor(rng);
        let maps: Vec<Vec<usize>> = self
            .image_axes
            .iter()
            .map(|&a| {
                let n_in = image.len_of(Axis(a));
                nearest_indices(n_in, zoomed_extent(n_in, factor))
            })
            .collect();

        let mut zoomed = image;
        for (&axis, map) in self.image_axes.iter().zip(&maps) {
            zoomed = zoomed.select(Axis(axis), map);
        }
        let mut zoomed_semantics = semantics;
        for (&axis, map) in self.semantic_axes.iter().zip(&maps) {
            zoomed_semantics = zoomed_semantics.select(Axis(axis), map);
        }

        // Magnifying the sampling grid leaves the true distance unchanged.
        if let Some(depth) = &self.depth {
            let inv = (1.0 / factor) as f32;
            for &c in &depth.channels {
                zoomed
                    .index_axis_mut(Axis(depth.axis), c)
                    .mapv_inplace(|v| v * inv);
            }
        }

        for (&ia, &sa) in self.image_axes.iter().zip(&self.semantic_axes) {
            if zoomed.len_of(Axis(ia)) != zoomed_semantics.len_of(Axis(sa)) {
                return Err(Error::ShapeMismatch(format!(
                    "zoomed image {:?} and semantic image {:?} fell out of registration",
                    zoomed.shape(),
                    zoomed_semantics.shape()
                )));
            }
        }

        trace!(
            factor,
            shape = ?zoomed.shape(),
            "scale augmentation"
        );
        Ok((zoomed, zoomed_semantics, factor))
    }
}

/// Randomly rescale an image and its labels by one isotropic factor.
///
/// The factor `s` is sampled log-uniformly between `1 / min_scale` and
/// `max_scale`, so zooming in and out are equally likely. Height and width of
/// both arrays are resampled to `round(extent * s)` with nearest-neighbour
/// lookup; every other axis is left alone. Configured depth channels of the
/// image are divided by `s` after resampling.
///
/// # Example
///
/// ```ignore
/// let mut scale = ScaleAugmentation::builder()
///     .min_scale(1.2)
///     .max_scale(1.2)
///     .depth_channels(vec![3])
///     .build()?;
/// let (image, labels) = scale.apply(image, labels)?;
/// ```
#[derive(Debug, Clone)]
pub struct ScaleAugmentation {
    config: ScaleConfig,
    rng: ChaCha8Rng,
}

impl ScaleAugmentation {
    /// Start configuring a scale augmentation.
    pub fn builder() -> ScaleAugmentationBuilder {
        ScaleAugmentationBuilder::new()
    }

    /// Resolved parameters.
    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    /// Zoom using the augmentation's own random source.
    #[must_use = "this function returns the augmented pair"]
    pub fn apply<L: Clone>(
        &mut self,
        image: ArrayD<f32>,
        semantics: ArrayD<L>,
    ) -> Result<Pair<f32, L>> {
        let (image, semantics, _) = self.config.zoom_pair(image, semantics, &mut self.rng)?;
        Ok((image, semantics))
    }

    /// Zoom and also return the sampled factor.
    #[must_use = "this function returns the augmented pair"]
    pub fn apply_with_factor<L: Clone>(
        &mut self,
        image: ArrayD<f32>,
        semantics: ArrayD<L>,
    ) -> Result<(ArrayD<f32>, ArrayD<L>, f64)> {
        self.config.zoom_pair(image, semantics, &mut self.rng)
    }

    /// Zoom using a caller-supplied random source.
    #[must_use = "this function returns the augmented pair"]
    pub fn apply_with_rng<L: Clone, R: Rng + ?Sized>(
        &self,
        image: ArrayD<f32>,
        semantics: ArrayD<L>,
        rng: &mut R,
    ) -> Result<Pair<f32, L>> {
        let (image, semantics, _) = self.config.zoom_pair(image, semantics, rng)?;
        Ok((image, semantics))
    }
}

impl<L: Clone> Augmentation<L> for ScaleAugmentation {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn augment(
        &self,
        image: ArrayD<f32>,
        semantics: ArrayD<L>,
        rng: &mut dyn RngCore,
    ) -> Result<Pair<f32, L>> {
        self.apply_with_rng(image, semantics, rng)
    }
}

/// Builder for [`ScaleAugmentation`].
#[derive(Debug, Clone)]
pub struct ScaleAugmentationBuilder {
    min_scale: f64,
    max_scale: f64,
    fixed: Option<f64>,
    image_layout: Layout,
    semantic_layout: Layout,
    depth_role: AxisRole,
    depth_channels: Option<Vec<usize>>,
    seed: Option<u64>,
}

impl Default for ScaleAugmentationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScaleAugmentationBuilder {
    /// Factors in `[1/1.2, 1.2]`, `bchw` images, `bhw` labels, no depth channels.
    pub fn new() -> Self {
        Self {
            min_scale: 1.2,
            max_scale: 1.2,
            fixed: None,
            image_layout: Layout::bchw(),
            semantic_layout: Layout::bhw(),
            depth_role: AxisRole::Channel,
            depth_channels: None,
            seed: None,
        }
    }

    /// Lower bound is `1 / min_scale` (default: 1.2).
    pub fn min_scale(mut self, min_scale: f64) -> Self {
        self.min_scale = min_scale;
        self.fixed = None;
        self
    }

    /// Upper bound of the zoom factor (default: 1.2).
    pub fn max_scale(mut self, max_scale: f64) -> Self {
        self.max_scale = max_scale;
        self.fixed = None;
        self
    }

    /// Always zoom by exactly `factor`.
    pub fn fixed_scale(mut self, factor: f64) -> Self {
        self.fixed = Some(factor);
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

    /// Image channels (along the channel axis) that hold depth values.
    pub fn depth_channels(mut self, channels: Vec<usize>) -> Self {
        self.depth_channels = Some(channels);
        self
    }

    /// Image axis that indexes the depth channels (default: channel).
    pub fn depth_role(mut self, role: AxisRole) -> Self {
        self.depth_role = role;
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

    /// Validate parameters and resolve spatial and depth axes.
    pub fn build(self) -> Result<ScaleAugmentation> {
        let check = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::Configuration(format!(
                    "{} must be positive and finite (got {})",
                    name, value
                )))
            }
        };
        let (log2_low, log2_high) = match self.fixed {
            Some(factor) => {
                check("fixed scale", factor)?;
                (factor.log2(), factor.log2())
            }
            None => {
                check("min_scale", self.min_scale)?;
                check("max_scale", self.max_scale)?;
                ((1.0 / self.min_scale).log2(), self.max_scale.log2())
            }
        };

        let image_axes = [
            self.image_layout.index_of(AxisRole::Height)?,
            self.image_layout.index_of(AxisRole::Width)?,
        ];
        let semantic_axes = [
            self.semantic_layout.index_of(AxisRole::Height)?,
            self.semantic_layout.index_of(AxisRole::Width)?,
        ];

        let depth = match self.depth_channels {
            None => None,
            Some(channels) => {
                if matches!(self.depth_role, AxisRole::Height | AxisRole::Width) {
                    return Err(Error::Configuration(format!(
                        "depth channels cannot live on the zoomed {} axis",
                        self.depth_role
                    )));
                }
                if channels.is_empty() {
                    return Err(Error::Configuration(
                        "depth channel list is empty; omit it instead".into(),
                    ));
                }
                let axis = self.image_layout.index_of(self.depth_role)?;
                Some(DepthChannels { axis, channels })
            }
        };

        debug!(
            image_layout = %self.image_layout,
            semantic_layout = %self.semantic_layout,
            log2_low,
            log2_high,
            "resolved scale axes"
        );

        Ok(ScaleAugmentation {
            config: ScaleConfig {
                log2_low,
                log2_high,
                image_layout: self.image_layout,
                semantic_layout: self.semantic_layout,
                image_axes,
                semantic_axes,
                depth,
            },
            rng: get_rng(self.seed),
        })
    }
}
