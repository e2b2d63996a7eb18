//! PCA colour jitter.
//!
//! A colour covariance is learned once from a training corpus. At apply time
//! each image is shifted along the principal colour axes by a random amount
//! proportional to the standard deviation along that axis.

use std::cmp::Ordering;

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::{ArrayD, Axis};
use rand::{Rng, RngCore};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use super::{get_rng, Augmentation, Pair};
use crate::axis::{AxisRole, Layout};
use crate::error::{Error, Result};

/// Fitted colour basis: mean, covariance, principal axes and their spreads.
///
/// Eigenvector columns and square-root eigenvalues share one ordering
/// (descending eigenvalue).
#[derive(Debug, Clone, PartialEq)]
pub struct PcaBasis {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    eigenvectors: DMatrix<f64>,
    sqrt_eigenvalues: DVector<f64>,
}

impl PcaBasis {
    /// Build a basis from known principal axes, e.g. published dataset statistics.
    ///
    /// `eigenvectors` holds one axis per column; `eigenvalues` are variances
    /// along those axes and must be non-negative.
    pub fn new(mean: Vec<f64>, eigenvectors: DMatrix<f64>, eigenvalues: Vec<f64>) -> Result<Self> {
        let d = mean.len();
        if d == 0 {
            return Err(Error::Configuration("PCA basis needs at least one channel".into()));
        }
        if eigenvectors.shape() != (d, d) || eigenvalues.len() != d {
            return Err(Error::Configuration(format!(
                "PCA basis for {} channels needs a {}x{} eigenvector matrix and {} eigenvalues (got {:?} and {})",
                d,
                d,
                d,
                d,
                eigenvectors.shape(),
                eigenvalues.len()
            )));
        }
        if mean.iter().chain(eigenvectors.iter()).any(|v| !v.is_finite()) {
            return Err(Error::Configuration(
                "PCA basis mean and eigenvectors must be finite".into(),
            ));
        }
        if let Some(bad) = eigenvalues.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::Configuration(format!(
                "eigenvalues must be finite and non-negative (got {})",
                bad
            )));
        }

        let lambda = DVector::from_vec(eigenvalues);
        let covariance = &eigenvectors * DMatrix::from_diagonal(&lambda) * eigenvectors.transpose();
        Ok(Self {
            mean: DVector::from_vec(mean),
            covariance,
            eigenvectors,
            sqrt_eigenvalues: lambda.map(f64::sqrt),
        })
    }

    /// Fit a basis to every pixel of `images`.
    ///
    /// `color_axis` indexes the colour channels of each image; all other axes
    /// are flattened into pixels. Covariance is normalised by the pixel count.
    fn fit(images: &[ArrayD<f32>], color_axis: usize, channels: &[usize]) -> Result<Self> {
        let d = channels.len();

        let (count, sum) = images
            .par_iter()
            .map(|image| {
                let mut sum = vec![0.0f64; d];
                let mut n = 0usize;
                for pixel in image.lanes(Axis(color_axis)) {
                    for (acc, &c) in sum.iter_mut().zip(channels) {
                        *acc += f64::from(pixel[c]);
                    }
                    n += 1;
                }
                (n, sum)
            })
            .reduce(
                || (0, vec![0.0; d]),
                |(na, mut a), (nb, b)| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    (na + nb, a)
                },
            );
        if count == 0 {
            return Err(Error::EmptyInput(format!(
                "no pixels in {} training images",
                images.len()
            )));
        }
        let mean = DVector::from_vec(sum) / count as f64;
        if let Some(k) = mean.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidValue(format!(
                "colour channel {} of the training images contains NaN or infinite values",
                channels[k]
            )));
        }

        let scatter = images
            .par_iter()
            .map(|image| {
                let mut scatter = DMatrix::<f64>::zeros(d, d);
                let mut centered = DVector::<f64>::zeros(d);
                for pixel in image.lanes(Axis(color_axis)) {
                    for (k, &c) in channels.iter().enumerate() {
                        centered[k] = f64::from(pixel[c]) - mean[k];
                    }
                    scatter.ger(1.0, &centered, &centered, 1.0);
                }
                scatter
            })
            .reduce(|| DMatrix::zeros(d, d), |a, b| a + b);
        let covariance = scatter / count as f64;
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidValue(
                "colour covariance of the training images overflowed".into(),
            ));
        }

        let eigen = SymmetricEigen::new(covariance.clone());
        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&a, &b| {
            eigen.eigenvalues[b]
                .partial_cmp(&eigen.eigenvalues[a])
                .unwrap_or(Ordering::Equal)
        });
        let eigenvectors = DMatrix::from_fn(d, d, |r, c| eigen.eigenvectors[(r, order[c])]);
        // Round-off can leave tiny negative variances.
        let sqrt_eigenvalues =
            DVector::from_iterator(d, order.iter().map(|&i| eigen.eigenvalues[i].max(0.0).sqrt()));

        info!(
            pixels = count,
            images = images.len(),
            channels = d,
            sqrt_eigenvalues = ?sqrt_eigenvalues.as_slice(),
            "fitted PCA colour basis"
        );

        Ok(Self {
            mean,
            covariance,
            eigenvectors,
            sqrt_eigenvalues,
        })
    }

    /// Number of colour channels the basis spans.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Per-channel mean colour of the training corpus.
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Colour covariance (normalised by pixel count).
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Principal axes, one per column.
    pub fn eigenvectors(&self) -> &DMatrix<f64> {
        &self.eigenvectors
    }

    /// Standard deviation along each principal axis.
    pub fn sqrt_eigenvalues(&self) -> &DVector<f64> {
        &self.sqrt_eigenvalues
    }
}

/// Immutable colour-jitter parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaConfig {
    sigma: f64,
    layout: Layout,
    color_axis: usize,
    color_channels: Vec<usize>,
}

impl PcaConfig {
    /// Standard deviation of the per-axis noise, before scaling by the axis spread.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Colour axis index in images passed to `apply`.
    pub fn color_axis(&self) -> usize {
        self.color_axis
    }

    /// Channel indices treated as colour.
    pub fn color_channels(&self) -> &[usize] {
        &self.color_channels
    }

    fn check_channels(&self, shape: &[usize], axis: usize, what: &str) -> Result<()> {
        let available = shape[axis];
        if let Some(&bad) = self.color_channels.iter().find(|&&c| c >= available) {
            return Err(Error::InvalidDimensions(format!(
                "colour channel {} out of range: {} {:?} has {} channels on axis {}",
                bad, what, shape, available, axis
            )));
        }
        Ok(())
    }

    /// Draw `d` normal samples and project them into channel space.
    fn color_offset<R: Rng + ?Sized>(&self, basis: &PcaBasis, rng: &mut R) -> Result<DVector<f64>> {
        let normal = Normal::new(0.0, self.sigma)
            .map_err(|e| Error::Configuration(format!("invalid sigma {}: {}", self.sigma, e)))?;
        let spread = basis.sqrt_eigenvalues();
        let weights = DVector::from_fn(basis.dim(), |k, _| rng.sample(normal) * spread[k]);
        Ok(basis.eigenvectors() * weights)
    }

    fn jitter<L, R>(
        &self,
        basis: Option<&PcaBasis>,
        mut image: ArrayD<f32>,
        semantics: ArrayD<L>,
        rng: &mut R,
    ) -> Result<Pair<f32, L>>
    where
        R: Rng + ?Sized,
    {
        let basis = basis.ok_or(Error::NotFitted("PcaColorAugmentation"))?;
        self.layout.check_rank(image.shape(), "image")?;
        self.check_channels(image.shape(), self.color_axis, "image")?;

        let offset = self.color_offset(basis, rng)?;
        trace!(offset = ?offset.as_slice(), "pca colour augmentation");

        for (k, &c) in self.color_channels.iter().enumerate() {
            let shift = offset[k] as f32;
            image
                .index_axis_mut(Axis(self.color_axis), c)
                .mapv_inplace(|v| v + shift);
        }
        Ok((image, semantics))
    }
}

/// Colour jitter along the principal components of a training corpus.
///
/// [`train`](Self::train) learns the colour basis; [`apply`](Self::apply)
/// draws `d` samples from `N(0, sigma)`, scales them by the spread of each
/// principal axis, projects them back to channel space and adds the result
/// to the colour channels of the image. The label array is returned as is.
///
/// # Example
///
/// ```ignore
/// let mut pca = PcaColorAugmentation::builder().sigma(0.1).seed(0).build()?;
/// pca.train(&corpus, &Layout::hwc())?;
/// let (image, labels) = pca.apply(image, labels)?;
/// ```
#[derive(Debug, Clone)]
pub struct PcaColorAugmentation {
    config: PcaConfig,
    basis: Option<PcaBasis>,
    rng: ChaCha8Rng,
}

impl PcaColorAugmentation {
    /// Start configuring a PCA colour augmentation.
    pub fn builder() -> PcaColorAugmentationBuilder {
        PcaColorAugmentationBuilder::new()
    }

    /// Resolved parameters.
    pub fn config(&self) -> &PcaConfig {
        &self.config
    }

    /// Fitted basis, if [`train`](Self::train) has run.
    pub fn basis(&self) -> Option<&PcaBasis> {
        self.basis.as_ref()
    }

    /// Whether a basis is available.
    pub fn is_trained(&self) -> bool {
        self.basis.is_some()
    }

    /// Use a precomputed basis instead of training.
    pub fn with_basis(mut self, basis: PcaBasis) -> Result<Self> {
        if basis.dim() != self.config.color_channels.len() {
            return Err(Error::Configuration(format!(
                "basis spans {} channels but {} colour channels are configured",
                basis.dim(),
                self.config.color_channels.len()
            )));
        }
        self.basis = Some(basis);
        Ok(self)
    }

    /// Learn the colour basis from a corpus.
    ///
    /// `layout` describes the training images and may differ from the
    /// apply-time layout; its channel axis holds the colours. Replaces any
    /// previously fitted basis.
    ///
    /// # Arguments
    ///
    /// * `images` - Training images, all with `layout`
    /// * `layout` - Axis layout of the training images (must contain a channel axis)
    pub fn train(&mut self, images: &[ArrayD<f32>], layout: &Layout) -> Result<&PcaBasis> {
        let color_axis = layout.index_of(AxisRole::Channel)?;
        for (i, image) in images.iter().enumerate() {
            let what = format!("training image {}", i);
            layout.check_rank(image.shape(), &what)?;
            self.config.check_channels(image.shape(), color_axis, &what)?;
        }

        let basis = PcaBasis::fit(images, color_axis, &self.config.color_channels)?;
        let basis = self.basis.insert(basis);
        Ok(&*basis)
    }

    /// Colour offset for the next call, in channel space.
    ///
    /// Consumes the same draws an [`apply`](Self::apply) would.
    pub fn color_offset_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DVector<f64>> {
        let basis = self
            .basis
            .as_ref()
            .ok_or(Error::NotFitted("PcaColorAugmentation"))?;
        self.config.color_offset(basis, rng)
    }

    /// Jitter colours using the augmentation's own random source.
    #[must_use = "this function returns the augmented pair"]
    pub fn apply<L>(&mut self, image: ArrayD<f32>, semantics: ArrayD<L>) -> Result<Pair<f32, L>> {
        self.config
            .jitter(self.basis.as_ref(), image, semantics, &mut self.rng)
    }

    /// Jitter colours using a caller-supplied random source.
    #[must_use = "this function returns the augmented pair"]
    pub fn apply_with_rng<L, R: Rng + ?Sized>(
        &self,
        image: ArrayD<f32>,
        semantics: ArrayD<L>,
        rng: &mut R,
    ) -> Result<Pair<f32, L>> {
        self.config
            .jitter(self.basis.as_ref(), image, semantics, rng)
    }
}

impl<L> Augmentation<L> for PcaColorAugmentation {
    fn name(&self) -> &'static str {
        "pca_color"
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

/// Builder for [`PcaColorAugmentation`].
#[derive(Debug, Clone)]
pub struct PcaColorAugmentationBuilder {
    sigma: f64,
    layout: Layout,
    color_channels: Vec<usize>,
    seed: Option<u64>,
}

impl Default for PcaColorAugmentationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PcaColorAugmentationBuilder {
    /// `sigma = 0.1`, `bchw` images, colour channels `[0, 1, 2]`.
    pub fn new() -> Self {
        Self {
            sigma: 0.1,
            layout: Layout::bchw(),
            color_channels: vec![0, 1, 2],
            seed: None,
        }
    }

    /// Noise magnitude (default: 0.1).
    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Axis layout of images passed to `apply`; its channel axis holds colours.
    pub fn image_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Channel indices treated as colour, e.g. the RGB subset of RGB-D.
    pub fn color_channels(mut self, channels: Vec<usize>) -> Self {
        self.color_channels = channels;
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

    /// Validate parameters and resolve the colour axis.
    pub fn build(self) -> Result<PcaColorAugmentation> {
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(Error::Configuration(format!(
                "sigma must be finite and non-negative (got {})",
                self.sigma
            )));
        }
        if self.color_channels.is_empty() {
            return Err(Error::Configuration("no colour channels configured".into()));
        }
        for (i, c) in self.color_channels.iter().enumerate() {
            if self.color_channels[..i].contains(c) {
                return Err(Error::Configuration(format!(
                    "colour channel {} listed more than once",
                    c
                )));
            }
        }
        let color_axis = self.layout.index_of(AxisRole::Channel)?;
        debug!(layout = %self.layout, color_axis, channels = ?self.color_channels, "resolved colour axis");

        Ok(PcaColorAugmentation {
            config: PcaConfig {
                sigma: self.sigma,
                layout: self.layout,
                color_axis,
                color_channels: self.color_channels,
            },
            basis: None,
            rng: get_rng(self.seed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    /// 2-channel HWC corpus whose colours lie on the line (t, 2t).
    fn line_corpus() -> Vec<ArrayD<f32>> {
        (0..3)
            .map(|i| {
                ArrayD::from_shape_fn(IxDyn(&[4, 5, 2]), |idx| {
                    let t = (i * 20 + idx[0] * 5 + idx[1]) as f32 / 10.0;
                    if idx[2] == 0 {
                        t
                    } else {
                        2.0 * t
                    }
                })
            })
            .collect()
    }

    fn two_channel() -> PcaColorAugmentationBuilder {
        PcaColorAugmentation::builder()
            .color_channels(vec![0, 1])
            .image_layout(Layout::chw())
    }

    #[test]
    fn test_apply_before_train_fails() {
        let mut pca = PcaColorAugmentation::builder().build().unwrap();
        let err = pca
            .apply(ArrayD::<f32>::zeros(IxDyn(&[1, 3, 2, 2])), ArrayD::<u8>::zeros(IxDyn(&[1, 2, 2])))
            .unwrap_err();
        assert!(matches!(err, Error::NotFitted(_)));
        assert!(pca.color_offset_with_rng(&mut get_rng(Some(0))).is_err());
    }

    #[test]
    fn test_train_recovers_principal_axis() {
        let mut pca = two_channel().build().unwrap();
        let basis = pca.train(&line_corpus(), &Layout::hwc()).unwrap().clone();

        assert_eq!(basis.dim(), 2);
        // mean of t over 0..60 / 10 = 2.95
        assert!((basis.mean()[0] - 2.95).abs() < 1e-5);
        assert!((basis.mean()[1] - 5.9).abs() < 1e-5);

        // Rank one: all variance on the first axis, direction (1, 2)/sqrt(5).
        let ev = basis.sqrt_eigenvalues();
        assert!(ev[0] > 1.0);
        assert!(ev[1] < 1e-3);
        let axis = basis.eigenvectors().column(0);
        let expected = [1.0 / 5f64.sqrt(), 2.0 / 5f64.sqrt()];
        let sign = axis[0].signum();
        assert!((sign * axis[0] - expected[0]).abs() < 1e-6);
        assert!((sign * axis[1] - expected[1]).abs() < 1e-6);

        // Population covariance: var(t) = (60^2 - 1) / 12 / 100.
        let var_t = (3600.0 - 1.0) / 12.0 / 100.0;
        assert!((basis.covariance()[(0, 0)] - var_t).abs() < 1e-4);
        assert!((basis.covariance()[(0, 1)] - 2.0 * var_t).abs() < 1e-4);
    }

    #[test]
    fn test_offset_lies_on_principal_axis() {
        let mut pca = two_channel().sigma(0.5).seed(5).build().unwrap();
        pca.train(&line_corpus(), &Layout::hwc()).unwrap();

        let image = Array::from_elem(IxDyn(&[2, 3, 3]), 1.0f32);
        let (out, _) = pca.apply(image, ArrayD::<u8>::zeros(IxDyn(&[3, 3]))).unwrap();
        let d0 = out[[0, 0, 0]] - 1.0;
        let d1 = out[[1, 0, 0]] - 1.0;
        assert!(d0.abs() > 1e-6);
        assert!((d1 - 2.0 * d0).abs() < 1e-3);
        // One offset for the whole image.
        assert!(out.index_axis(Axis(0), 0).iter().all(|&v| (v - 1.0 - d0).abs() < 1e-6));
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let mut pca = two_channel().sigma(0.0).build().unwrap();
        pca.train(&line_corpus(), &Layout::hwc()).unwrap();
        let image = ArrayD::from_shape_fn(IxDyn(&[2, 4, 4]), |idx| (idx[1] + idx[2]) as f32);
        let labels = ArrayD::from_shape_fn(IxDyn(&[4, 4]), |idx| (idx[0] * 4 + idx[1]) as u16);
        let (out, out_labels) = pca.apply(image.clone(), labels.clone()).unwrap();
        assert_eq!(out, image);
        assert_eq!(out_labels, labels);
    }

    #[test]
    fn test_single_colour_corpus_has_zero_spread() {
        let mut pca = PcaColorAugmentation::builder().sigma(1.0).seed(2).build().unwrap();
        let corpus = vec![Array::from_elem(IxDyn(&[3, 6, 6]), 0.25f32); 2];
        let basis = pca.train(&corpus, &Layout::chw()).unwrap();
        assert!(basis.covariance().iter().all(|&v| v == 0.0));
        assert!(basis.sqrt_eigenvalues().iter().all(|&v| v.abs() < 1e-12));

        let image = Array::from_elem(IxDyn(&[1, 3, 2, 2]), 0.5f32);
        let (out, _) = pca.apply(image, ArrayD::<u8>::zeros(IxDyn(&[1, 2, 2]))).unwrap();
        assert!(out.iter().all(|&v| (v - 0.5).abs() < 1e-9));
    }

    #[test]
    fn test_only_colour_channels_change() {
        let mut pca = PcaColorAugmentation::builder()
            .color_channels(vec![0, 2])
            .sigma(1.0)
            .seed(8)
            .build()
            .unwrap();
        let corpus: Vec<ArrayD<f32>> = (0..2)
            .map(|i| ArrayD::from_shape_fn(IxDyn(&[3, 3, 4]), |idx| (i + idx[0] * idx[1] + idx[2]) as f32))
            .collect();
        pca.train(&corpus, &Layout::hwc()).unwrap();

        let image = Array::from_elem(IxDyn(&[2, 4, 3, 3]), 0.0f32);
        let (out, _) = pca.apply(image, ArrayD::<u8>::zeros(IxDyn(&[2, 3, 3]))).unwrap();
        assert!(out.index_axis(Axis(1), 1).iter().all(|&v| v == 0.0));
        assert!(out.index_axis(Axis(1), 3).iter().all(|&v| v == 0.0));
        assert!(out.index_axis(Axis(1), 0).iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_train_validation() {
        let mut pca = PcaColorAugmentation::builder().build().unwrap();
        assert!(matches!(
            pca.train(&[], &Layout::hwc()),
            Err(Error::EmptyInput(_))
        ));
        assert!(matches!(
            pca.train(&[ArrayD::zeros(IxDyn(&[4, 4, 2]))], &Layout::hwc()),
            Err(Error::InvalidDimensions(_))
        ));
        assert!(matches!(
            pca.train(&[ArrayD::zeros(IxDyn(&[4, 4]))], &Layout::hwc()),
            Err(Error::InvalidDimensions(_))
        ));
        assert!(matches!(
            pca.train(&[ArrayD::zeros(IxDyn(&[4, 4]))], &Layout::hw()),
            Err(Error::Configuration(_))
        ));
        assert!(!pca.is_trained());
    }

    #[test]
    fn test_builder_validation() {
        assert!(PcaColorAugmentation::builder().sigma(-0.1).build().is_err());
        assert!(PcaColorAugmentation::builder().color_channels(vec![]).build().is_err());
        assert!(PcaColorAugmentation::builder().color_channels(vec![1, 1]).build().is_err());
        assert!(PcaColorAugmentation::builder()
            .image_layout(Layout::bhw())
            .build()
            .is_err());
    }

    #[test]
    fn test_with_basis() {
        let basis = PcaBasis::new(
            vec![0.5, 0.5],
            DMatrix::identity(2, 2),
            vec![4.0, 1.0],
        )
        .unwrap();
        assert_eq!(basis.sqrt_eigenvalues().as_slice(), &[2.0, 1.0]);
        assert_eq!(basis.covariance()[(0, 0)], 4.0);

        let pca = two_channel().build().unwrap().with_basis(basis.clone()).unwrap();
        assert!(pca.is_trained());
        assert!(PcaColorAugmentation::builder().build().unwrap().with_basis(basis).is_err());

        assert!(PcaBasis::new(vec![0.0], DMatrix::identity(2, 2), vec![1.0]).is_err());
        assert!(PcaBasis::new(vec![0.0], DMatrix::identity(1, 1), vec![-1.0]).is_err());
    }

    #[test]
    fn test_draws_are_reproducible() {
        let corpus = line_corpus();
        let run = || {
            let mut pca = two_channel().seed(77).build().unwrap();
            pca.train(&corpus, &Layout::hwc()).unwrap();
            let image = Array::from_elem(IxDyn(&[2, 2, 2]), 0.0f32);
            pca.apply(image, ArrayD::<u8>::zeros(IxDyn(&[2, 2]))).unwrap().0
        };
        assert_eq!(run(), run());
    }

    fn assert_same_stream(a: &mut ChaCha8Rng, b: &mut ChaCha8Rng) {
        for _ in 0..4 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_apply_draws_one_normal_per_colour_channel() {
        let mut pca = two_channel().sigma(0.5).build().unwrap();
        pca.train(&line_corpus(), &Layout::hwc()).unwrap();

        let mut used = get_rng(Some(31));
        let mut twin = used.clone();
        let image = Array::from_elem(IxDyn(&[2, 3, 3]), 1.0f32);
        pca.apply_with_rng(image, ArrayD::<u8>::zeros(IxDyn(&[3, 3])), &mut used)
            .unwrap();

        let normal = Normal::new(0.0, 0.5).unwrap();
        for _ in 0..2 {
            let _: f64 = twin.sample(normal);
        }
        assert_same_stream(&mut used, &mut twin);
    }

    #[test]
    fn test_failed_apply_draws_nothing() {
        let untrained = two_channel().build().unwrap();
        let mut used = get_rng(Some(32));
        let mut twin = used.clone();
        let image = Array::from_elem(IxDyn(&[2, 3, 3]), 1.0f32);
        assert!(untrained
            .apply_with_rng(image.clone(), ArrayD::<u8>::zeros(IxDyn(&[3, 3])), &mut used)
            .is_err());
        assert_same_stream(&mut used.clone(), &mut twin.clone());

        let mut pca = PcaColorAugmentation::builder()
            .image_layout(Layout::chw())
            .build()
            .unwrap();
        pca.train(&[Array::from_elem(IxDyn(&[2, 2, 3]), 0.5f32)], &Layout::hwc())
            .unwrap();
        // Two channels where three colours are configured.
        let err = pca
            .apply_with_rng(image, ArrayD::<u8>::zeros(IxDyn(&[3, 3])), &mut used)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions(_)));
        assert_same_stream(&mut used, &mut twin);
    }

    #[test]
    fn test_non_finite_training_pixels_rejected() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let mut image = Array::from_elem(IxDyn(&[2, 2, 3]), 0.5f32);
            image[[1, 0, 1]] = bad;
            let mut pca = PcaColorAugmentation::builder().build().unwrap();
            let err = pca.train(&[image], &Layout::hwc()).unwrap_err();
            assert!(matches!(err, Error::InvalidValue(_)), "{} gave {:?}", bad, err);
            assert!(err.to_string().contains("channel 1"));
            assert!(!pca.is_trained());
        }
    }

    #[test]
    fn test_basis_new_rejects_non_finite() {
        assert!(matches!(
            PcaBasis::new(vec![0.0, f64::NAN], DMatrix::identity(2, 2), vec![1.0, 1.0]),
            Err(Error::Configuration(_))
        ));
        let mut axes = DMatrix::identity(2, 2);
        axes[(1, 0)] = f64::INFINITY;
        assert!(matches!(
            PcaBasis::new(vec![0.0, 0.0], axes, vec![1.0, 1.0]),
            Err(Error::Configuration(_))
        ));
    }
}
