//! Augmentation classes for Python bindings.
//!
//! Each class owns its own seeded random source, mirroring the Rust types.
//! Images are float32 arrays, label masks int64 arrays.

use numpy::PyReadonlyArrayDyn;
use pyo3::prelude::*;

use super::conversion::{pair_to_numpy, to_owned_array, PyPair};
use super::validation::{parse_layout, parse_role, to_py_err, validate_probability};
use crate::transforms::{FlipAugmentation, PcaColorAugmentation, ScaleAugmentation};

/// Randomly mirror an image and its label mask along the same axis.
///
/// Args:
///     chance: Probability of flipping (default: 0.5)
///     axis: Axis symbol to mirror: "w", "h" or "d" (default: "w")
///     image_layout: Axis layout of the image (default: "bchw")
///     semantic_layout: Axis layout of the labels (default: "bhw")
///     seed: Optional random seed for reproducibility
///
/// Example:
///     >>> flip = segaug.FlipAugmentation(chance=0.5, seed=0)
///     >>> image, labels = flip.apply(image, labels)
#[pyclass(name = "FlipAugmentation")]
pub struct PyFlipAugmentation {
    inner: FlipAugmentation,
}

#[pymethods]
impl PyFlipAugmentation {
    #[new]
    #[pyo3(signature = (chance=0.5, axis="w", image_layout="bchw", semantic_layout="bhw", seed=None))]
    fn new(
        chance: f64,
        axis: &str,
        image_layout: &str,
        semantic_layout: &str,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        validate_probability(chance, "FlipAugmentation")?;
        let inner = FlipAugmentation::builder()
            .chance(chance)
            .axis(parse_role(axis, "axis")?)
            .image_layout(parse_layout(image_layout, "image_layout")?)
            .semantic_layout(parse_layout(semantic_layout, "semantic_layout")?)
            .seed_opt(seed)
            .build()
            .map_err(|e| to_py_err(e, "FlipAugmentation"))?;
        Ok(Self { inner })
    }

    /// Flip (or not) the image and labels together.
    ///
    /// Returns:
    ///     Tuple of (image, labels)
    fn apply<'py>(
        &mut self,
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, f32>,
        semantic_image: PyReadonlyArrayDyn<'py, i64>,
    ) -> PyResult<PyPair<'py>> {
        let pair = self
            .inner
            .apply(to_owned_array(&image), to_owned_array(&semantic_image))
            .map_err(|e| to_py_err(e, "FlipAugmentation.apply"))?;
        Ok(pair_to_numpy(py, pair))
    }

    fn __repr__(&self) -> String {
        let config = self.inner.config();
        format!(
            "FlipAugmentation(chance={}, axis={})",
            config.chance(),
            config.role()
        )
    }
}

/// Randomly zoom an image and its label mask by one isotropic factor.
///
/// The factor is sampled log-uniformly in [1/min_scale, max_scale] and
/// applied to the height and width axes with nearest-neighbour lookup.
///
/// Args:
///     min_scale: Lower bound is 1/min_scale (default: 1.2)
///     max_scale: Upper bound of the factor (default: 1.2)
///     image_layout: Axis layout of the image (default: "bchw")
///     semantic_layout: Axis layout of the labels (default: "bhw")
///     depth_channels: Image channels holding depth, divided by the factor (default: None)
///     depth_axis: Axis symbol indexing the depth channels (default: "c")
///     seed: Optional random seed for reproducibility
#[pyclass(name = "ScaleAugmentation")]
pub struct PyScaleAugmentation {
    inner: ScaleAugmentation,
}

#[pymethods]
impl PyScaleAugmentation {
    #[new]
    #[pyo3(signature = (
        min_scale=1.2,
        max_scale=1.2,
        image_layout="bchw",
        semantic_layout="bhw",
        depth_channels=None,
        depth_axis="c",
        seed=None
    ))]
    fn new(
        min_scale: f64,
        max_scale: f64,
        image_layout: &str,
        semantic_layout: &str,
        depth_channels: Option<Vec<usize>>,
        depth_axis: &str,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let mut builder = ScaleAugmentation::builder()
            .min_scale(min_scale)
            .max_scale(max_scale)
            .image_layout(parse_layout(image_layout, "image_layout")?)
            .semantic_layout(parse_layout(semantic_layout, "semantic_layout")?)
            .depth_role(parse_role(depth_axis, "depth_axis")?)
            .seed_opt(seed);
        if let Some(channels) = depth_channels {
            builder = builder.depth_channels(channels);
        }
        let inner = builder
            .build()
            .map_err(|e| to_py_err(e, "ScaleAugmentation"))?;
        Ok(Self { inner })
    }

    /// Zoom the image and labels by the same random factor.
    ///
    /// Returns:
    ///     Tuple of (image, labels)
    fn apply<'py>(
        &mut self,
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, f32>,
        semantic_image: PyReadonlyArrayDyn<'py, i64>,
    ) -> PyResult<PyPair<'py>> {
        let pair = self
            .inner
            .apply(to_owned_array(&image), to_owned_array(&semantic_image))
            .map_err(|e| to_py_err(e, "ScaleAugmentation.apply"))?;
        Ok(pair_to_numpy(py, pair))
    }

    fn __repr__(&self) -> String {
        let (lo, hi) = self.inner.config().factor_range();
        format!("ScaleAugmentation(factor_range=({:.4}, {:.4}))", lo, hi)
    }
}

/// Colour jitter along the principal components of a training corpus.
///
/// Args:
///     sigma: Noise magnitude (default: 0.1)
///     image_layout: Axis layout of images passed to apply (default: "bchw")
///     color_channels: Channel indices treated as colour (default: [0, 1, 2])
///     seed: Optional random seed for reproducibility
///
/// Example:
///     >>> pca = segaug.PcaColorAugmentation(sigma=0.1)
///     >>> pca.train(images, "hwc")
///     >>> image, labels = pca.apply(image, labels)
#[pyclass(name = "PcaColorAugmentation")]
pub struct PyPcaColorAugmentation {
    inner: PcaColorAugmentation,
}

#[pymethods]
impl PyPcaColorAugmentation {
    #[new]
    #[pyo3(signature = (sigma=0.1, image_layout="bchw", color_channels=None, seed=None))]
    fn new(
        sigma: f64,
        image_layout: &str,
        color_channels: Option<Vec<usize>>,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let mut builder = PcaColorAugmentation::builder()
            .sigma(sigma)
            .image_layout(parse_layout(image_layout, "image_layout")?)
            .seed_opt(seed);
        if let Some(channels) = color_channels {
            builder = builder.color_channels(channels);
        }
        let inner = builder
            .build()
            .map_err(|e| to_py_err(e, "PcaColorAugmentation"))?;
        Ok(Self { inner })
    }

    /// Learn the colour basis from a list of images.
    ///
    /// Args:
    ///     color_images: List of float32 arrays sharing one layout
    ///     layout: Axis layout of the training images, e.g. "hwc"
    fn train<'py>(
        &mut self,
        py: Python<'py>,
        color_images: Vec<PyReadonlyArrayDyn<'py, f32>>,
        layout: &str,
    ) -> PyResult<()> {
        let layout = parse_layout(layout, "layout")?;
        let images: Vec<_> = color_images.iter().map(to_owned_array).collect();
        let inner = &mut self.inner;
        py.allow_threads(move || inner.train(&images, &layout).map(|_| ()))
            .map_err(|e| to_py_err(e, "PcaColorAugmentation.train"))
    }

    /// Shift the colour channels of the image; labels are returned unchanged.
    ///
    /// Raises:
    ///     RuntimeError: If train() has not been called
    fn apply<'py>(
        &mut self,
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, f32>,
        semantic_image: PyReadonlyArrayDyn<'py, i64>,
    ) -> PyResult<PyPair<'py>> {
        let pair = self
            .inner
            .apply(to_owned_array(&image), to_owned_array(&semantic_image))
            .map_err(|e| to_py_err(e, "PcaColorAugmentation.apply"))?;
        Ok(pair_to_numpy(py, pair))
    }

    /// Whether a colour basis has been fitted.
    #[getter]
    fn is_trained(&self) -> bool {
        self.inner.is_trained()
    }

    /// Mean colour of the training corpus, or None before training.
    #[getter]
    fn mean(&self) -> Option<Vec<f64>> {
        self.inner.basis().map(|b| b.mean().as_slice().to_vec())
    }

    /// Standard deviation along each principal axis, or None before training.
    #[getter]
    fn sqrt_eigenvalues(&self) -> Option<Vec<f64>> {
        self.inner
            .basis()
            .map(|b| b.sqrt_eigenvalues().as_slice().to_vec())
    }

    fn __repr__(&self) -> String {
        format!(
            "PcaColorAugmentation(sigma={}, color_channels={:?}, trained={})",
            self.inner.config().sigma(),
            self.inner.config().color_channels(),
            self.inner.is_trained()
        )
    }
}
