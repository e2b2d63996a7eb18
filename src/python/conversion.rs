//! Array conversion between numpy and ndarray.
//!
//! Images cross the boundary as `float32`, label masks as `int64`.

use ndarray::ArrayD;
use numpy::{IntoPyArray, PyArrayDyn, PyReadonlyArrayDyn};
use pyo3::prelude::*;

/// Python-side result of one augmentation call.
pub type PyPair<'py> = (Bound<'py, PyArrayDyn<f32>>, Bound<'py, PyArrayDyn<i64>>);

/// Copy a read-only numpy array into an owned ndarray.
///
/// Augmentations consume their inputs, so the caller's buffer is never mutated.
pub fn to_owned_array<T: numpy::Element + Clone>(array: &PyReadonlyArrayDyn<'_, T>) -> ArrayD<T> {
    array.as_array().to_owned()
}

/// Move an augmented pair into numpy arrays without copying.
pub fn pair_to_numpy(py: Python<'_>, pair: (ArrayD<f32>, ArrayD<i64>)) -> PyPair<'_> {
    let (image, semantics) = pair;
    (image.into_pyarray(py), semantics.into_pyarray(py))
}
