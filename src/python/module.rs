//! Python module definition.

use pyo3::prelude::*;

use super::augmentation;

#[pymodule]
fn _segaug(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<augmentation::PyFlipAugmentation>()?;
    m.add_class::<augmentation::PyScaleAugmentation>()?;
    m.add_class::<augmentation::PyPcaColorAugmentation>()?;
    Ok(())
}
