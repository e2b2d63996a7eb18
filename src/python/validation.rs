//! Validation helpers for Python boundary.
//!
//! Python callers pass layouts and axis roles as short strings; these are
//! parsed here so errors surface as `ValueError` with the argument name.

use pyo3::exceptions::{PyRuntimeError, PyValueError};

use crate::axis::{AxisRole, Layout};
use crate::error::Error as SegaugError;

/// Convert a segaug Error to the appropriate Python exception.
pub fn to_py_err(e: SegaugError, context: &str) -> pyo3::PyErr {
    match &e {
        SegaugError::NotFitted(_) => PyRuntimeError::new_err(format!("{}: {}", context, e)),
        SegaugError::Configuration(msg)
        | SegaugError::InvalidDimensions(msg)
        | SegaugError::ShapeMismatch(msg)
        | SegaugError::InvalidValue(msg)
        | SegaugError::EmptyInput(msg) => PyValueError::new_err(format!("{}: {}", context, msg)),
        SegaugError::TransformError { operation, reason } => {
            PyValueError::new_err(format!("{}: {} failed: {}", context, operation, reason))
        }
    }
}

/// Validate probability value (0.0 to 1.0).
pub fn validate_probability(p: f64, param_name: &str) -> pyo3::PyResult<()> {
    if !p.is_finite() {
        return Err(PyValueError::new_err(format!(
            "{}: probability must be finite (got {})",
            param_name, p
        )));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(PyValueError::new_err(format!(
            "{}: probability must be between 0.0 and 1.0 (got {})",
            param_name, p
        )));
    }
    Ok(())
}

/// Parse a layout string such as `"bchw"`.
pub fn parse_layout(value: &str, param_name: &str) -> pyo3::PyResult<Layout> {
    value
        .parse::<Layout>()
        .map_err(|e| to_py_err(e, param_name))
}

/// Parse a single axis role such as `"w"`.
pub fn parse_role(value: &str, param_name: &str) -> pyo3::PyResult<AxisRole> {
    let layout = parse_layout(value, param_name)?;
    match layout.roles() {
        [role] => Ok(*role),
        _ => Err(PyValueError::new_err(format!(
            "{}: expected a single axis symbol (b, c, d, h or w), got '{}'",
            param_name, value
        ))),
    }
}
