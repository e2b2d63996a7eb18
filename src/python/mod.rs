//! Python bindings for segaug.

pub mod augmentation;
pub mod conversion;
pub mod module;
pub mod validation;
