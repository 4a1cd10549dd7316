//! Validation error scopes around resource creation
//!
//! Without a scope wgpu reports validation errors through the uncaptured
//! error handler, which panics. Creation code runs inside a scope instead
//! and the error becomes a [`GlintError::Gpu`].

use crate::error::{GlintError, Result};

pub fn with_validation_scope<T>(
    device: &wgpu::Device,
    label: &str,
    create: impl FnOnce() -> T,
) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(error) => Err(GlintError::Gpu {
            label: label.to_owned(),
            message: error.to_string(),
        }),
    }
}
