//! Bind group builders, uniform buffers and validation error scopes

pub mod binding_builder;
pub mod binding_types;
pub mod error_scope;
pub mod uniform_buffer;

pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use error_scope::with_validation_scope;
pub use uniform_buffer::{DynamicUniformBuffer, UniformBuffer};
