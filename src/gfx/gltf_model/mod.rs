//! glTF 2.0 models
//!
//! [`graph`] holds the CPU-side node hierarchy and its traversal into draw
//! calls; [`model`] owns the uploaded buffers, textures and primitives.

pub mod graph;
pub mod model;

pub use graph::{traverse, DrawCall, DrawKind, ModelGraph};
pub use model::GpuModel;
