//! Shader programs
//!
//! Each program owns its pipelines and the bind groups behind its uniforms
//! and exposes typed setters for them. WGSL sources are resolved through
//! [`ShaderLibrary`](crate::gfx::rendering::ShaderLibrary) and must be loaded
//! into the [`PipelineManager`](crate::gfx::rendering::PipelineManager)
//! before a program is created.

pub mod directional_shadow_map;
pub mod forward;
pub mod fullscreen;
pub mod gamma_correct;
pub mod geometry_pass;
pub mod gltf_forward;
pub mod shading_pass;
pub mod triangle;
pub mod uniforms;

pub use directional_shadow_map::DirectionalShadowMapProgram;
pub use forward::ForwardProgram;
pub use fullscreen::{TextureDisplayProgram, BEAUTY_FORMAT};
pub use gamma_correct::GammaCorrectProgram;
pub use geometry_pass::GeometryPassProgram;
pub use gltf_forward::{GltfForwardProgram, PrimitivePipelineKey};
pub use shading_pass::ShadingPassProgram;
pub use triangle::TriangleProgram;
