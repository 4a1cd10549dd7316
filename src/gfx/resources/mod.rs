//! GPU resources: textures and materials

pub mod material;
pub mod texture_resource;

pub use material::{material_bind_group_layout, GpuMaterial, Material, MaterialUniform};
pub use texture_resource::TextureResource;
