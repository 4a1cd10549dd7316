//! Phong materials and their bind groups
//!
//! Every mesh program binds the material at group 2: a uniform with the
//! ambient, diffuse and glossy coefficients followed by the diffuse texture
//! and its sampler.

use std::sync::Arc;

use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    UniformBuffer,
};

use super::texture_resource::TextureResource;

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    /// rgb: glossy color, a: shininess exponent
    pub glossy_shininess: [f32; 4],
}

/// Material coefficients as loaded from MTL files or set by the GUI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub glossy: [f32; 3],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [0.0; 3],
            diffuse: [1.0; 3],
            glossy: [0.0; 3],
            shininess: 1.0,
        }
    }
}

impl Material {
    /// Flat diffuse color, used for the forward renderer's instances.
    pub fn diffuse(color: [f32; 3]) -> Self {
        Self {
            diffuse: color,
            ..Self::default()
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        let [ar, ag, ab] = self.ambient;
        let [dr, dg, db] = self.diffuse;
        let [gr, gg, gb] = self.glossy;
        MaterialUniform {
            ambient: [ar, ag, ab, 1.0],
            diffuse: [dr, dg, db, 1.0],
            glossy_shininess: [gr, gg, gb, self.shininess],
        }
    }
}

pub fn material_bind_group_layout(device: &wgpu::Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_fragment(binding_types::uniform())
        .next_binding_fragment(binding_types::texture_2d())
        .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
        .create(device, "Material Bind Group Layout")
}

/// A material uploaded to the GPU together with its diffuse texture.
pub struct GpuMaterial {
    uniform: UniformBuffer<MaterialUniform>,
    bind_group: wgpu::BindGroup,
    texture: Arc<TextureResource>,
}

impl GpuMaterial {
    pub fn new(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        material: &Material,
        texture: Arc<TextureResource>,
        label: &str,
    ) -> Self {
        let uniform = UniformBuffer::new_with_data(device, &material.uniform());
        let bind_group = BindGroupBuilder::new(layout)
            .resource(uniform.binding_resource())
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, label);

        Self {
            uniform,
            bind_group,
            texture,
        }
    }

    /// Re-uploads the coefficients; unchanged values are not written.
    pub fn update(&mut self, queue: &wgpu::Queue, material: &Material) {
        self.uniform.update_content(queue, material.uniform());
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn texture(&self) -> &TextureResource {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_packs_shininess_with_glossy_color() {
        let material = Material {
            ambient: [0.1, 0.2, 0.3],
            diffuse: [0.5; 3],
            glossy: [0.9, 0.8, 0.7],
            shininess: 32.0,
        };
        let uniform = material.uniform();
        assert_eq!(uniform.glossy_shininess, [0.9, 0.8, 0.7, 32.0]);
        assert_eq!(uniform.ambient, [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn flat_color_material_has_no_highlights() {
        let material = Material::diffuse([1.0, 0.0, 0.0]);
        assert_eq!(material.diffuse, [1.0, 0.0, 0.0]);
        assert_eq!(material.glossy, [0.0; 3]);
    }
}
