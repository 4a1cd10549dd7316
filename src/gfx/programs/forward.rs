//! Forward Blinn-Phong program
//!
//! Bind groups: 0 lighting, 1 per-draw transforms, 2 material.

use crate::{
    error::Result,
    gfx::{
        camera::ObjectUniform,
        lighting::LightingUniform,
        rendering::{DepthConfig, PipelineConfig, PipelineManager, VertexLayout},
        resources::{material_bind_group_layout, TextureResource},
        scene::Vertex3D,
    },
    wgpu_utils::BindGroupLayoutWithDesc,
};

use super::uniforms::{LightingUniforms, ObjectUniforms};

pub const MATERIAL_GROUP: u32 = 2;

pub struct ForwardProgram {
    pipeline: wgpu::RenderPipeline,
    lighting: LightingUniforms,
    objects: ObjectUniforms,
    material_layout: BindGroupLayoutWithDesc,
}

impl ForwardProgram {
    pub const SHADER: &'static str = "forward";

    pub fn new(manager: &PipelineManager, color_format: wgpu::TextureFormat) -> Result<Self> {
        let device = manager.device();
        let lighting = LightingUniforms::new(device);
        let objects = ObjectUniforms::new(device, 4);
        let material_layout = material_bind_group_layout(device);

        let pipeline = manager.create_pipeline(
            &PipelineConfig::default_with_shader(Self::SHADER)
                .with_label("Forward")
                .with_bind_group_layouts(vec![
                    lighting.layout().clone(),
                    objects.layout().clone(),
                    material_layout.layout.clone(),
                ])
                .with_vertex_layouts(vec![VertexLayout::from_desc(&Vertex3D::desc())])
                .with_depth(DepthConfig::less(TextureResource::DEPTH_FORMAT))
                .with_color_formats(&[color_format]),
        )?;

        Ok(Self {
            pipeline,
            lighting,
            objects,
            material_layout,
        })
    }

    pub fn material_layout(&self) -> &BindGroupLayoutWithDesc {
        &self.material_layout
    }

    pub fn set_lighting_uniforms(&mut self, queue: &wgpu::Queue, lighting: LightingUniform) {
        self.lighting.set(queue, lighting);
    }

    /// One entry per draw recorded this frame, bound by index.
    pub fn set_object_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        objects: &[ObjectUniform],
    ) {
        self.objects.upload(device, queue, objects);
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        self.lighting.bind(pass, 0);
    }

    pub fn bind_object(&self, pass: &mut wgpu::RenderPass<'_>, slot: usize) {
        self.objects.bind(pass, 1, slot);
    }
}
