//! Deferred geometry pass: scene attributes into the G-buffer
//!
//! Bind groups: 0 per-draw transforms, 1 material.

use crate::{
    error::Result,
    gfx::{
        camera::ObjectUniform,
        rendering::{
            gbuffer::gbuffer_color_formats, DepthConfig, PipelineConfig, PipelineManager,
            VertexLayout,
        },
        resources::{material_bind_group_layout, TextureResource},
        scene::Vertex3D,
    },
    wgpu_utils::BindGroupLayoutWithDesc,
};

use super::uniforms::ObjectUniforms;

pub const MATERIAL_GROUP: u32 = 1;

pub struct GeometryPassProgram {
    pipeline: wgpu::RenderPipeline,
    objects: ObjectUniforms,
    material_layout: BindGroupLayoutWithDesc,
}

impl GeometryPassProgram {
    pub const SHADER: &'static str = "geometry_pass";

    pub fn new(manager: &PipelineManager) -> Result<Self> {
        let device = manager.device();
        let objects = ObjectUniforms::new(device, 1);
        let material_layout = material_bind_group_layout(device);

        let pipeline = manager.create_pipeline(
            &PipelineConfig::default_with_shader(Self::SHADER)
                .with_label("Geometry Pass")
                .with_bind_group_layouts(vec![
                    objects.layout().clone(),
                    material_layout.layout.clone(),
                ])
                .with_vertex_layouts(vec![VertexLayout::from_desc(&Vertex3D::desc())])
                .with_depth(DepthConfig::less(TextureResource::DEPTH_FORMAT))
                .with_color_formats(&gbuffer_color_formats()),
        )?;

        Ok(Self {
            pipeline,
            objects,
            material_layout,
        })
    }

    pub fn material_layout(&self) -> &BindGroupLayoutWithDesc {
        &self.material_layout
    }

    pub fn set_object_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        object: ObjectUniform,
    ) {
        self.objects.upload(device, queue, &[object]);
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        self.objects.bind(pass, 0, 0);
    }
}
