//! Depth-only render of the scene from the directional light

use cgmath::Matrix4;

use crate::{
    error::Result,
    gfx::{
        camera::{camera_utils::convert_matrix4_to_array, ObjectUniform},
        rendering::{DepthConfig, PipelineConfig, PipelineManager, VertexLayout},
        resources::TextureResource,
        scene::Vertex3D,
    },
};

use super::uniforms::ObjectUniforms;

pub struct DirectionalShadowMapProgram {
    pipeline: wgpu::RenderPipeline,
    objects: ObjectUniforms,
}

impl DirectionalShadowMapProgram {
    pub const SHADER: &'static str = "directional_shadow_map";

    pub fn new(manager: &PipelineManager) -> Result<Self> {
        let objects = ObjectUniforms::new(manager.device(), 1);

        let pipeline = manager.create_pipeline(
            &PipelineConfig::default_with_shader(Self::SHADER)
                .with_label("Directional Shadow Map")
                .with_bind_group_layouts(vec![objects.layout().clone()])
                .with_vertex_layouts(vec![VertexLayout::from_desc(&Vertex3D::desc())])
                .with_depth(DepthConfig::less(TextureResource::DEPTH_FORMAT))
                .with_vertex_only(),
        )?;

        Ok(Self { pipeline, objects })
    }

    /// `light_view_proj · model` is the only transform the shader reads.
    pub fn set_uniform_dir_light_view_proj_matrix(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        light_view_proj: Matrix4<f32>,
        model: Matrix4<f32>,
    ) {
        let object = ObjectUniform {
            model_view_proj: convert_matrix4_to_array(light_view_proj * model),
            ..Default::default()
        };
        self.objects.upload(device, queue, &[object]);
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        self.objects.bind(pass, 0, 0);
    }
}
