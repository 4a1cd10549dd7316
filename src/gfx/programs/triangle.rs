//! Unlit vertex-colored triangle

use crate::{
    error::Result,
    gfx::rendering::{PipelineConfig, PipelineManager, VertexLayout},
};

pub struct TriangleProgram {
    pipeline: wgpu::RenderPipeline,
}

impl TriangleProgram {
    pub const SHADER: &'static str = "triangle";

    /// Position is read from location 0 and color from location 1, in
    /// whatever buffers `vertex_layouts` describe.
    pub fn new(
        manager: &PipelineManager,
        color_format: wgpu::TextureFormat,
        vertex_layouts: Vec<VertexLayout>,
    ) -> Result<Self> {
        let pipeline = manager.create_pipeline(
            &PipelineConfig::default_with_shader(Self::SHADER)
                .with_label("Triangle")
                .with_vertex_layouts(vertex_layouts)
                .with_color_formats(&[color_format]),
        )?;
        Ok(Self { pipeline })
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
    }
}
