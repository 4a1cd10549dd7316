//! Forward program of the glTF viewer
//!
//! glTF primitives differ in topology and in how their attributes are laid
//! out in the source buffers, so pipelines are built per distinct
//! combination and cached. Bind groups: 0 lighting, 1 per-draw transforms,
//! 2 material.

use std::collections::HashMap;

use crate::{
    error::{GlintError, Result},
    gfx::{
        camera::ObjectUniform,
        lighting::LightingUniform,
        rendering::{DepthConfig, PipelineConfig, PipelineManager, VertexLayout},
        resources::{material_bind_group_layout, TextureResource},
    },
    wgpu_utils::BindGroupLayoutWithDesc,
};

use super::uniforms::{LightingUniforms, ObjectUniforms};

pub const MATERIAL_GROUP: u32 = 2;

/// Everything about a primitive that changes its pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimitivePipelineKey {
    pub topology: wgpu::PrimitiveTopology,
    pub strip_index_format: Option<wgpu::IndexFormat>,
    pub vertex_layouts: Vec<VertexLayout>,
}

pub struct GltfForwardProgram {
    lighting: LightingUniforms,
    objects: ObjectUniforms,
    material_layout: BindGroupLayoutWithDesc,
    color_format: wgpu::TextureFormat,
    pipelines: HashMap<PrimitivePipelineKey, wgpu::RenderPipeline>,
}

impl GltfForwardProgram {
    pub const SHADER: &'static str = "forward";

    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        Self {
            lighting: LightingUniforms::new(device),
            objects: ObjectUniforms::new(device, 64),
            material_layout: material_bind_group_layout(device),
            color_format,
            pipelines: HashMap::new(),
        }
    }

    pub fn material_layout(&self) -> &BindGroupLayoutWithDesc {
        &self.material_layout
    }

    /// Builds the pipeline for `key` unless it is already cached.
    pub fn prepare_pipeline(
        &mut self,
        manager: &PipelineManager,
        key: &PrimitivePipelineKey,
    ) -> Result<()> {
        if self.pipelines.contains_key(key) {
            return Ok(());
        }

        let pipeline = manager.create_pipeline(
            &PipelineConfig::default_with_shader(Self::SHADER)
                .with_label(&format!("glTF {:?}", key.topology))
                .with_bind_group_layouts(vec![
                    self.lighting.layout().clone(),
                    self.objects.layout().clone(),
                    self.material_layout.layout.clone(),
                ])
                .with_vertex_layouts(key.vertex_layouts.clone())
                .with_primitive_topology(key.topology)
                .with_strip_index_format(key.strip_index_format)
                .with_depth(DepthConfig::less(TextureResource::DEPTH_FORMAT))
                .with_color_formats(&[self.color_format]),
        )?;
        log::debug!("Created pipeline for {key:?}");
        self.pipelines.insert(key.clone(), pipeline);
        Ok(())
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn set_lighting_uniforms(&mut self, queue: &wgpu::Queue, lighting: LightingUniform) {
        self.lighting.set(queue, lighting);
    }

    pub fn set_object_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        objects: &[ObjectUniform],
    ) {
        self.objects.upload(device, queue, objects);
    }

    /// Binds the frame-wide state shared by every primitive.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.lighting.bind(pass, 0);
    }

    pub fn bind_primitive(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        key: &PrimitivePipelineKey,
        slot: usize,
    ) -> Result<()> {
        let pipeline = self.pipelines.get(key).ok_or_else(|| GlintError::Gpu {
            label: format!("glTF {:?}", key.topology),
            message: "pipeline was not prepared at load time".to_owned(),
        })?;
        pass.set_pipeline(pipeline);
        self.objects.bind(pass, 1, slot);
        Ok(())
    }
}
