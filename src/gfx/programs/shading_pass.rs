//! Deferred lighting pass
//!
//! Bind groups: 0 lighting, 1 the five G-buffer color channels followed by
//! the shadow map and its comparison sampler.

use crate::{
    error::Result,
    gfx::{
        lighting::LightingUniform,
        rendering::{ColorTarget, GBuffer, GBufferTextureType, PipelineConfig, PipelineManager},
        resources::TextureResource,
    },
    wgpu_utils::{
        binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    },
};

use super::{fullscreen::TargetPipelines, uniforms::LightingUniforms};

fn color_channels() -> impl Iterator<Item = GBufferTextureType> {
    GBufferTextureType::ALL
        .into_iter()
        .filter(|channel| *channel != GBufferTextureType::Depth)
}

pub struct ShadingPassProgram {
    pipelines: TargetPipelines,
    lighting: LightingUniforms,
    inputs_layout: BindGroupLayoutWithDesc,
}

impl ShadingPassProgram {
    pub const SHADER: &'static str = "shading_pass";

    pub fn new(manager: &PipelineManager, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let device = manager.device();
        let lighting = LightingUniforms::new(device);

        let inputs_layout = color_channels()
            .fold(BindGroupLayoutBuilder::new(), |builder, _| {
                builder.next_binding_fragment(binding_types::texture_2d_unfilterable())
            })
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(
                wgpu::SamplerBindingType::Comparison,
            ))
            .create(device, "Shading Pass Inputs Layout");

        let pipelines = TargetPipelines::new(
            manager,
            PipelineConfig::default_with_shader(Self::SHADER)
                .with_label("Shading Pass")
                .with_bind_group_layouts(vec![
                    lighting.layout().clone(),
                    inputs_layout.layout.clone(),
                ]),
            surface_format,
        )?;

        Ok(Self {
            pipelines,
            lighting,
            inputs_layout,
        })
    }

    pub fn create_inputs_bind_group(
        &self,
        device: &wgpu::Device,
        gbuffer: &GBuffer,
        shadow_map: &TextureResource,
    ) -> wgpu::BindGroup {
        color_channels()
            .fold(BindGroupBuilder::new(&self.inputs_layout), |builder, channel| {
                builder.texture(&gbuffer.texture(channel).view)
            })
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .create(device, "Shading Pass Inputs")
    }

    pub fn set_lighting_uniforms(&mut self, queue: &wgpu::Queue, lighting: LightingUniform) {
        self.lighting.set(queue, lighting);
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        target: ColorTarget,
        inputs: &wgpu::BindGroup,
    ) {
        pass.set_pipeline(self.pipelines.get(target));
        self.lighting.bind(pass, 0);
        pass.set_bind_group(1, inputs, &[]);
        pass.draw(0..3, 0..1);
    }
}
