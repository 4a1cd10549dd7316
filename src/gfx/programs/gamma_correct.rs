//! Gamma correction as a compute pass
//!
//! Each 16x16 workgroup corrects a 32x32 tile of the beauty image, two by
//! two pixels per invocation, and writes the result to a storage texture.

use crate::{
    error::Result,
    gfx::{rendering::PipelineManager, resources::TextureResource},
    wgpu_utils::{
        binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
        UniformBuffer,
    },
};

use super::fullscreen::BEAUTY_FORMAT;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct GammaUniform {
    exponent: f32,
    _padding: [f32; 3],
}

pub struct GammaCorrectProgram {
    pipeline: wgpu::ComputePipeline,
    uniform: UniformBuffer<GammaUniform>,
    layout: BindGroupLayoutWithDesc,
}

impl GammaCorrectProgram {
    pub const SHADER: &'static str = "gamma_correct";

    pub fn new(manager: &PipelineManager) -> Result<Self> {
        let device = manager.device();
        let uniform = UniformBuffer::new_with_data(
            device,
            &GammaUniform {
                exponent: 1.0,
                ..Default::default()
            },
        );
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_compute(binding_types::uniform())
            .next_binding_compute(binding_types::texture_2d_unfilterable())
            .next_binding_compute(binding_types::image_2d(
                BEAUTY_FORMAT,
                wgpu::StorageTextureAccess::WriteOnly,
            ))
            .create(device, "Gamma Correct Layout");

        let pipeline = manager.create_compute_pipeline(
            "Gamma Correct",
            Self::SHADER,
            "cs_main",
            &[&layout.layout],
        )?;

        Ok(Self {
            pipeline,
            uniform,
            layout,
        })
    }

    /// Binds the beauty image as input and `output` as the storage image.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        input: &TextureResource,
        output: &TextureResource,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.layout)
            .resource(self.uniform.binding_resource())
            .texture(&input.view)
            .texture(&output.view)
            .create(device, "Gamma Correct Bind Group")
    }

    pub fn set_uniform_gamma_exponent(&mut self, queue: &wgpu::Queue, exponent: f32) {
        self.uniform.update_content(
            queue,
            GammaUniform {
                exponent,
                ..Default::default()
            },
        );
    }

    /// Records the dispatch in its own compute pass, ended before returning
    /// so later passes observe the written image.
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        bind_group: &wgpu::BindGroup,
        (groups_x, groups_y): (u32, u32),
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Gamma Correct"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(groups_x, groups_y, 1);
    }
}
