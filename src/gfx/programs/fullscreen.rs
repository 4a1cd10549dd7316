//! Fullscreen-triangle programs writing to either output target
//!
//! The deferred renderer draws its lighting and debug views into the float
//! beauty target when post-processing is on and straight to the window
//! otherwise, so each of these programs keeps one pipeline per format.

use crate::{
    error::Result,
    gfx::{
        rendering::{ColorTarget, PipelineConfig, PipelineManager},
        resources::TextureResource,
    },
    wgpu_utils::{
        binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    },
};

pub const BEAUTY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

pub struct TargetPipelines {
    beauty: wgpu::RenderPipeline,
    surface: wgpu::RenderPipeline,
}

impl TargetPipelines {
    pub fn new(
        manager: &PipelineManager,
        config: PipelineConfig,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let label = config.label.clone();
        let beauty = manager.create_pipeline(
            &config
                .clone()
                .with_label(&format!("{label} (beauty)"))
                .with_color_formats(&[BEAUTY_FORMAT]),
        )?;
        let surface = manager.create_pipeline(
            &config
                .with_label(&format!("{label} (surface)"))
                .with_color_formats(&[surface_format]),
        )?;
        Ok(Self { beauty, surface })
    }

    pub fn get(&self, target: ColorTarget) -> &wgpu::RenderPipeline {
        match target {
            ColorTarget::Beauty => &self.beauty,
            ColorTarget::Surface => &self.surface,
        }
    }
}

/// Single-texture fullscreen program: a depth visualization or a plain copy.
pub struct TextureDisplayProgram {
    pipelines: TargetPipelines,
    layout: BindGroupLayoutWithDesc,
}

impl TextureDisplayProgram {
    /// Shows a depth texture as grey levels.
    pub fn display_depth(
        manager: &PipelineManager,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        Self::new(
            manager,
            surface_format,
            "display_depth",
            binding_types::depth_texture_2d(),
        )
    }

    /// Copies a float color texture, rescaling to the target size.
    pub fn blit(manager: &PipelineManager, surface_format: wgpu::TextureFormat) -> Result<Self> {
        Self::new(
            manager,
            surface_format,
            "blit",
            binding_types::texture_2d_unfilterable(),
        )
    }

    fn new(
        manager: &PipelineManager,
        surface_format: wgpu::TextureFormat,
        shader: &str,
        binding: wgpu::BindingType,
    ) -> Result<Self> {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding)
            .create(manager.device(), &format!("{shader} Layout"));

        let pipelines = TargetPipelines::new(
            manager,
            PipelineConfig::default_with_shader(shader)
                .with_bind_group_layouts(vec![layout.layout.clone()]),
            surface_format,
        )?;

        Ok(Self { pipelines, layout })
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        texture: &TextureResource,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.layout)
            .texture(&texture.view)
            .create(device, label)
    }

    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        target: ColorTarget,
        texture: &wgpu::BindGroup,
    ) {
        pass.set_pipeline(self.pipelines.get(target));
        pass.set_bind_group(0, texture, &[]);
        pass.draw(0..3, 0..1);
    }
}
