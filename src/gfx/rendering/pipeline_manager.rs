//! Render pipeline management for wgpu
//!
//! Compiles shader modules once and builds render and compute pipelines
//! from declarative configurations. All creation runs inside a validation
//! error scope so a bad shader or layout becomes a [`GlintError::Gpu`].
//!
//! [`GlintError::Gpu`]: crate::error::GlintError::Gpu

use std::collections::HashMap;
use wgpu::*;

use crate::{
    error::{GlintError, Result},
    wgpu_utils::with_validation_scope,
};

use super::shader_library::ShaderLibrary;

/// Owned form of [`VertexBufferLayout`], so configurations can be stored
/// and compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub array_stride: BufferAddress,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(array_stride: BufferAddress, attributes: Vec<VertexAttribute>) -> Self {
        Self {
            array_stride,
            step_mode: VertexStepMode::Vertex,
            attributes,
        }
    }

    /// Single attribute at offset zero, for de-interleaved buffers.
    pub fn single(array_stride: BufferAddress, format: VertexFormat, location: ShaderLocation) -> Self {
        Self::new(
            array_stride,
            vec![VertexAttribute {
                format,
                offset: 0,
                shader_location: location,
            }],
        )
    }

    pub fn from_desc(desc: &VertexBufferLayout<'_>) -> Self {
        Self {
            array_stride: desc.array_stride,
            step_mode: desc.step_mode,
            attributes: desc.attributes.to_vec(),
        }
    }

    fn as_desc(&self) -> VertexBufferLayout<'_> {
        VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: &self.attributes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthConfig {
    pub format: TextureFormat,
    pub write_enabled: bool,
    pub compare: CompareFunction,
}

impl DepthConfig {
    pub fn less(format: TextureFormat) -> Self {
        Self {
            format,
            write_enabled: true,
            compare: CompareFunction::Less,
        }
    }
}

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub vs_entry: String,
    /// `None` builds a depth-only pipeline.
    pub fs_entry: Option<String>,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub vertex_layouts: Vec<VertexLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub strip_index_format: Option<IndexFormat>,
    pub cull_mode: Option<Face>,
    pub depth: Option<DepthConfig>,
    pub color_targets: Vec<Option<ColorTargetState>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "shader".to_string(),
            vs_entry: "vs_main".to_string(),
            fs_entry: Some("fs_main".to_string()),
            bind_group_layouts: Vec::new(),
            vertex_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            cull_mode: None,
            depth: None,
            color_targets: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn default_with_shader(shader: &str) -> Self {
        Self {
            label: shader.to_string(),
            shader: shader.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_entry_points(mut self, vs_entry: &str, fs_entry: &str) -> Self {
        self.vs_entry = vs_entry.to_owned();
        self.fs_entry = Some(fs_entry.to_owned());
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    /// Drops the fragment stage, for shadow passes
    pub fn with_vertex_only(mut self) -> Self {
        self.fs_entry = None;
        self.color_targets.clear();
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_vertex_layouts(mut self, layouts: Vec<VertexLayout>) -> Self {
        self.vertex_layouts = layouts;
        self
    }

    pub fn with_depth(mut self, depth: DepthConfig) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_color_targets(mut self, targets: Vec<Option<ColorTargetState>>) -> Self {
        self.color_targets = targets;
        self
    }

    /// One unblended target per format
    pub fn with_color_formats(self, formats: &[TextureFormat]) -> Self {
        let targets = formats
            .iter()
            .map(|&format| {
                Some(ColorTargetState {
                    format,
                    blend: None,
                    write_mask: ColorWrites::ALL,
                })
            })
            .collect();
        self.with_color_targets(targets)
    }

    pub fn with_primitive_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.primitive_topology = topology;
        self
    }

    pub fn with_strip_index_format(mut self, format: Option<IndexFormat>) -> Self {
        self.strip_index_format = format;
        self
    }
}

/// Compiled shader modules and the pipelines built from them
pub struct PipelineManager {
    device: Device,
    shader_modules: HashMap<String, ShaderModule>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    pipelines: HashMap<String, RenderPipeline>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: &Device) -> Self {
        Self {
            device: device.clone(),
            shader_modules: HashMap::new(),
            pipeline_configs: HashMap::new(),
            pipelines: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Compiles a WGSL source under `name`.
    pub fn load_shader(&mut self, name: &str, source: &str) -> Result<()> {
        let module = with_validation_scope(&self.device, name, || {
            self.device.create_shader_module(ShaderModuleDescriptor {
                label: Some(name),
                source: ShaderSource::Wgsl(source.into()),
            })
        })?;
        log::debug!("Compiled shader '{name}'");
        self.shader_modules.insert(name.to_string(), module);
        Ok(())
    }

    /// Resolves `name` through the library and compiles it.
    pub fn load_shader_from(&mut self, library: &ShaderLibrary, name: &str) -> Result<()> {
        let source = library.source(name)?;
        self.load_shader(name, &source)
    }

    fn shader(&self, name: &str) -> Result<&ShaderModule> {
        self.shader_modules
            .get(name)
            .ok_or_else(|| GlintError::Gpu {
                label: name.to_owned(),
                message: "shader module was never loaded".to_owned(),
            })
    }

    /// Registers a named pipeline, built by [`Self::create_all_pipelines`].
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    pub fn create_all_pipelines(&mut self) -> Result<()> {
        for name in std::mem::take(&mut self.pending_pipelines) {
            if let Some(config) = self.pipeline_configs.get(&name) {
                let pipeline = self.create_pipeline(config)?;
                self.pipelines.insert(name, pipeline);
            }
        }
        Ok(())
    }

    pub fn pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Creates a render pipeline from configuration
    pub fn create_pipeline(&self, config: &PipelineConfig) -> Result<RenderPipeline> {
        let shader = self.shader(&config.shader)?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let vertex_buffers: Vec<VertexBufferLayout<'_>> =
            config.vertex_layouts.iter().map(VertexLayout::as_desc).collect();

        let depth_stencil = config.depth.map(|depth| DepthStencilState {
            format: depth.format,
            depth_write_enabled: depth.write_enabled,
            depth_compare: depth.compare,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        with_validation_scope(&self.device, &config.label, || {
            let pipeline_layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", config.label)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

            let fragment = config.fs_entry.as_deref().map(|entry_point| FragmentState {
                module: shader,
                entry_point: Some(entry_point),
                targets: &config.color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            });

            self.device.create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some(&config.vs_entry),
                    buffers: &vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment,
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: config.strip_index_format,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })
    }

    pub fn create_compute_pipeline(
        &self,
        label: &str,
        shader: &str,
        entry_point: &str,
        bind_group_layouts: &[&BindGroupLayout],
    ) -> Result<ComputePipeline> {
        let module = self.shader(shader)?;
        with_validation_scope(&self.device, label, || {
            let layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{label} Layout")),
                bind_group_layouts,
                push_constant_ranges: &[],
            });
            self.device.create_compute_pipeline(&ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                module,
                entry_point: Some(entry_point),
                compilation_options: PipelineCompilationOptions::default(),
                cache: None,
            })
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_round_trips_through_desc() {
        let attributes = vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
        let desc = VertexBufferLayout {
            array_stride: 32,
            step_mode: VertexStepMode::Vertex,
            attributes: &attributes,
        };
        let layout = VertexLayout::from_desc(&desc);
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.as_desc().attributes[2].offset, 24);
    }

    #[test]
    fn vertex_only_config_has_no_targets() {
        let config = PipelineConfig::default_with_shader("directional_shadow_map")
            .with_color_formats(&[TextureFormat::Rgba8Unorm])
            .with_vertex_only();
        assert!(config.fs_entry.is_none());
        assert!(config.color_targets.is_empty());
        assert_eq!(config.label, "directional_shadow_map");
    }

    #[test]
    fn color_formats_become_unblended_targets() {
        let config = PipelineConfig::default()
            .with_color_formats(&[TextureFormat::Rgba32Float, TextureFormat::Bgra8Unorm]);
        assert_eq!(config.color_targets.len(), 2);
        assert!(config
            .color_targets
            .iter()
            .all(|t| t.as_ref().is_some_and(|t| t.blend.is_none())));
    }
}
