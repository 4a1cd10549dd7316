//! Uniform bind groups shared by several programs

use crate::{
    gfx::{camera::ObjectUniform, lighting::LightingUniform},
    wgpu_utils::{
        binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
        DynamicUniformBuffer, UniformBuffer,
    },
};

/// A dynamic uniform buffer of [`ObjectUniform`]s and its bind group.
pub struct ObjectUniforms {
    layout: BindGroupLayoutWithDesc,
    buffer: DynamicUniformBuffer<ObjectUniform>,
    bind_group: wgpu::BindGroup,
}

impl ObjectUniforms {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform_dynamic(
                DynamicUniformBuffer::<ObjectUniform>::element_size(),
            ))
            .create(device, "Object Bind Group Layout");
        let buffer = DynamicUniformBuffer::new(device, capacity);
        let bind_group = Self::create_bind_group(device, &layout, &buffer);

        Self {
            layout,
            buffer,
            bind_group,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        buffer: &DynamicUniformBuffer<ObjectUniform>,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .buffer_slice(buffer.buffer(), DynamicUniformBuffer::<ObjectUniform>::element_size())
            .create(device, "Object Bind Group")
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    /// Uploads one slot per draw of the coming frame.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, objects: &[ObjectUniform]) {
        if self.buffer.write(device, queue, objects) {
            self.bind_group = Self::create_bind_group(device, &self.layout, &self.buffer);
        }
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, group: u32, slot: usize) {
        pass.set_bind_group(group, &self.bind_group, &[self.buffer.offset(slot)]);
    }
}

/// The lighting uniform, visible to fragment shaders.
pub struct LightingUniforms {
    buffer: UniformBuffer<LightingUniform>,
    layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl LightingUniforms {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = UniformBuffer::new(device);
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Lighting Bind Group Layout");
        let bind_group = BindGroupBuilder::new(&layout)
            .resource(buffer.binding_resource())
            .create(device, "Lighting Bind Group");

        Self {
            buffer,
            layout,
            bind_group,
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    pub fn set(&mut self, queue: &wgpu::Queue, lighting: LightingUniform) {
        self.buffer.update_content(queue, lighting);
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, group: u32) {
        pass.set_bind_group(group, &self.bind_group, &[]);
    }
}
