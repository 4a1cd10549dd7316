use std::marker::PhantomData;

fn short_type_name<T>() -> &'static str {
    let type_name = std::any::type_name::<T>();
    match type_name.rfind(':') {
        Some(pos) => &type_name[(pos + 1)..],
        None => type_name,
    }
}

/// Typed uniform buffer holding a single `Content` value
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", short_type_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: Vec::new(),
        }
    }

    /// Creates the buffer mapped and fills it with `initial_content`
    pub fn new_with_data(device: &wgpu::Device, initial_content: &Content) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", short_type_name::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });

        buffer
            .slice(..)
            .get_mapped_range_mut()
            .clone_from_slice(bytemuck::bytes_of(initial_content));
        buffer.unmap();

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: bytemuck::bytes_of(initial_content).to_vec(),
        }
    }

    /// Writes `content`, skipping the upload when nothing changed
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    /// Whole buffer, for bind group entries
    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// One uniform slot per draw call, addressed with dynamic offsets.
///
/// Queue writes all land before the command buffer executes, so every draw
/// recorded in a frame needs its own slot rather than a shared buffer that
/// is overwritten between draws.
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    stride: u64,
    capacity: usize,
    staging: Vec<u8>,
    content_type: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> DynamicUniformBuffer<Content> {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = aligned_stride(std::mem::size_of::<Content>() as u64, alignment);
        let capacity = capacity.max(1);

        DynamicUniformBuffer {
            buffer: Self::allocate(device, stride, capacity),
            stride,
            capacity,
            staging: Vec::new(),
            content_type: PhantomData,
        }
    }

    fn allocate(device: &wgpu::Device, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!(
                "DynamicUniformBuffer<{}>",
                short_type_name::<Content>()
            )),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads one slot per element. Returns `true` when the buffer had to
    /// grow, in which case bind groups referencing it must be recreated.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, contents: &[Content]) -> bool {
        let mut reallocated = false;
        if contents.len() > self.capacity {
            self.capacity = contents.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.stride, self.capacity);
            reallocated = true;
        }

        self.staging.clear();
        self.staging.resize(self.stride as usize * contents.len(), 0);
        for (slot, content) in contents.iter().enumerate() {
            let start = slot * self.stride as usize;
            let bytes = bytemuck::bytes_of(content);
            self.staging[start..start + bytes.len()].copy_from_slice(bytes);
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
        reallocated
    }

    /// Dynamic offset of the slot at `index`
    pub fn offset(&self, index: usize) -> u32 {
        (index as u64 * self.stride) as u32
    }

    pub fn element_size() -> u64 {
        std::mem::size_of::<Content>() as u64
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

fn aligned_stride(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_rounds_up_to_the_offset_alignment() {
        assert_eq!(aligned_stride(192, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(260, 256), 512);
        assert_eq!(aligned_stride(16, 64), 64);
    }

    #[test]
    fn type_names_drop_the_module_path() {
        assert_eq!(short_type_name::<std::string::String>(), "String");
        assert_eq!(short_type_name::<u32>(), "u32");
    }
}
