//! Single interleaved vertex buffer triangle

use wgpu::util::DeviceExt;

use crate::{
    app::{AppContext, Application},
    error::Result,
    gfx::{
        programs::TriangleProgram,
        rendering::{RenderEngine, VertexLayout},
    },
};

use super::{clear_color_widgets, clear_pass};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ColoredVertex {
    position: [f32; 2],
    color: [f32; 3],
}

impl ColoredVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];
}

const VERTICES: [ColoredVertex; 3] = [
    ColoredVertex {
        position: [-0.5, -0.5],
        color: [1.0, 0.0, 0.0],
    },
    ColoredVertex {
        position: [0.5, -0.5],
        color: [0.0, 1.0, 0.0],
    },
    ColoredVertex {
        position: [0.0, 0.5],
        color: [0.0, 0.0, 1.0],
    },
];

pub struct TriangleApp {
    program: TriangleProgram,
    vertices: wgpu::Buffer,
    clear_color: [f32; 3],
}

impl Application for TriangleApp {
    const NAME: &'static str = "triangle";

    fn init(ctx: &AppContext<'_>) -> Result<Self> {
        let manager = ctx.pipeline_manager(&[TriangleProgram::SHADER])?;
        let program = TriangleProgram::new(
            &manager,
            ctx.engine.surface_format(),
            vec![VertexLayout::new(
                std::mem::size_of::<ColoredVertex>() as wgpu::BufferAddress,
                ColoredVertex::ATTRIBUTES.to_vec(),
            )],
        )?;
        let vertices = ctx
            .engine
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Triangle Vertices"),
                contents: bytemuck::cast_slice(&VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Ok(Self {
            program,
            vertices,
            clear_color: [0.0; 3],
        })
    }

    fn render(
        &mut self,
        _engine: &RenderEngine,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> Result<()> {
        let mut pass = clear_pass(encoder, target, self.clear_color);
        self.program.bind(&mut pass);
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.draw(0..3, 0..1);
        Ok(())
    }

    fn build_ui(&mut self, ui: &imgui::Ui) {
        ui.window("GUI").build(|| clear_color_widgets(ui, &mut self.clear_color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<ColoredVertex>(), 20);
        assert_eq!(ColoredVertex::ATTRIBUTES[1].offset, 8);
        assert_eq!(ColoredVertex::ATTRIBUTES[1].shader_location, 1);
    }
}
