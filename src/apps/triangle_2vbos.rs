//! Triangle with positions and colors in two vertex buffers

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

const POSITIONS: [[f32; 2]; 3] = [[-0.5, -0.5], [0.5, -0.5], [0.0, 0.5]];
const COLORS: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

pub struct Triangle2VbosApp {
    program: TriangleProgram,
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    clear_color: [f32; 3],
}

fn vertex_layouts() -> Vec<VertexLayout> {
    vec![
        VertexLayout::single(8, wgpu::VertexFormat::Float32x2, 0),
        VertexLayout::single(12, wgpu::VertexFormat::Float32x3, 1),
    ]
}

impl Application for Triangle2VbosApp {
    const NAME: &'static str = "triangle-2vbos";

    fn init(ctx: &AppContext<'_>) -> Result<Self> {
        let manager = ctx.pipeline_manager(&[TriangleProgram::SHADER])?;
        let program = TriangleProgram::new(&manager, ctx.engine.surface_format(), vertex_layouts())?;

        let device = ctx.engine.device();
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Triangle Positions"),
            contents: bytemuck::cast_slice(&POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let colors = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Triangle Colors"),
            contents: bytemuck::cast_slice(&COLORS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            program,
            positions,
            colors,
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
        pass.set_vertex_buffer(0, self.positions.slice(..));
        pass.set_vertex_buffer(1, self.colors.slice(..));
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
    fn each_attribute_has_its_own_buffer() {
        let layouts = vertex_layouts();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].attributes[0].shader_location, 0);
        assert_eq!(layouts[1].attributes[0].shader_location, 1);
        assert_eq!(layouts[1].array_stride, std::mem::size_of::<[f32; 3]>() as u64);
    }
}
