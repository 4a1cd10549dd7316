//! The five demo applications
//!
//! Each type implements [`Application`](crate::app::Application) and is
//! started by the binary of the same name in `src/bin/`.

pub mod deferred;
pub mod forward;
pub mod gltf_viewer;
pub mod triangle;
pub mod triangle_2vbos;

pub use deferred::DeferredRendererApp;
pub use forward::ForwardRendererApp;
pub use gltf_viewer::GltfViewerApp;
pub use triangle::TriangleApp;
pub use triangle_2vbos::Triangle2VbosApp;

use crate::gfx::lighting::{PointLight, PointLights, MAX_POINT_LIGHTS};

/// Starts a render pass on `target` cleared to `color`.
pub(crate) fn clear_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    color: [f32; 3],
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_value(color)),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

pub(crate) fn clear_value([r, g, b]: [f32; 3]) -> wgpu::Color {
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

/// Frame time readout followed by the clear color editor.
pub(crate) fn clear_color_widgets(ui: &imgui::Ui, clear_color: &mut [f32; 3]) {
    let framerate = ui.io().framerate;
    ui.text(format!(
        "Application average {:.3} ms/frame ({:.1} FPS)",
        1000.0 / framerate,
        framerate
    ));
    ui.color_edit3("clearColor", clear_color);
}

/// Point lights of the forward and deferred renderers: every slot `i`
/// sits at `(i, 2i, 1)` and the first two are active.
pub(crate) fn initial_point_lights() -> PointLights {
    let mut slots = [PointLight::default(); MAX_POINT_LIGHTS];
    for (i, slot) in slots.iter_mut().enumerate() {
        let i = i as f32;
        *slot = PointLight {
            position: [i, 2.0 * i, 1.0],
            intensity: [1.0; 3],
            range: 10.0,
            attenuation: 1.0,
        };
    }
    PointLights::from_slots(slots, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_point_lights_start_active() {
        let lights = initial_point_lights();
        assert_eq!(lights.len(), 2);
        assert_eq!(lights.active()[1].position, [1.0, 2.0, 1.0]);
        assert_eq!(lights.active()[0].range, 10.0);
    }
}
