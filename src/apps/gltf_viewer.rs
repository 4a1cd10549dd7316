//! glTF viewer: draws the scene graph of the model given on the command line

use cgmath::{Deg, Matrix4, Point3, Vector3};

use crate::{
    app::{AppContext, Application},
    error::{GlintError, Result},
    gfx::{
        camera::{ObjectUniform, ViewController},
        gltf_model::{traverse, GpuModel},
        lighting::{
            direction_from_angles_y_up, DirectionalLight, LightingState, LightingUniform,
            PointLight, PointLights, MAX_POINT_LIGHTS,
        },
        programs::GltfForwardProgram,
        rendering::RenderEngine,
        resources::TextureResource,
    },
};

use super::{clear_color_widgets, clear_value};

/// Light controls of the viewer. Colors and intensities are edited apart
/// and multiplied when the uniform is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerLights {
    pub dir_color: [f32; 3],
    pub dir_intensity: f32,
    pub phi: f32,
    pub theta: f32,
    pub point_color: [f32; 3],
    pub point_intensity: f32,
    pub point_position: [f32; 3],
}

impl Default for ViewerLights {
    fn default() -> Self {
        Self {
            dir_color: [1.0; 3],
            dir_intensity: 1.0,
            phi: 100.0,
            theta: 45.0,
            point_color: [1.0; 3],
            point_intensity: 5.0,
            point_position: [0.0, 10.0, 0.0],
        }
    }
}

fn scaled([r, g, b]: [f32; 3], factor: f32) -> [f32; 3] {
    [r * factor, g * factor, b * factor]
}

impl ViewerLights {
    /// Unit vector toward the directional light, Y being the polar axis.
    pub fn to_light(&self) -> Vector3<f32> {
        direction_from_angles_y_up(Deg(self.phi), Deg(self.theta))
    }

    pub fn lighting_state(&self) -> LightingState {
        let mut slots = [PointLight::default(); MAX_POINT_LIGHTS];
        slots[0] = PointLight {
            position: self.point_position,
            intensity: scaled(self.point_color, self.point_intensity),
            range: f32::MAX,
            attenuation: 1.0,
        };
        LightingState {
            directional: DirectionalLight {
                direction: -self.to_light(),
                intensity: scaled(self.dir_color, self.dir_intensity),
            },
            points: PointLights::from_slots(slots, 1),
        }
    }
}

pub struct GltfViewerApp {
    program: GltfForwardProgram,
    model: GpuModel,
    depth: TextureResource,
    view_controller: ViewController,
    lights: ViewerLights,
    clear_color: [f32; 3],
    replay: bool,
}

impl Application for GltfViewerApp {
    const NAME: &'static str = "gltf-viewer";

    fn init(ctx: &AppContext<'_>) -> Result<Self> {
        let engine = ctx.engine;
        let (device, queue) = (engine.device(), engine.queue());
        let model_path = ctx
            .config
            .model_path
            .as_deref()
            .ok_or_else(|| GlintError::MissingModelPath {
                program: ctx.config.paths.app_name.clone(),
            })?;

        let manager = ctx.pipeline_manager(&[GltfForwardProgram::SHADER])?;
        let mut program = GltfForwardProgram::new(device, engine.surface_format());
        let model = GpuModel::load(device, queue, &manager, &mut program, model_path)?;

        let mut view_controller = ViewController::new(ctx.config.window.aspect_ratio())
            .with_speed(8.0)
            .with_clip_planes(0.01, 100.0);
        view_controller.set_view_matrix(Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, -3.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        ));

        let (width, height) = engine.surface_size();
        Ok(Self {
            program,
            model,
            depth: TextureResource::create_depth_texture(device, width, height, "Viewer Depth"),
            view_controller,
            lights: ViewerLights::default(),
            clear_color: [0.2, 0.3, 0.3],
            replay: true,
        })
    }

    fn render(
        &mut self,
        engine: &RenderEngine,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> Result<()> {
        let (device, queue) = (engine.device(), engine.queue());
        let view = self.view_controller.view_matrix();
        let projection = self.view_controller.projection_matrix();

        let draws = traverse(self.model.graph(), self.replay);
        let objects: Vec<_> = draws
            .iter()
            .map(|draw| ObjectUniform::new(draw.model, view, projection))
            .collect();
        self.program.set_object_uniforms(device, queue, &objects);
        self.program
            .set_lighting_uniforms(queue, LightingUniform::new(&self.lights.lighting_state(), view));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glTF Forward"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_value(self.clear_color)),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.model.draw(&mut pass, &self.program, &draws)
    }

    fn build_ui(&mut self, ui: &imgui::Ui) {
        ui.window("GUI").build(|| {
            clear_color_widgets(ui, &mut self.clear_color);

            let lights = &mut self.lights;
            if ui.collapsing_header("Directional Lighting", imgui::TreeNodeFlags::empty()) {
                ui.color_edit3("DirLightColor", &mut lights.dir_color);
                imgui::Drag::new("DirLightIntensity")
                    .range(0.0, 100.0)
                    .speed(0.1)
                    .build(ui, &mut lights.dir_intensity);
                imgui::Drag::new("Phi Angle")
                    .range(0.0, 360.0)
                    .speed(1.0)
                    .build(ui, &mut lights.phi);
                imgui::Drag::new("Theta Angle")
                    .range(0.0, 180.0)
                    .speed(1.0)
                    .build(ui, &mut lights.theta);
            }
            if ui.collapsing_header("Point Lighting", imgui::TreeNodeFlags::empty()) {
                ui.color_edit3("PointLightColor", &mut lights.point_color);
                imgui::Drag::new("PointLightIntensity")
                    .range(0.0, 15000.0)
                    .speed(0.1)
                    .build(ui, &mut lights.point_intensity);
                ui.input_float3("Position", &mut lights.point_position).build();
            }
            ui.checkbox("Replay model after each mesh", &mut self.replay);
        });
    }

    fn resize(&mut self, engine: &RenderEngine, width: u32, height: u32) -> Result<()> {
        self.depth = TextureResource::create_depth_texture(engine.device(), width, height, "Viewer Depth");
        self.view_controller.set_aspect(width as f32 / height as f32);
        Ok(())
    }

    fn view_controller_mut(&mut self) -> Option<&mut ViewController> {
        Some(&mut self.view_controller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn light_intensities_are_color_times_scale() {
        let lights = ViewerLights {
            dir_color: [1.0, 0.5, 0.0],
            dir_intensity: 4.0,
            point_color: [0.0, 1.0, 1.0],
            point_intensity: 100.0,
            ..Default::default()
        };
        let state = lights.lighting_state();
        assert_eq!(state.directional.intensity, [4.0, 2.0, 0.0]);
        assert_eq!(state.points.len(), 1);
        assert_eq!(state.points.active()[0].intensity, [0.0, 100.0, 100.0]);
        assert_eq!(state.points.active()[0].position, [0.0, 10.0, 0.0]);
    }

    #[test]
    fn directional_light_travels_opposite_to_the_angles_direction() {
        let lights = ViewerLights {
            phi: 0.0,
            theta: 0.0,
            ..Default::default()
        };
        // theta 0 points straight up the Y axis
        assert!((lights.to_light() - Vector3::unit_y()).magnitude() < 1e-6);
        let direction = lights.lighting_state().directional.direction;
        assert!((direction + Vector3::unit_y()).magnitude() < 1e-6);
    }
}
