//! Deferred renderer with a directional shadow map and compute gamma
//! correction
//!
//! GUI-editable values live in [`DeferredState`]; the GPU side records the
//! passes returned by [`plan_frame`] in order.

use cgmath::{Deg, Matrix4, SquareMatrix, Transform};

use crate::{
    app::{AppContext, Application},
    error::{GlintError, Result},
    gfx::{
        camera::{ObjectUniform, ViewController},
        lighting::{
            direction_from_angles, light_up_vector, DirectionalLight, LightCamera, LightingState,
            LightingUniform, ShadowSettings,
        },
        programs::{
            geometry_pass::MATERIAL_GROUP, DirectionalShadowMapProgram, GammaCorrectProgram,
            GeometryPassProgram, ShadingPassProgram, TextureDisplayProgram, BEAUTY_FORMAT,
        },
        rendering::{
            plan_frame, ColorTarget, DeferredSettings, Framebuffer, GBuffer, GBufferTextureType,
            Pass, RenderEngine, ShadowMapState,
        },
        resources::TextureResource,
        scene::{Scene, SceneInstance},
    },
};

use super::{clear_color_widgets, clear_value, initial_point_lights};

pub const SHADOW_MAP_RESOLUTION: u32 = 512;

/// CPU state of the deferred renderer, edited by the GUI.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredState {
    pub settings: DeferredSettings,
    pub shadow_map: ShadowMapState,
    pub lighting: LightingState,
    pub shadow: ShadowSettings,
    pub clear_color: [f32; 3],
    pub gamma: f32,
    phi: f32,
    theta: f32,
}

impl Default for DeferredState {
    fn default() -> Self {
        let mut state = Self {
            settings: DeferredSettings::default(),
            shadow_map: ShadowMapState::default(),
            lighting: LightingState {
                directional: DirectionalLight::default(),
                points: initial_point_lights(),
            },
            shadow: ShadowSettings::default(),
            clear_color: [0.0, 186.0 / 255.0, 1.0],
            gamma: 2.2,
            phi: 260.0,
            theta: 260.0,
        };
        state.update_direction();
        state
    }
}

impl DeferredState {
    pub fn phi(&self) -> f32 {
        self.phi
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Any change of the light angles invalidates the shadow map.
    pub fn set_phi(&mut self, degrees: f32) {
        if degrees != self.phi {
            self.phi = degrees;
            self.update_direction();
        }
    }

    pub fn set_theta(&mut self, degrees: f32) {
        if degrees != self.theta {
            self.theta = degrees;
            self.update_direction();
        }
    }

    fn update_direction(&mut self) {
        self.lighting.directional.direction = -self.to_light();
        self.shadow_map.mark_dirty();
    }

    /// Unit vector from the scene toward the directional light.
    pub fn to_light(&self) -> cgmath::Vector3<f32> {
        direction_from_angles(Deg(self.phi), Deg(self.theta))
    }

    pub fn light_up(&self) -> cgmath::Vector3<f32> {
        light_up_vector(Deg(self.phi), Deg(self.theta))
    }

    pub fn gamma_exponent(&self) -> f32 {
        1.0 / self.gamma
    }
}

/// Fixed-size render targets besides the G-buffer.
struct Targets {
    gbuffer: GBuffer,
    shadow_map: Framebuffer,
    beauty: Framebuffer,
    corrected: Framebuffer,
}

impl Targets {
    fn new(device: &wgpu::Device, (width, height): (u32, u32)) -> Result<Self> {
        let gbuffer = GBuffer::new(device, width, height)?;
        let shadow_map = Framebuffer::new(
            device,
            "DirectionalShadowMap",
            Vec::new(),
            Some(TextureResource::create_shadow_map(device, SHADOW_MAP_RESOLUTION)),
        )?;
        let beauty = Framebuffer::new(
            device,
            "Beauty",
            vec![TextureResource::create_render_target(
                device,
                width,
                height,
                BEAUTY_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                "Beauty",
            )],
            None,
        )?;
        let corrected = Framebuffer::new(
            device,
            "GammaCorrectedBeauty",
            vec![TextureResource::create_render_target(
                device,
                width,
                height,
                BEAUTY_FORMAT,
                wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::RENDER_ATTACHMENT,
                "GammaCorrectedBeauty",
            )],
            None,
        )?;

        Ok(Self {
            gbuffer,
            shadow_map,
            beauty,
            corrected,
        })
    }

    fn shadow_map_texture(&self) -> Result<&TextureResource> {
        self.shadow_map.depth().ok_or_else(|| GlintError::Gpu {
            label: self.shadow_map.label().to_owned(),
            message: "framebuffer has no depth attachment".to_owned(),
        })
    }
}

/// Bind groups over the fixed targets, built once.
struct BindGroups {
    gbuffer_channels: Vec<wgpu::BindGroup>,
    gbuffer_depth: wgpu::BindGroup,
    shadow_map: wgpu::BindGroup,
    shading_inputs: wgpu::BindGroup,
    gamma: wgpu::BindGroup,
    corrected: wgpu::BindGroup,
}

pub struct DeferredRendererApp {
    geometry_pass: GeometryPassProgram,
    shading_pass: ShadingPassProgram,
    shadow_map_pass: DirectionalShadowMapProgram,
    display_depth: TextureDisplayProgram,
    blit: TextureDisplayProgram,
    gamma_correct: GammaCorrectProgram,
    targets: Targets,
    bind_groups: BindGroups,
    scene: Scene,
    scene_instance: SceneInstance,
    view_controller: ViewController,
    light_camera: LightCamera,
    state: DeferredState,
    camera_speed: f32,
    max_camera_speed: f32,
}

impl DeferredRendererApp {
    fn create_bind_groups(
        device: &wgpu::Device,
        targets: &Targets,
        blit: &TextureDisplayProgram,
        display_depth: &TextureDisplayProgram,
        shading_pass: &ShadingPassProgram,
        gamma_correct: &GammaCorrectProgram,
    ) -> Result<BindGroups> {
        let gbuffer_channels = GBufferTextureType::ALL
            .into_iter()
            .filter(|channel| *channel != GBufferTextureType::Depth)
            .map(|channel| {
                blit.create_bind_group(device, targets.gbuffer.texture(channel), channel.label())
            })
            .collect();
        let shadow_map = targets.shadow_map_texture()?;

        Ok(BindGroups {
            gbuffer_channels,
            gbuffer_depth: display_depth.create_bind_group(
                device,
                targets.gbuffer.texture(GBufferTextureType::Depth),
                "GDepth Display",
            ),
            shadow_map: display_depth.create_bind_group(device, shadow_map, "Shadow Map Display"),
            shading_inputs: shading_pass.create_inputs_bind_group(device, &targets.gbuffer, shadow_map),
            gamma: gamma_correct.create_bind_group(
                device,
                targets.beauty.color(0),
                targets.corrected.color(0),
            ),
            corrected: blit.create_bind_group(device, targets.corrected.color(0), "Corrected Blit"),
        })
    }

    /// Light camera covering the scene's bounding sphere, placed where the
    /// scene instance puts the geometry.
    fn fit_light_camera(&self) -> LightCamera {
        let (center, radius) = self.scene.bounding_sphere();
        let center = self.scene_instance.model_matrix().transform_point(center);
        LightCamera::fit_sphere(center, radius, self.state.to_light(), self.state.light_up())
    }

    fn target_view<'a>(
        &'a self,
        target: ColorTarget,
        surface: &'a wgpu::TextureView,
    ) -> &'a wgpu::TextureView {
        match target {
            ColorTarget::Beauty => &self.targets.beauty.color(0).view,
            ColorTarget::Surface => surface,
        }
    }

    fn record(
        &mut self,
        pass: Pass,
        engine: &RenderEngine,
        encoder: &mut wgpu::CommandEncoder,
        surface: &wgpu::TextureView,
    ) {
        let (device, queue) = (engine.device(), engine.queue());
        let model = self.scene_instance.model_matrix();
        let clear = clear_value(self.state.clear_color);

        match pass {
            Pass::ShadowMap => {
                self.light_camera = self.fit_light_camera();
                self.shadow_map_pass.set_uniform_dir_light_view_proj_matrix(
                    device,
                    queue,
                    self.light_camera.view_projection(),
                    model,
                );
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Directional Shadow Map"),
                    color_attachments: &[],
                    depth_stencil_attachment: self.targets.shadow_map.depth_attachment(),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                self.shadow_map_pass.bind(&mut render_pass);
                self.scene.draw_geometry(&mut render_pass);
            }
            Pass::Geometry => {
                let view = self.view_controller.view_matrix();
                let projection = self.view_controller.projection_matrix();
                self.geometry_pass
                    .set_object_uniforms(device, queue, ObjectUniform::new(model, view, projection));

                let framebuffer = self.targets.gbuffer.framebuffer();
                let color_attachments =
                    framebuffer.color_attachments(Some(wgpu::Color { a: 0.0, ..clear }));
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Geometry Pass"),
                    color_attachments: &color_attachments,
                    depth_stencil_attachment: framebuffer.depth_attachment(),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                self.geometry_pass.bind(&mut render_pass);
                self.scene.draw(&mut render_pass, MATERIAL_GROUP);
            }
            Pass::BlitGBuffer { channel, target } => {
                let view = self.target_view(target, surface);
                let mut render_pass = fullscreen_pass(encoder, view, Some(clear), "G-Buffer Display");
                match channel {
                    GBufferTextureType::Depth => {
                        self.display_depth
                            .draw(&mut render_pass, target, &self.bind_groups.gbuffer_depth)
                    }
                    channel => self.blit.draw(
                        &mut render_pass,
                        target,
                        &self.bind_groups.gbuffer_channels[channel.index()],
                    ),
                }
            }
            Pass::Shading { target } => {
                let view_to_light =
                    self.light_camera.view_projection() * self.view_controller.rcp_view_matrix();
                let lighting = LightingUniform::new(&self.state.lighting, self.view_controller.view_matrix())
                    .with_shadow(view_to_light, self.state.shadow);
                self.shading_pass.set_lighting_uniforms(queue, lighting);
                let view = self.target_view(target, surface);
                let mut render_pass = fullscreen_pass(encoder, view, Some(clear), "Shading Pass");
                self.shading_pass
                    .draw(&mut render_pass, target, &self.bind_groups.shading_inputs);
            }
            Pass::DisplayShadowMap { target } => {
                let view = self.target_view(target, surface);
                let mut render_pass = fullscreen_pass(encoder, view, None, "Shadow Map Display");
                self.display_depth
                    .draw(&mut render_pass, target, &self.bind_groups.shadow_map);
            }
            Pass::GammaCorrect { groups } => {
                self.gamma_correct
                    .set_uniform_gamma_exponent(queue, self.state.gamma_exponent());
                self.gamma_correct
                    .dispatch(encoder, &self.bind_groups.gamma, groups);
            }
            Pass::PresentCorrected => {
                let mut render_pass = fullscreen_pass(encoder, surface, Some(clear), "Present");
                self.blit
                    .draw(&mut render_pass, ColorTarget::Surface, &self.bind_groups.corrected);
            }
        }
    }
}

fn fullscreen_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    clear: Option<wgpu::Color>,
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

impl Application for DeferredRendererApp {
    const NAME: &'static str = "deferred-renderer";

    fn init(ctx: &AppContext<'_>) -> Result<Self> {
        let engine = ctx.engine;
        let (device, queue) = (engine.device(), engine.queue());
        let surface_format = engine.surface_format();
        let manager = ctx.pipeline_manager(&[
            GeometryPassProgram::SHADER,
            ShadingPassProgram::SHADER,
            DirectionalShadowMapProgram::SHADER,
            "display_depth",
            "blit",
            GammaCorrectProgram::SHADER,
        ])?;

        let geometry_pass = GeometryPassProgram::new(&manager)?;
        let shading_pass = ShadingPassProgram::new(&manager, surface_format)?;
        let shadow_map_pass = DirectionalShadowMapProgram::new(&manager)?;
        let display_depth = TextureDisplayProgram::display_depth(&manager, surface_format)?;
        let blit = TextureDisplayProgram::blit(&manager, surface_format)?;
        let gamma_correct = GammaCorrectProgram::new(&manager)?;

        let targets = Targets::new(device, engine.surface_size())?;
        let bind_groups = Self::create_bind_groups(
            device,
            &targets,
            &blit,
            &display_depth,
            &shading_pass,
            &gamma_correct,
        )?;

        let scene = Scene::load(
            device,
            queue,
            geometry_pass.material_layout(),
            &ctx.config.paths.sponza_path(),
        )?;
        let max_camera_speed = scene.diagonal_length() * 0.5;
        let camera_speed = max_camera_speed / 5.0;
        let view_controller =
            ViewController::new(ctx.config.window.aspect_ratio()).with_speed(camera_speed);

        let mut app = Self {
            geometry_pass,
            shading_pass,
            shadow_map_pass,
            display_depth,
            blit,
            gamma_correct,
            targets,
            bind_groups,
            scene,
            scene_instance: SceneInstance::at(2.0, 0.0, -2.0),
            view_controller,
            light_camera: LightCamera {
                view: Matrix4::identity(),
                projection: Matrix4::identity(),
            },
            state: DeferredState::default(),
            camera_speed,
            max_camera_speed,
        };
        app.light_camera = app.fit_light_camera();
        Ok(app)
    }

    fn render(
        &mut self,
        engine: &RenderEngine,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> Result<()> {
        let passes = plan_frame(
            &self.state.settings,
            &mut self.state.shadow_map,
            self.targets.gbuffer.size(),
        );
        for pass in passes {
            self.record(pass, engine, encoder, target);
        }
        Ok(())
    }

    fn build_ui(&mut self, ui: &imgui::Ui) {
        ui.window("GUI").build(|| {
            let state = &mut self.state;
            clear_color_widgets(ui, &mut state.clear_color);
            ui.slider("Gamma", 0.0, 16.0, &mut state.gamma);

            let settings = &mut state.settings;
            let label = if settings.display_gbuffer { "Hide G-Buffers" } else { "Show G-Buffers" };
            if ui.button(label) {
                settings.display_gbuffer = !settings.display_gbuffer;
            }
            ui.same_line();
            let label = if settings.display_shadow_map { "Hide Shadow Map" } else { "Show Shadow Map" };
            if ui.button(label) {
                settings.display_shadow_map = !settings.display_shadow_map;
            }
            let label = if settings.post_processing {
                "Disable post-processing"
            } else {
                "Enable post-processing"
            };
            if ui.button(label) {
                settings.post_processing = !settings.post_processing;
            }
            if settings.display_gbuffer {
                for (i, channel) in GBufferTextureType::ALL.into_iter().enumerate() {
                    if i > 0 {
                        ui.same_line();
                    }
                    ui.radio_button(channel.label(), &mut settings.gbuffer_channel, channel);
                }
            }

            if ui.slider("Camera speed", 0.001, self.max_camera_speed, &mut self.camera_speed) {
                self.view_controller.set_speed(self.camera_speed);
            }
            ui.color_edit3("lighting.dirLightIntensity", &mut state.lighting.directional.intensity);
            let bound = self.scene.diagonal_length() / 2.0;
            if let Some(light) = state.lighting.points.active_mut().first_mut() {
                ui.color_edit3("lighting.pointLightIntensity[0]", &mut light.intensity);
                ui.slider_config("lighting.pointLightPosition[0]", -bound, bound)
                    .build_array(&mut light.position);
            }

            let mut phi = state.phi();
            if ui.slider("dirLight Phi", 0.0, 360.0, &mut phi) {
                state.set_phi(phi);
            }
            let mut theta = state.theta();
            if ui.slider("dirLight Theta", 0.0, 360.0, &mut theta) {
                state.set_theta(theta);
            }
            ui.text(if state.shadow_map.is_dirty() {
                "Shadow Map is dirty"
            } else {
                "Shadow Map is not dirty"
            });
            ui.slider("SM Bias", 0.0, 10.0, &mut state.shadow.bias);
            ui.slider("SM Sample Count", 1, 128, &mut state.shadow.sample_count);
            ui.slider("SM Spread", 0.0, 0.01, &mut state.shadow.spread);
            ui.slider("near", 0.0001, 1.0, &mut self.view_controller.near);
            ui.slider("far", 100.0, 10000.0, &mut self.view_controller.far);
            if let Some(light) = state.lighting.points.active_mut().first_mut() {
                ui.slider("Point Light range", 0.01, 1000.0, &mut light.range);
                ui.slider("Point Light attenuation factor", 0.0, 100.0, &mut light.attenuation);
            }
        });
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
    fn initial_state_matches_startup_values() {
        let state = DeferredState::default();
        assert_eq!(state.phi(), 260.0);
        assert_eq!(state.theta(), 260.0);
        assert_eq!(state.lighting.points.len(), 2);
        assert_eq!(state.settings, DeferredSettings::default());
        assert!(state.shadow_map.is_dirty());
        assert!((state.gamma_exponent() - 1.0 / 2.2).abs() < 1e-6);
    }

    #[test]
    fn light_travels_away_from_the_angles_direction() {
        let state = DeferredState::default();
        let sum = state.lighting.directional.direction + state.to_light();
        assert!(sum.magnitude() < 1e-6);
    }

    #[test]
    fn changing_an_angle_marks_the_shadow_map_dirty() {
        let mut state = DeferredState::default();
        state.shadow_map.take();

        state.set_phi(260.0);
        assert!(!state.shadow_map.is_dirty(), "same value must not invalidate");

        state.set_phi(120.0);
        assert!(state.shadow_map.take());

        state.set_theta(30.0);
        assert!(state.shadow_map.is_dirty());
        assert!((state.to_light() - direction_from_angles(Deg(120.0), Deg(30.0))).magnitude() < 1e-6);
    }

    #[test]
    fn shadow_map_is_planned_only_after_angle_changes() {
        let mut state = DeferredState::default();
        let size = (1280, 720);
        assert_eq!(plan_frame(&state.settings, &mut state.shadow_map, size)[0], Pass::ShadowMap);
        assert_ne!(plan_frame(&state.settings, &mut state.shadow_map, size)[0], Pass::ShadowMap);
        state.set_theta(45.0);
        assert_eq!(plan_frame(&state.settings, &mut state.shadow_map, size)[0], Pass::ShadowMap);
    }
}
