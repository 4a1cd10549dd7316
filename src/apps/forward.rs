//! Forward renderer: a sphere, a cube and the OBJ scene lit by one
//! directional light and a few point lights

use std::sync::Arc;

use cgmath::{Matrix4, Vector3};

use crate::{
    app::{AppContext, Application},
    error::Result,
    gfx::{
        camera::{ObjectUniform, ViewController},
        geometry::{self, GeometryData},
        lighting::{DirectionalLight, LightingState, LightingUniform},
        programs::{forward::MATERIAL_GROUP, ForwardProgram},
        rendering::RenderEngine,
        resources::{GpuMaterial, Material, TextureResource},
        scene::{GpuMesh, Scene, SceneInstance},
    },
};

use super::{clear_color_widgets, clear_value, initial_point_lights};

/// A generated mesh placed in the world with a tinted material.
struct MeshInstance {
    mesh: GpuMesh,
    material: GpuMaterial,
    color: [f32; 3],
    position: Vector3<f32>,
}

impl MeshInstance {
    fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
    }
}

pub struct ForwardRendererApp {
    program: ForwardProgram,
    depth: TextureResource,
    sphere: MeshInstance,
    cube: MeshInstance,
    scene: Scene,
    scene_instance: SceneInstance,
    view_controller: ViewController,
    lighting: LightingState,
    clear_color: [f32; 3],
    camera_speed: f32,
    max_camera_speed: f32,
}

impl ForwardRendererApp {
    fn objects(&self) -> [ObjectUniform; 3] {
        let view = self.view_controller.view_matrix();
        let projection = self.view_controller.projection_matrix();
        [
            ObjectUniform::new(self.sphere.model_matrix(), view, projection),
            ObjectUniform::new(self.cube.model_matrix(), view, projection),
            ObjectUniform::new(self.scene_instance.model_matrix(), view, projection),
        ]
    }
}

impl Application for ForwardRendererApp {
    const NAME: &'static str = "forward-renderer";

    fn init(ctx: &AppContext<'_>) -> Result<Self> {
        let engine = ctx.engine;
        let (device, queue) = (engine.device(), engine.queue());
        let manager = ctx.pipeline_manager(&[ForwardProgram::SHADER])?;
        let program = ForwardProgram::new(&manager, engine.surface_format())?;

        let plasma = Arc::new(TextureResource::from_image_file(
            device,
            queue,
            &ctx.config.paths.app_textures_dir().join("plasma.png"),
        )?);
        let mesh_instance = |label: &str, geometry: GeometryData, color, position| {
            MeshInstance {
                mesh: GpuMesh::new(device, label, &geometry.to_vertices(), &geometry.indices),
                material: GpuMaterial::new(
                    device,
                    program.material_layout(),
                    &Material::diffuse(color),
                    plasma.clone(),
                    label,
                ),
                color,
                position,
            }
        };
        let sphere = mesh_instance("Sphere", geometry::sphere(32, 16), [1.0, 0.0, 0.0], Vector3::new(0.0, 0.0, -2.0));
        let cube = mesh_instance("Cube", geometry::cube(), [0.0, 1.0, 0.0], Vector3::new(-2.0, 0.0, -2.0));

        let scene = Scene::load(device, queue, program.material_layout(), &ctx.config.paths.sponza_path())?;
        let max_camera_speed = scene.diagonal_length() * 0.5;
        let camera_speed = max_camera_speed / 5.0;
        let view_controller = ViewController::new(ctx.config.window.aspect_ratio()).with_speed(camera_speed);

        let (width, height) = engine.surface_size();
        let depth = TextureResource::create_depth_texture(device, width, height, "Forward Depth");

        Ok(Self {
            program,
            depth,
            sphere,
            cube,
            scene,
            scene_instance: SceneInstance::at(2.0, 0.0, -2.0),
            view_controller,
            lighting: LightingState {
                directional: DirectionalLight {
                    direction: Vector3::new(-1.0, -1.0, -1.0),
                    intensity: [1.0; 3],
                },
                points: initial_point_lights(),
            },
            clear_color: [0.0, 186.0 / 255.0, 1.0],
            camera_speed,
            max_camera_speed,
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

        self.program
            .set_lighting_uniforms(queue, LightingUniform::new(&self.lighting, view));
        let objects = self.objects();
        self.program.set_object_uniforms(device, queue, &objects);
        for instance in [&mut self.sphere, &mut self.cube] {
            instance
                .material
                .update(queue, &Material::diffuse(instance.color));
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward"),
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

        self.program.bind(&mut pass);
        for (slot, instance) in [&self.sphere, &self.cube].into_iter().enumerate() {
            self.program.bind_object(&mut pass, slot);
            pass.set_bind_group(MATERIAL_GROUP, instance.material.bind_group(), &[]);
            instance.mesh.draw(&mut pass);
        }
        self.program.bind_object(&mut pass, 2);
        self.scene.draw(&mut pass, MATERIAL_GROUP);
        Ok(())
    }

    fn build_ui(&mut self, ui: &imgui::Ui) {
        ui.window("GUI").build(|| {
            clear_color_widgets(ui, &mut self.clear_color);

            if ui.slider("Camera speed", 0.001, self.max_camera_speed, &mut self.camera_speed) {
                self.view_controller.set_speed(self.camera_speed);
            }
            ui.color_edit3("cubeInstance.color", &mut self.cube.color);
            ui.color_edit3("sphereInstance.color", &mut self.sphere.color);
            ui.color_edit3("lighting.dirLightIntensity", &mut self.lighting.directional.intensity);

            let bound = self.scene.diagonal_length() / 2.0;
            let mut direction: [f32; 3] = self.lighting.directional.direction.into();
            if ui
                .slider_config("lighting.dirLightDir", -1.0, 1.0)
                .build_array(&mut direction)
            {
                self.lighting.directional.direction = direction.into();
            }

            if let Some(light) = self.lighting.points.active_mut().first_mut() {
                ui.color_edit3("lighting.pointLightIntensity[0]", &mut light.intensity);
                ui.slider_config("lighting.pointLightPosition[0]", -bound, bound)
                    .build_array(&mut light.position);
            }

            ui.slider("near", 0.0001, 1.0, &mut self.view_controller.near);
            ui.slider("far", 100.0, 10000.0, &mut self.view_controller.far);

            if let Some(light) = self.lighting.points.active_mut().first_mut() {
                ui.slider("Point Light range", 0.01, 1000.0, &mut light.range);
                ui.slider("Point Light attenuation factor", 0.0, 100.0, &mut light.attenuation);
            }
        });
    }

    fn resize(&mut self, engine: &RenderEngine, width: u32, height: u32) -> Result<()> {
        self.depth = TextureResource::create_depth_texture(engine.device(), width, height, "Forward Depth");
        self.view_controller.set_aspect(width as f32 / height as f32);
        Ok(())
    }

    fn view_controller_mut(&mut self) -> Option<&mut ViewController> {
        Some(&mut self.view_controller)
    }
}
