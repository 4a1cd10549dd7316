//! Window, event loop and the per-frame driver shared by every demo
//!
//! A demo implements [`Application`] and hands it to [`run`]. Each frame the
//! runner records the demo's passes, draws the GUI on top, presents, and
//! finally moves the camera by the elapsed time unless the GUI holds the
//! input.

use std::{sync::Arc, time::Instant};

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::AppConfig,
    error::{GlintError, Result},
    gfx::{
        camera::ViewController,
        rendering::{PipelineManager, RenderEngine, ShaderLibrary},
    },
    ui::UiManager,
};

/// What a demo gets to build its GPU state from.
pub struct AppContext<'a> {
    pub config: &'a AppConfig,
    pub engine: &'a RenderEngine,
    pub shaders: &'a ShaderLibrary,
}

impl AppContext<'_> {
    /// A pipeline manager with `names` loaded from the shader library.
    pub fn pipeline_manager(&self, names: &[&str]) -> Result<PipelineManager> {
        let mut manager = PipelineManager::new(self.engine.device());
        for name in names {
            manager.load_shader_from(self.shaders, name)?;
        }
        Ok(manager)
    }
}

pub trait Application: Sized {
    /// Name of the built-in shader set, e.g. `deferred-renderer`.
    const NAME: &'static str;

    fn init(ctx: &AppContext<'_>) -> Result<Self>;

    /// Records this frame's passes into `encoder`, ending with `target`
    /// holding the image to present.
    fn render(
        &mut self,
        engine: &RenderEngine,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> Result<()>;

    fn build_ui(&mut self, ui: &imgui::Ui);

    fn resize(&mut self, _engine: &RenderEngine, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn view_controller_mut(&mut self) -> Option<&mut ViewController> {
        None
    }
}

struct Running<A> {
    window: Arc<Window>,
    engine: RenderEngine,
    ui: UiManager,
    app: A,
    last_frame: Instant,
}

impl<A: Application> Running<A> {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self> {
        let attributes = Window::default_attributes()
            .with_title(config.window.title.clone())
            .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
            .with_resizable(config.window.resizable);
        let window = Arc::new(event_loop.create_window(attributes)?);

        let size = window.inner_size();
        let engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            &config.window,
            (size.width, size.height),
        ))?;

        let ui = UiManager::new(
            engine.device(),
            engine.queue(),
            engine.surface_format(),
            &window,
            &config.gui,
        );

        let shaders = ShaderLibrary::new(config.paths.app_shaders_dir(), A::NAME);
        log::info!("Loading shaders from {}", shaders.dir().display());
        let app = A::init(&AppContext {
            config,
            engine: &engine,
            shaders: &shaders,
        })?;

        Ok(Self {
            window,
            engine,
            ui,
            app,
            last_frame: Instant::now(),
        })
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(frame) = self.engine.acquire_frame() else {
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .engine
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.app.render(&self.engine, &mut encoder, &view)?;

        let app = &mut self.app;
        self.ui.frame(&self.window, |ui| app.build_ui(ui))?;
        self.ui.render(
            self.engine.device(),
            self.engine.queue(),
            &mut encoder,
            &view,
        )?;

        self.engine.queue().submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();

        let now = Instant::now();
        let elapsed = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        let gui_has_input = self.ui.wants_input();
        if let Some(controller) = self.app.view_controller_mut() {
            if gui_has_input {
                controller.reset_input();
            } else {
                controller.update(elapsed);
            }
        }
        Ok(())
    }

    fn keyboard(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        if event.physical_key == PhysicalKey::Code(KeyCode::Escape)
            && event.state == ElementState::Pressed
        {
            event_loop.exit();
            return;
        }
        if let Some(controller) = self.app.view_controller_mut() {
            controller.process_keyboard(event);
        }
    }
}

struct Runner<A> {
    config: AppConfig,
    running: Option<Running<A>>,
    error: Option<GlintError>,
}

impl<A: Application> Runner<A> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: GlintError) {
        log::error!("{err}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }
}

impl<A: Application> ApplicationHandler for Runner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match Running::new(event_loop, &self.config) {
            Ok(running) => self.running = Some(running),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        let ui_event: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        let captured = running.ui.handle_event(&running.window, &ui_event);

        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                running.engine.resize(width, height);
                if width > 0 && height > 0 {
                    running.app.resize(&running.engine, width, height)
                } else {
                    Ok(())
                }
            }
            WindowEvent::KeyboardInput { event, .. } if !captured => {
                running.keyboard(&event, event_loop);
                Ok(())
            }
            WindowEvent::MouseInput { state, button, .. } if !captured => {
                if let Some(controller) = running.app.view_controller_mut() {
                    controller.process_mouse_button(button, state);
                }
                Ok(())
            }
            WindowEvent::Focused(false) => {
                if let Some(controller) = running.app.view_controller_mut() {
                    controller.reset_input();
                }
                Ok(())
            }
            WindowEvent::RedrawRequested => running.redraw(),
            _ => Ok(()),
        };

        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if running.ui.wants_input() {
            return;
        }
        if let DeviceEvent::MouseMotion { delta } = event {
            if let Some(controller) = running.app.view_controller_mut() {
                controller.process_mouse_motion(delta);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = self.running.as_ref() {
            running.window.request_redraw();
        }
    }
}

/// Opens the window and drives `A` until the window closes or a frame fails.
pub fn run<A: Application>(config: AppConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = Runner::<A> {
        config,
        running: None,
        error: None,
    };
    event_loop.run_app(&mut runner)?;

    match runner.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
