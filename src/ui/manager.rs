//! ImGui integration
//!
//! Wraps the imgui context together with its winit platform and wgpu
//! renderer. A frame is built with [`UiManager::frame`] and drawn on top of
//! the already rendered window image with [`UiManager::render`].

use std::time::Instant;

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::Window,
};

use crate::{
    config::GuiConfig,
    error::{GlintError, Result},
};

pub struct UiManager {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    /// Sets up the context with a locked DPI scale and the configured font
    /// size. The layout file, if any, is written on drop.
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: &Window,
        config: &GuiConfig,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(config.ini_filename.clone());

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: config.font_size,
                ..Default::default()
            }),
        }]);

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
        }
    }

    /// Feeds an input event to imgui. Returns true when the GUI wants it,
    /// in which case it must not reach the camera.
    pub fn handle_event<T>(&mut self, window: &Window, event: &Event<T>) -> bool {
        let Event::WindowEvent { event: window_event, .. } = event else {
            return false;
        };
        match window_event {
            WindowEvent::CursorMoved { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::KeyboardInput { .. }
            | WindowEvent::ModifiersChanged(_)
            | WindowEvent::Resized(_)
            | WindowEvent::Focused(_) => {
                self.platform
                    .handle_event(self.context.io_mut(), window, event);
                self.wants_input()
            }
            _ => false,
        }
    }

    pub fn wants_input(&self) -> bool {
        let io = self.context.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    /// Builds one GUI frame with `build`.
    pub fn frame<F>(&mut self, window: &Window, build: F) -> Result<()>
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        self.platform
            .prepare_frame(self.context.io_mut(), window)
            .map_err(|err| GlintError::Gpu {
                label: "GUI frame".to_owned(),
                message: format!("{err:?}"),
            })?;

        let ui = self.context.frame();
        build(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }
        Ok(())
    }

    /// Draws the last built frame over `color_attachment`, keeping its
    /// contents.
    pub fn render(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        color_attachment: &TextureView,
    ) -> Result<()> {
        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return Ok(());
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("GUI"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.renderer
            .render(draw_data, queue, device, &mut render_pass)
            .map_err(|err| GlintError::Gpu {
                label: "GUI".to_owned(),
                message: format!("{err:?}"),
            })
    }
}
