//! Frame driver: owns the window and the renderer, and turns winit events
//! into frames.
//!
//! ```text
//! Init ──resumed──► Running ──close / Escape / OOM──► ShuttingDown
//!   │                  │
//!   │ init failed      └─ per redraw: input → movement → time/FPS →
//!   └─► ShuttingDown      shader reloads → render → request redraw
//! ```

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::asset::{AssetServer, process_shader_reloads};
use crate::config::Config;
use crate::error::InitError;
use crate::frame::SceneState;
use crate::input::KeyCode;
use crate::render::{GpuContext, Renderer};

/// Pixels of trackpad scroll that count as one wheel line.
const PIXELS_PER_SCROLL_LINE: f32 = 20.0;

/// Scroll amount in wheel lines, positive away from the user.
pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_SCROLL_LINE,
    }
}

/// Everything created once the window exists.
struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer,
    assets: Option<AssetServer>,
}

enum FrameState {
    Init,
    Running(Box<Running>),
    ShuttingDown,
}

pub struct UmbraApp {
    config: Config,
    state: SceneState,
    frame: FrameState,
    init_error: Option<InitError>,
}

impl UmbraApp {
    pub fn new(config: Config) -> Self {
        let state = SceneState::new(&config);
        Self {
            config,
            state,
            frame: FrameState::Init,
            init_error: None,
        }
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<Running, InitError> {
        let window_config = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(&window_config.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                window_config.width,
                window_config.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs)?);

        // Look input comes from raw device motion, so either grab mode works.
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            log::warn!("Cursor grab unavailable: {e}");
        }
        window.set_cursor_visible(false);

        let gpu = GpuContext::new(window.clone())?;
        let renderer = Renderer::new(&gpu, &self.config, &self.state);

        let assets = self.config.hot_reload.then(|| {
            let mut server = AssetServer::new();
            for (path, kind) in renderer.shader_paths() {
                server.watch(path, kind);
            }
            server
        });

        Ok(Running {
            window,
            gpu,
            renderer,
            assets,
        })
    }
}

impl ApplicationHandler for UmbraApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.frame, FrameState::Init) {
            return;
        }

        match self.init(event_loop) {
            Ok(running) => {
                self.state.viewport = running.gpu.surface_size();
                running.window.request_redraw();
                self.frame = FrameState::Running(Box::new(running));
                log::info!("Running");
            }
            Err(e) => {
                self.init_error = Some(e);
                self.frame = FrameState::ShuttingDown;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let FrameState::Running(running) = &mut self.frame else {
            return;
        };
        let state = &mut self.state;

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Window close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
                state.viewport = (size.width, size.height);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => state.keys.press(key),
                        ElementState::Released => state.keys.release(key),
                    }
                }
            }

            WindowEvent::MouseInput { button, state: pressed, .. } => match pressed {
                ElementState::Pressed => state.mouse.press(button),
                ElementState::Released => state.mouse.release(button),
            },

            WindowEvent::MouseWheel { delta, .. } => {
                state.camera.zoom(scroll_lines(delta));
            }

            WindowEvent::RedrawRequested => {
                if state.keys.just_pressed(KeyCode::Escape) {
                    log::info!("Escape pressed, exiting.");
                    event_loop.exit();
                    return;
                }

                state.apply_movement();
                state.advance_time();

                if let Some(assets) = &mut running.assets {
                    process_shader_reloads(assets, &mut running.renderer, &running.gpu);
                }

                match running.renderer.render(&running.gpu, state) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        running.gpu.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory!");
                        event_loop.exit();
                        return;
                    }
                    Err(e) => log::warn!("Surface error: {e:?}"),
                }

                state.keys.clear_just();
                state.mouse.clear_just();
                running.window.request_redraw();
            }

            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if !matches!(self.frame, FrameState::Running(_)) {
            return;
        }
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.camera.look(delta.0 as f32, delta.1 as f32);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if matches!(self.frame, FrameState::Running(_)) {
            log::info!(
                "Shutting down after {} frames ({:.1}s)",
                self.state.time.frame_count(),
                self.state.time.elapsed_secs()
            );
        }
        self.frame = FrameState::ShuttingDown;
    }
}

/// Open the window and run until it closes.
pub fn run(config: Config) -> Result<(), InitError> {
    let event_loop = EventLoop::new()?;
    let mut app = UmbraApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.init_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
