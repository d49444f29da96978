//! Window management using winit

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use winit::{
    dpi::PhysicalSize,
    error::{EventLoopError, OsError},
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window as WinitWindow, WindowBuilder},
};

use crate::backend::{Backend, BackendError, GraphicsBackend};
use crate::error::MeshError;
use crate::shader::ShaderError;
use crate::RenderConfig;

/// Errors that end [`run`]
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("Failed to create window: {0}")]
    Window(#[from] OsError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
}

/// Wrapper around winit window with additional state
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
    resized: bool,
    close_requested: bool,
    pressed: HashSet<KeyCode>,
}

impl Window {
    /// Create a window sized and titled from `config`
    pub fn new(event_loop: &EventLoop<()>, config: &RenderConfig) -> Result<Self, OsError> {
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(&config.title)
                .with_inner_size(PhysicalSize::new(config.width, config.height))
                .with_resizable(config.resizable)
                .build(event_loop)?,
        );
        let size = window.inner_size();

        Ok(Self {
            window,
            width: size.width,
            height: size.height,
            resized: false,
            close_requested: false,
            pressed: HashSet::new(),
        })
    }

    /// Get the raw window
    pub fn window(&self) -> &WinitWindow {
        &self.window
    }

    /// Get arc reference to window for backend initialization
    pub fn window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    /// Get current window dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check if window was resized since last frame
    pub fn was_resized(&self) -> bool {
        self.resized
    }

    /// Clear the resize flag
    pub fn clear_resize_flag(&mut self) {
        self.resized = false;
    }

    /// Check if close was requested, by the window manager or with Escape
    pub fn should_close(&self) -> bool {
        self.close_requested
    }

    /// Whether `key` is currently held down
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Handle window events
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                self.width = size.width;
                self.height = size.height;
                self.resized = true;
            }
            WindowEvent::CloseRequested => {
                self.close_requested = true;
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    if *code == KeyCode::Escape {
                        self.close_requested = true;
                    }
                    self.pressed.insert(*code);
                }
                ElementState::Released => {
                    self.pressed.remove(code);
                }
            },
            WindowEvent::Focused(false) => self.pressed.clear(),
            _ => {}
        }
    }

    /// Request a redraw
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// Open a window, create the backend and run the frame loop.
///
/// `init` builds the application state once the backend exists. `frame` is
/// called between `begin_frame` and `end_frame` for every frame until the
/// window closes. The first error from either callback stops the loop and is
/// returned.
pub fn run<S, I, F>(config: RenderConfig, init: I, mut frame: F) -> Result<(), RunError>
where
    I: FnOnce(&mut Backend) -> Result<S, RunError>,
    F: FnMut(&mut S, &mut Backend, &Window) -> Result<(), RunError>,
{
    let event_loop = EventLoop::new()?;
    let mut window = Window::new(&event_loop, &config)?;
    let mut backend = Backend::new(window.window_arc(), config.backend, config.vsync)?;
    log::info!("Using {} backend", backend.name());

    let mut state = init(&mut backend)?;
    let mut failure = None;

    event_loop.run(|event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => {
                window.handle_event(&event);

                if window.was_resized() {
                    let (width, height) = window.dimensions();
                    backend.resize(width, height);
                    window.clear_resize_flag();
                }
                if window.should_close() {
                    elwt.exit();
                }
            }
            Event::AboutToWait => {
                let result =
                    render_frame(&mut backend, config.clear_color, |backend| {
                        frame(&mut state, backend, &window)
                    });
                if let Err(e) = result {
                    log::error!("Frame failed: {}", e);
                    failure = Some(e);
                    elwt.exit();
                    return;
                }
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    failure.map_or(Ok(()), Err)
}

fn render_frame(
    backend: &mut Backend,
    clear_color: [f32; 4],
    draw: impl FnOnce(&mut Backend) -> Result<(), RunError>,
) -> Result<(), RunError> {
    match backend.begin_frame(clear_color) {
        Ok(_) => {}
        Err(BackendError::SurfaceLost) => {
            log::warn!("Surface lost, skipping frame");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let drawn = draw(backend);
    backend.end_frame()?;
    drawn
}
