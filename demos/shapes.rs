//! Shapes demo
//!
//! Keys 1 to 4 switch between a hue wheel, a logo, color gradients and a
//! checkered triangle. Escape quits.
//!
//! ```bash
//! cargo run --example shapes -- --backend wgpu
//! RUST_LOG=debug cargo run --example shapes -- --no-vsync
//! ```

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use glam::Vec3;
use meshbuf::backend::Backend;
use meshbuf::window::{self, RunError};
use meshbuf::{
    shapes, BackendType, DynamicMesh, RenderConfig, ShaderProgram, UniformKind, UniformLayout,
    Window,
};
use winit::keyboard::KeyCode;

const SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/shaders");

/// Backend selection for the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum CliBackend {
    /// Render through wgpu
    #[default]
    Wgpu,
    /// Record calls without rendering
    Dummy,
}

impl From<CliBackend> for BackendType {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Wgpu => BackendType::Wgpu,
            CliBackend::Dummy => BackendType::Dummy,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shapes", about = "Draws meshes built with meshbuf")]
struct Args {
    /// Graphics backend
    #[arg(long, value_enum, default_value_t = CliBackend::Wgpu)]
    backend: CliBackend,

    /// Disable vertical sync
    #[arg(long)]
    no_vsync: bool,
}

struct Scenes {
    color_shader: ShaderProgram,
    checker_shader: ShaderProgram,
    circle: DynamicMesh,
    logo: [DynamicMesh; 2],
    gradients: DynamicMesh,
    checkers: DynamicMesh,
    current: usize,
}

impl Scenes {
    fn new(backend: &mut Backend) -> Result<Self, RunError> {
        let color_shader = ShaderProgram::from_files(
            backend,
            format!("{SHADER_DIR}/triangle.vert.wgsl"),
            format!("{SHADER_DIR}/triangle.frag.wgsl"),
            UniformLayout::new()
                .with("use_color", UniformKind::Int)
                .with("color", UniformKind::Float3),
        )?;
        let checker_shader = ShaderProgram::from_files(
            backend,
            format!("{SHADER_DIR}/checker.vert.wgsl"),
            format!("{SHADER_DIR}/checker.frag.wgsl"),
            UniformLayout::new().with("check_size", UniformKind::Float),
        )?;

        Ok(Self {
            color_shader,
            checker_shader,
            logo: shapes::logo(backend)?,
            gradients: shapes::gradients(backend)?,
            circle: shapes::circle(backend)?,
            checkers: shapes::checker_triangle(backend)?,
            current: 0,
        })
    }

    fn select(&mut self, window: &Window) {
        let keys = [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4];
        if let Some(index) = keys.iter().position(|key| window.is_key_pressed(*key)) {
            if index != self.current {
                log::debug!("Switching to scene {}", index + 1);
            }
            self.current = index;
        }
    }

    fn draw(&mut self, backend: &mut Backend) -> Result<(), RunError> {
        match self.current {
            0 => {
                self.color_shader.set_int("use_color", 0);
                self.color_shader.bind(backend)?;
                self.circle.draw_arrays(backend)?;
            }
            1 => {
                self.color_shader.set_int("use_color", 1);
                self.color_shader.set_float3("color", Vec3::new(0.0, 0.0, 0.6));
                self.color_shader.bind(backend)?;
                self.logo[0].draw_indexed(backend)?;

                self.color_shader.set_float3("color", Vec3::new(0.0, 0.6, 0.95));
                self.color_shader.bind(backend)?;
                self.logo[1].draw_arrays(backend)?;
            }
            2 => {
                self.color_shader.set_int("use_color", 0);
                self.color_shader.bind(backend)?;
                self.gradients.draw_indexed(backend)?;
            }
            _ => {
                self.checker_shader.set_float("check_size", 5.0);
                self.checker_shader.bind(backend)?;
                self.checkers.draw_arrays(backend)?;
            }
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    meshbuf::init_logging();
    let args = Args::parse();

    let config = RenderConfig {
        title: "meshbuf shapes".to_string(),
        backend: args.backend.into(),
        vsync: !args.no_vsync,
        ..Default::default()
    };

    let result = window::run(config, Scenes::new, |scenes, backend, window| {
        scenes.select(window);
        scenes.draw(backend)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
