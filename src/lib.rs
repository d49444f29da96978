//! meshbuf - Triangle mesh buffers over a small graphics backend
//!
//! Vertex data is described by an [`AttributeLayout`], staged on the host by a
//! [`DynamicMesh`] one field or one raw record at a time, and uploaded to GPU
//! buffers on flush. A [`StaticMesh`] skips staging and uploads whole arrays.
//!
//! Two backends implement [`backend::GraphicsBackend`]:
//! - **wgpu**: renders to a winit window
//! - **Dummy**: records every call, used by tests and headless runs
//!
//! ```
//! use meshbuf::backend::dummy::DummyBackend;
//! use meshbuf::DynamicMesh;
//! use glam::Vec3;
//!
//! let mut backend = DummyBackend::new();
//! let mut mesh = DynamicMesh::new(&mut backend)?;
//! mesh.append_vertex(Vec3::new(-0.5, -0.5, 0.0))?;
//! mesh.append_vertex(Vec3::new(0.5, -0.5, 0.0))?;
//! mesh.append_vertex(Vec3::new(0.0, 0.5, 0.0))?;
//! mesh.connect_vertices(0, 1, 2);
//! mesh.flush(&mut backend)?;
//! assert_eq!(mesh.element_count(), 3);
//! # Ok::<(), meshbuf::MeshError>(())
//! ```

pub mod backend;
pub mod error;
pub mod mesh;
pub mod shader;
pub mod shapes;
pub mod window;

pub use error::{MeshError, MeshResult};
pub use mesh::{
    AppendMode, AttributeLayout, DynamicMesh, IndexBuffer, LayoutElement, ShaderDataType,
    StaticMesh, VertexArray, VertexBuffer, VertexValue,
};
pub use shader::{ShaderError, ShaderProgram, UniformKind, UniformLayout};
pub use window::Window;

// Re-export wgpu backend for direct access
pub use backend::wgpu_backend::WgpuBackend;

/// Backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendType {
    /// wgpu backend rendering to the window
    #[default]
    Wgpu,
    /// Records calls without touching a GPU
    Dummy,
}

/// Configuration for the window and its backend
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Whether the user may resize the window
    pub resizable: bool,
    /// Which backend to use
    pub backend: BackendType,
    /// Enable vsync
    pub vsync: bool,
    /// Color the frame is cleared to
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "meshbuf".to_string(),
            width: 800,
            height: 800,
            resizable: false,
            backend: BackendType::Wgpu,
            vsync: true,
            clear_color: [0.25, 0.25, 0.25, 1.0],
        }
    }
}

/// Install `env_logger`, defaulting to the `info` level when `RUST_LOG` is unset.
///
/// Calling it twice is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
