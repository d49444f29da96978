//! Backend abstraction layer
//!
//! Provides the [`GraphicsBackend`] trait and the two implementations of it:
//! a wgpu backend that renders to a window and a dummy backend that records
//! calls for tests and headless runs.

pub mod dummy;
pub mod traits;
pub mod types;
pub mod wgpu_backend;

pub use traits::*;
pub use types::*;

use crate::BackendType;
use dummy::DummyBackend;
use std::ops::Range;
use std::sync::Arc;
use wgpu_backend::WgpuBackend;
use winit::window::Window as WinitWindow;

/// Backend wrapper to abstract over different backends
pub enum Backend {
    Wgpu(WgpuBackend),
    Dummy(DummyBackend),
}

impl Backend {
    /// Create the backend selected by `backend_type` for `window`
    pub fn new(
        window: Arc<WinitWindow>,
        backend_type: BackendType,
        vsync: bool,
    ) -> BackendResult<Self> {
        match backend_type {
            BackendType::Wgpu => Ok(Backend::Wgpu(WgpuBackend::new(window, vsync)?)),
            BackendType::Dummy => {
                let size = window.inner_size();
                Ok(Backend::Dummy(DummyBackend::with_surface_size(
                    size.width,
                    size.height,
                )))
            }
        }
    }

    fn inner(&self) -> &dyn GraphicsBackend {
        match self {
            Backend::Wgpu(b) => b,
            Backend::Dummy(b) => b,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn GraphicsBackend {
        match self {
            Backend::Wgpu(b) => b,
            Backend::Dummy(b) => b,
        }
    }
}

impl GraphicsBackend for Backend {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.inner_mut().resize(width, height)
    }

    fn surface_size(&self) -> (u32, u32) {
        self.inner().surface_size()
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> BackendResult<FrameContext> {
        self.inner_mut().begin_frame(clear_color)
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        self.inner_mut().end_frame()
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        self.inner_mut().create_buffer(desc)
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> BackendResult<()> {
        self.inner_mut().upload_buffer(buffer, data)
    }

    fn buffer_size(&self, buffer: BufferHandle) -> Option<u64> {
        self.inner().buffer_size(buffer)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.inner_mut().destroy_buffer(buffer)
    }

    fn create_program(&mut self, desc: &ProgramDescriptor) -> BackendResult<ProgramHandle> {
        self.inner_mut().create_program(desc)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.inner_mut().destroy_program(program)
    }

    fn use_program(&mut self, program: ProgramHandle, uniforms: &[u8]) -> BackendResult<()> {
        self.inner_mut().use_program(program, uniforms)
    }

    fn draw(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        vertices: Range<u32>,
    ) -> BackendResult<()> {
        self.inner_mut().draw(input, topology, vertices)
    }

    fn draw_indexed(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        indices: Range<u32>,
    ) -> BackendResult<()> {
        self.inner_mut().draw_indexed(input, topology, indices)
    }
}
