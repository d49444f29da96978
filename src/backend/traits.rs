//! Core backend abstraction traits
//!
//! Meshes and shader programs talk to the GPU only through [`GraphicsBackend`].
//! Resources live in an arena owned by the backend and are addressed by small
//! copyable handles, so a mesh and its vertex array can both refer to the same
//! buffer without sharing ownership of it.

use crate::backend::types::*;
use std::ops::Range;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to initialize backend: {0}")]
    InitializationFailed(String),
    #[error("Failed to create surface: {0}")]
    SurfaceCreationFailed(String),
    #[error("Failed to create device: {0}")]
    DeviceCreationFailed(String),
    #[error("Failed to acquire next image: {0}")]
    AcquireImageFailed(String),
    #[error("Failed to create pipeline: {0}")]
    PipelineCreationFailed(String),
    #[error("Unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),
    #[error("Unknown program handle {0:?}")]
    UnknownProgram(ProgramHandle),
    #[error("Buffer {buffer:?} was created without {usage:?} usage")]
    InvalidUsage { buffer: BufferHandle, usage: BufferUsage },
    #[error("Indexed draw without an index buffer")]
    MissingIndexBuffer,
    #[error("Draw issued outside of begin_frame/end_frame")]
    NoActiveFrame,
    #[error("Draw issued without a bound program")]
    NoProgramBound,
    #[error("Surface lost")]
    SurfaceLost,
    #[error("Out of memory")]
    OutOfMemory,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub(crate) u64);

/// Handle to a compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub(crate) u64);

/// Operations every backend provides.
///
/// The trait is object safe so callers can hold a `&mut dyn GraphicsBackend`.
pub trait GraphicsBackend {
    fn name(&self) -> &'static str;

    /// Resize the presentation surface
    fn resize(&mut self, width: u32, height: u32);

    /// Get current surface dimensions
    fn surface_size(&self) -> (u32, u32);

    /// Begin a new frame, clearing the surface to `clear_color`
    fn begin_frame(&mut self, clear_color: [f32; 4]) -> BackendResult<FrameContext>;

    /// Execute the frame's draws and present
    fn end_frame(&mut self) -> BackendResult<()>;

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle>;

    /// Replace the whole content of a buffer.
    ///
    /// The buffer is reallocated under the same handle when `data` is larger
    /// than its current size. Backends that defer draws to `end_frame` may
    /// apply the upload to draws issued earlier in the same frame.
    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> BackendResult<()>;

    /// Size in bytes of the last upload, `None` for unknown handles
    fn buffer_size(&self, buffer: BufferHandle) -> Option<u64>;

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn create_program(&mut self, desc: &ProgramDescriptor) -> BackendResult<ProgramHandle>;

    fn destroy_program(&mut self, program: ProgramHandle);

    /// Make `program` current for the following draws of this frame.
    ///
    /// `uniforms` is snapshotted, so later changes only affect later draws.
    fn use_program(&mut self, program: ProgramHandle, uniforms: &[u8]) -> BackendResult<()>;

    fn draw(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        vertices: Range<u32>,
    ) -> BackendResult<()>;

    fn draw_indexed(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        indices: Range<u32>,
    ) -> BackendResult<()>;
}
