//! Common types shared between backends

use std::ops::Range;

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferUsage(u32);

impl BufferUsage {
    pub const COPY_DST: Self = Self(1 << 0);
    pub const INDEX: Self = Self(1 << 1);
    pub const VERTEX: Self = Self(1 << 2);
    pub const UNIFORM: Self = Self(1 << 3);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Buffer descriptor
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    /// Initial size in bytes. Uploads larger than this grow the buffer.
    pub size: u64,
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    pub fn vertex(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            size: 0,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
        }
    }

    pub fn index(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            size: 0,
            usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
        }
    }
}

/// Vertex attribute format as consumed by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Sint32,
    Sint32x2,
    Sint32x3,
    Sint32x4,
}

impl VertexFormat {
    pub fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32 | VertexFormat::Sint32 => 4,
            VertexFormat::Float32x2 | VertexFormat::Sint32x2 => 8,
            VertexFormat::Float32x3 | VertexFormat::Sint32x3 => 12,
            VertexFormat::Float32x4 | VertexFormat::Sint32x4 => 16,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    pub format: VertexFormat,
    /// Byte offset inside one record
    pub offset: u64,
}

/// Vertex step mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    #[default]
    Vertex,
    Instance,
}

/// Layout of one bound vertex buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferLayout {
    pub array_stride: u64,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttribute>,
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// Everything a draw call needs to fetch vertices.
///
/// `buffers[i]` is bound with `layouts[i]`. The index buffer holds `u32`
/// indices and is only read by indexed draws.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexInput {
    pub layouts: Vec<VertexBufferLayout>,
    pub buffers: Vec<crate::backend::BufferHandle>,
    pub index_buffer: Option<crate::backend::BufferHandle>,
}

/// Shader program descriptor
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    pub label: Option<String>,
    /// WGSL source with `vs_main` and `fs_main` entry points
    pub source: String,
    /// Size in bytes of the uniform block at group 0, binding 0. Zero means none.
    pub uniform_size: u64,
}

/// Frame context returned by begin_frame
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub width: u32,
    pub height: u32,
}

/// A draw call as issued by a mesh
#[derive(Debug, Clone, PartialEq)]
pub enum DrawRange {
    Vertices(Range<u32>),
    Indices(Range<u32>),
}
