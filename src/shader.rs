//! Shader programs and their uniform blocks.
//!
//! A program is one WGSL module with `vs_main` and `fs_main` entry points and
//! at most one uniform struct at `@group(0) @binding(0)`. The struct is
//! described on the host by a [`UniformLayout`] whose fields must be declared
//! in the same order as in WGSL. Offsets follow the WGSL uniform address space
//! rules, so `vec3<f32>` and the columns of `mat3x3<f32>` start on 16 bytes.
//!
//! Sources are validated with naga before they reach the backend.

use std::path::Path;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use thiserror::Error;

use crate::backend::{BackendError, BackendResult, GraphicsBackend, ProgramDescriptor, ProgramHandle};

/// Shader error type
#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("Failed to parse shader '{label}':\n{message}")]
    Parse { label: String, message: String },
    #[error("Shader '{label}' failed validation: {message}")]
    Validation { label: String, message: String },
    #[error("Shader '{label}' has no '{entry_point}' entry point")]
    MissingEntryPoint { label: String, entry_point: &'static str },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Type of one uniform field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
}

impl UniformKind {
    fn align(&self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 | Self::Float4 | Self::Mat3 | Self::Mat4 => 16,
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
            Self::Mat3 => 48,
            Self::Mat4 => 64,
        }
    }
}

/// A named field of a uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: usize,
}

/// Host description of a program's uniform struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    end: usize,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field after the previous ones.
    pub fn with(mut self, name: impl Into<String>, kind: UniformKind) -> Self {
        let offset = self.end.div_ceil(kind.align()) * kind.align();
        self.end = offset + kind.size();
        self.fields.push(UniformField {
            name: name.into(),
            kind,
            offset,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Size of the block in bytes, rounded up to 16. Zero when empty.
    pub fn size(&self) -> usize {
        self.end.div_ceil(16) * 16
    }
}

/// Read a shader source file.
///
/// A read failure is logged and yields an empty string, which then fails
/// validation in [`ShaderProgram::new`].
pub fn read_source(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            log::error!("Failed to read shader source {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Parse and validate WGSL, checking for both entry points.
pub fn validate(label: &str, source: &str) -> Result<(), ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        let message = e.emit_to_string(source);
        log::error!("Shader '{}' failed to compile:\n{}", label, message);
        ShaderError::Parse {
            label: label.to_string(),
            message,
        }
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| {
        let message = e.to_string();
        log::error!("Shader '{}' failed validation: {}", label, message);
        ShaderError::Validation {
            label: label.to_string(),
            message,
        }
    })?;

    for entry_point in ["vs_main", "fs_main"] {
        if !module.entry_points.iter().any(|ep| ep.name == entry_point) {
            log::error!("Shader '{}' has no '{}' entry point", label, entry_point);
            return Err(ShaderError::MissingEntryPoint {
                label: label.to_string(),
                entry_point,
            });
        }
    }
    Ok(())
}

/// A validated program with a host copy of its uniform block.
#[derive(Debug)]
pub struct ShaderProgram {
    handle: ProgramHandle,
    label: String,
    layout: UniformLayout,
    uniforms: Vec<u8>,
}

impl ShaderProgram {
    pub fn new(
        backend: &mut dyn GraphicsBackend,
        label: impl Into<String>,
        source: &str,
        layout: UniformLayout,
    ) -> Result<Self, ShaderError> {
        let label = label.into();
        validate(&label, source)?;

        let handle = backend.create_program(&ProgramDescriptor {
            label: Some(label.clone()),
            source: source.to_string(),
            uniform_size: layout.size() as u64,
        })?;
        log::debug!("Created program '{}' ({} uniform bytes)", label, layout.size());

        Ok(Self {
            handle,
            label,
            uniforms: vec![0; layout.size()],
            layout,
        })
    }

    /// Build a program from a vertex and a fragment source file.
    ///
    /// The two files are joined into one module; passing the same path twice
    /// loads it once.
    pub fn from_files(
        backend: &mut dyn GraphicsBackend,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        layout: UniformLayout,
    ) -> Result<Self, ShaderError> {
        let (vertex_path, fragment_path) = (vertex_path.as_ref(), fragment_path.as_ref());
        let source = if vertex_path == fragment_path {
            read_source(vertex_path)
        } else {
            format!("{}\n{}", read_source(vertex_path), read_source(fragment_path))
        };
        let label = vertex_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| vertex_path.display().to_string());
        Self::new(backend, label, &source, layout)
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Current content of the uniform block.
    pub fn uniform_bytes(&self) -> &[u8] {
        &self.uniforms
    }

    fn write(&mut self, name: &str, kind: UniformKind, bytes: &[u8]) {
        match self.layout.field(name) {
            Some(field) if field.kind == kind => {
                self.uniforms[field.offset..field.offset + bytes.len()].copy_from_slice(bytes);
            }
            Some(field) => log::warn!(
                "Uniform '{}' of '{}' is {:?}, not {:?}",
                name,
                self.label,
                field.kind,
                kind
            ),
            None => log::warn!("Program '{}' has no uniform '{}'", self.label, name),
        }
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.write(name, UniformKind::Int, bytemuck::bytes_of(&value));
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, UniformKind::Float, bytemuck::bytes_of(&value));
    }

    pub fn set_float2(&mut self, name: &str, value: Vec2) {
        self.write(name, UniformKind::Float2, bytemuck::bytes_of(&value));
    }

    pub fn set_float3(&mut self, name: &str, value: Vec3) {
        self.write(name, UniformKind::Float3, bytemuck::bytes_of(&value));
    }

    pub fn set_float4(&mut self, name: &str, value: Vec4) {
        self.write(name, UniformKind::Float4, bytemuck::bytes_of(&value));
    }

    pub fn set_mat3(&mut self, name: &str, value: Mat3) {
        // Each column is padded to 16 bytes
        let mut padded = [0.0f32; 12];
        for (column, values) in value.to_cols_array_2d().iter().enumerate() {
            padded[column * 4..column * 4 + 3].copy_from_slice(values);
        }
        self.write(name, UniformKind::Mat3, bytemuck::cast_slice(&padded));
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.write(name, UniformKind::Mat4, bytemuck::bytes_of(&value));
    }

    /// Make this program current for the following draws, with a snapshot of
    /// the uniform values set so far.
    pub fn bind(&self, backend: &mut dyn GraphicsBackend) -> BackendResult<()> {
        backend.use_program(self.handle, &self.uniforms)
    }

    pub fn destroy(self, backend: &mut dyn GraphicsBackend) {
        backend.destroy_program(self.handle);
    }
}
