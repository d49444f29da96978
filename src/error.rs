//! Mesh error types.

use thiserror::Error;

use crate::backend::BackendError;
use crate::mesh::staging::AppendMode;

/// Errors reported by meshes, buffers and vertex arrays.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Attribute layout has no elements")]
    EmptyLayout,
    #[error("Vertex buffer slot {slot} is out of range ({count} slots)")]
    InvalidSlot { slot: usize, count: usize },
    #[error("Index {index} is out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Field {field} ('{name}') of slot {slot} takes {expected} components, got {found}")]
    FieldMismatch {
        slot: usize,
        field: usize,
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Length {len} is not a whole number of {record}-sized records")]
    PartialRecord { len: usize, record: usize },
    #[error("Slot {slot} is staged with {current} appends and cannot take {requested} appends")]
    MixedAppendModes {
        slot: usize,
        current: AppendMode,
        requested: AppendMode,
    },
    #[error("GPU buffers have been released")]
    GpuBuffersReleased,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type MeshResult<T> = Result<T, MeshError>;
