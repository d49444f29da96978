//! Vertex and index buffer handles.
//!
//! Both wrap a backend buffer handle that can be released and created again.
//! A released buffer refuses uploads with [`MeshError::GpuBuffersReleased`].

use std::sync::Arc;

use crate::backend::{BufferDescriptor, BufferHandle, GraphicsBackend};
use crate::error::{MeshError, MeshResult};
use crate::mesh::layout::AttributeLayout;

/// GPU buffer of vertex records described by an [`AttributeLayout`].
#[derive(Debug)]
pub struct VertexBuffer {
    handle: Option<BufferHandle>,
    layout: Arc<AttributeLayout>,
    label: String,
}

impl VertexBuffer {
    pub fn new(
        backend: &mut dyn GraphicsBackend,
        layout: Arc<AttributeLayout>,
        label: impl Into<String>,
    ) -> MeshResult<Self> {
        let label = label.into();
        let handle = backend.create_buffer(&BufferDescriptor::vertex(label.clone()))?;
        log::trace!("Created vertex buffer '{}' ({:?})", label, handle);
        Ok(Self {
            handle: Some(handle),
            layout,
            label,
        })
    }

    pub fn layout(&self) -> &Arc<AttributeLayout> {
        &self.layout
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Backend handle, if the buffer is live.
    pub fn handle(&self) -> MeshResult<BufferHandle> {
        self.handle.ok_or(MeshError::GpuBuffersReleased)
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Replace the buffer content with `data`.
    pub fn upload(&self, backend: &mut dyn GraphicsBackend, data: &[u8]) -> MeshResult<()> {
        backend.upload_buffer(self.handle()?, data)?;
        Ok(())
    }

    /// Return the buffer to the backend. Further uploads fail until recreated.
    pub fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(handle) = self.handle.take() {
            log::trace!("Releasing vertex buffer '{}' ({:?})", self.label, handle);
            backend.destroy_buffer(handle);
        }
    }

    /// Release the current buffer, if any, and create a fresh empty one.
    pub fn recreate(&mut self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.release(backend);
        self.handle = Some(backend.create_buffer(&BufferDescriptor::vertex(self.label.clone()))?);
        Ok(())
    }
}

/// GPU buffer of 32-bit element indices.
#[derive(Debug)]
pub struct IndexBuffer {
    handle: Option<BufferHandle>,
    label: String,
}

impl IndexBuffer {
    pub fn new(backend: &mut dyn GraphicsBackend, label: impl Into<String>) -> MeshResult<Self> {
        let label = label.into();
        let handle = backend.create_buffer(&BufferDescriptor::index(label.clone()))?;
        Ok(Self {
            handle: Some(handle),
            label,
        })
    }

    pub fn handle(&self) -> MeshResult<BufferHandle> {
        self.handle.ok_or(MeshError::GpuBuffersReleased)
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    pub fn upload(&self, backend: &mut dyn GraphicsBackend, indices: &[u32]) -> MeshResult<()> {
        backend.upload_buffer(self.handle()?, bytemuck::cast_slice(indices))?;
        Ok(())
    }

    pub fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(handle) = self.handle.take() {
            backend.destroy_buffer(handle);
        }
    }

    pub fn recreate(&mut self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.release(backend);
        self.handle = Some(backend.create_buffer(&BufferDescriptor::index(self.label.clone()))?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;

    #[test]
    fn test_release_then_upload_fails() {
        let mut backend = DummyBackend::new();
        let mut buffer =
            VertexBuffer::new(&mut backend, Arc::new(AttributeLayout::default()), "positions")
                .unwrap();
        let handle = buffer.handle().unwrap();

        buffer.release(&mut backend);
        assert!(!backend.is_live(handle));
        assert!(matches!(
            buffer.upload(&mut backend, &[0; 12]),
            Err(MeshError::GpuBuffersReleased)
        ));

        buffer.recreate(&mut backend).unwrap();
        assert!(buffer.upload(&mut backend, &[0; 12]).is_ok());
        assert_eq!(backend.buffer_label(buffer.handle().unwrap()), Some("positions"));
    }

    #[test]
    fn test_index_upload_is_little_endian_u32() {
        let mut backend = DummyBackend::new();
        let indices = IndexBuffer::new(&mut backend, "indices").unwrap();
        indices.upload(&mut backend, &[1, 2, 3]).unwrap();

        let bytes = backend.buffer_contents(indices.handle().unwrap()).unwrap();
        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![1, 2, 3]);
    }
}
