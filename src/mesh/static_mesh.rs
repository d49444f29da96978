//! Mesh uploaded in one shot from complete arrays.
//!
//! Nothing is staged on the host: every upload replaces the GPU content of a
//! slot wholesale and only the counts needed to size draw calls are kept.

use std::sync::Arc;

use bytemuck::Pod;

use crate::backend::{GraphicsBackend, PrimitiveTopology};
use crate::error::{MeshError, MeshResult};
use crate::mesh::buffer::{IndexBuffer, VertexBuffer};
use crate::mesh::layout::AttributeLayout;
use crate::mesh::vertex_array::VertexArray;

/// Mesh whose buffers are replaced by whole uploads.
#[derive(Debug)]
pub struct StaticMesh {
    slots: Vec<VertexBuffer>,
    index_buffer: IndexBuffer,
    vertex_array: VertexArray,
    vertex_count: u32,
    index_count: u32,
    topology: PrimitiveTopology,
}

impl StaticMesh {
    /// Mesh with a single Float3 `position` slot.
    pub fn new(backend: &mut dyn GraphicsBackend) -> MeshResult<Self> {
        Self::with_layout(backend, AttributeLayout::position_only())
    }

    pub fn with_layout(
        backend: &mut dyn GraphicsBackend,
        layout: impl Into<Arc<AttributeLayout>>,
    ) -> MeshResult<Self> {
        let index_buffer = IndexBuffer::new(backend, "static mesh indices")?;
        let mut vertex_array = VertexArray::new();
        vertex_array.set_index_buffer(&index_buffer)?;

        let mut mesh = Self {
            slots: Vec::new(),
            index_buffer,
            vertex_array,
            vertex_count: 0,
            index_count: 0,
            topology: PrimitiveTopology::default(),
        };
        mesh.create_vertex_buffer(backend, layout)?;
        Ok(mesh)
    }

    /// Register a new vertex buffer slot and return its index.
    pub fn create_vertex_buffer(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        layout: impl Into<Arc<AttributeLayout>>,
    ) -> MeshResult<usize> {
        self.index_buffer.handle()?;
        let slot = self.slots.len();
        let buffer = VertexBuffer::new(backend, layout.into(), format!("static mesh slot {slot}"))?;
        self.vertex_array.add_vertex_buffer(&buffer)?;
        self.slots.push(buffer);
        Ok(slot)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn set_topology(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    /// Replace the content of `slot` with `values`.
    ///
    /// `values` may be plain floats or `#[repr(C)]` vertex structs; its byte
    /// length must be a whole number of records. Uploading slot 0 sets the
    /// vertex count.
    pub fn upload_vertex_data<T: Pod>(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        slot: usize,
        values: &[T],
    ) -> MeshResult<()> {
        let count = self.slots.len();
        let buffer = self
            .slots
            .get(slot)
            .ok_or(MeshError::InvalidSlot { slot, count })?;

        let bytes: &[u8] = bytemuck::cast_slice(values);
        let stride = buffer.layout().stride();
        if bytes.len() % stride != 0 {
            return Err(MeshError::PartialRecord {
                len: bytes.len(),
                record: stride,
            });
        }

        buffer.upload(backend, bytes)?;
        if slot == 0 {
            self.vertex_count = (bytes.len() / stride) as u32;
        }
        Ok(())
    }

    /// Replace the index buffer content.
    pub fn upload_index_data(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        indices: &[u32],
    ) -> MeshResult<()> {
        self.index_buffer.upload(backend, indices)?;
        self.index_count = indices.len() as u32;
        Ok(())
    }

    pub fn draw_indexed(&self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.index_buffer.handle()?;
        self.vertex_array
            .draw_indexed(backend, self.topology, 0..self.index_count)
    }

    pub fn draw_arrays(&self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.draw_arrays_with(backend, self.topology)
    }

    /// Non-indexed draw with a one-off topology.
    pub fn draw_arrays_with(
        &self,
        backend: &mut dyn GraphicsBackend,
        topology: PrimitiveTopology,
    ) -> MeshResult<()> {
        self.index_buffer.handle()?;
        self.vertex_array
            .draw_arrays(backend, topology, 0..self.vertex_count)
    }

    /// Release the GPU buffers and drop the mesh.
    pub fn destroy(mut self, backend: &mut dyn GraphicsBackend) {
        for buffer in &mut self.slots {
            buffer.release(backend);
        }
        self.index_buffer.release(backend);
        self.vertex_array.clear();
    }
}

impl Drop for StaticMesh {
    fn drop(&mut self) {
        if self.index_buffer.is_live() {
            log::debug!("StaticMesh dropped with live GPU buffers; the backend frees them on shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use crate::mesh::layout::{LayoutElement, ShaderDataType};
    use bytemuck::Zeroable;

    #[repr(C)]
    #[derive(Clone, Copy, Pod, Zeroable)]
    struct ColorVertex {
        position: [f32; 3],
        color: [f32; 3],
    }

    #[test]
    fn test_slot_zero_sets_vertex_count() {
        let mut backend = DummyBackend::new();
        let mut mesh = StaticMesh::new(&mut backend).unwrap();

        mesh.upload_vertex_data(&mut backend, 0, &[0.0f32; 12]).unwrap();
        assert_eq!(mesh.vertex_count(), 4);

        mesh.upload_vertex_data(&mut backend, 0, &[0.0f32; 6]).unwrap();
        assert_eq!(mesh.vertex_count(), 2);
    }

    #[test]
    fn test_other_slots_leave_vertex_count() {
        let mut backend = DummyBackend::new();
        let mut mesh = StaticMesh::new(&mut backend).unwrap();
        let uv = mesh
            .create_vertex_buffer(
                &mut backend,
                AttributeLayout::new([LayoutElement::new(ShaderDataType::Float2, "uv")]).unwrap(),
            )
            .unwrap();

        mesh.upload_vertex_data(&mut backend, 0, &[0.0f32; 9]).unwrap();
        mesh.upload_vertex_data(&mut backend, uv, &[0.0f32; 20]).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_struct_upload() {
        let mut backend = DummyBackend::new();
        let layout = AttributeLayout::new([
            LayoutElement::new(ShaderDataType::Float3, "position"),
            LayoutElement::new(ShaderDataType::Float3, "color"),
        ])
        .unwrap();
        let mut mesh = StaticMesh::with_layout(&mut backend, layout).unwrap();
        let vertices = [ColorVertex {
            position: [0.0, 1.0, 0.0],
            color: [1.0, 0.0, 0.0],
        }; 3];

        mesh.upload_vertex_data(&mut backend, 0, &vertices).unwrap();
        mesh.upload_index_data(&mut backend, &[0, 1, 2]).unwrap();

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
        let handle = mesh.vertex_array().input().buffers[0];
        assert_eq!(backend.buffer_size(handle), Some(72));
    }

    #[test]
    fn test_invalid_slot_and_partial_record() {
        let mut backend = DummyBackend::new();
        let mut mesh = StaticMesh::new(&mut backend).unwrap();

        assert!(matches!(
            mesh.upload_vertex_data(&mut backend, 1, &[0.0f32; 3]),
            Err(MeshError::InvalidSlot { slot: 1, count: 1 })
        ));
        assert!(matches!(
            mesh.upload_vertex_data(&mut backend, 0, &[0.0f32; 4]),
            Err(MeshError::PartialRecord { len: 16, record: 12 })
        ));
        assert_eq!(mesh.vertex_count(), 0);
    }
}
