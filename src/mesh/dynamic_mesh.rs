//! Incrementally built mesh with host-side staging.
//!
//! A [`DynamicMesh`] owns one staging sequence per vertex buffer slot and one
//! index sequence. Geometry is appended on the host, then [`DynamicMesh::flush`]
//! copies it to the GPU buffers. Staged data stays available after a flush.
//!
//! Slot 0 is the position stream. Its completed records drive
//! [`DynamicMesh::vertex_count`], and the value returned by the append that
//! completes a slot-0 record is the index to pass to
//! [`DynamicMesh::connect_vertices`]:
//!
//! ```
//! use glam::Vec3;
//! use meshbuf::backend::dummy::DummyBackend;
//! use meshbuf::mesh::{AttributeLayout, DynamicMesh, LayoutElement, ShaderDataType};
//!
//! let mut backend = DummyBackend::new();
//! let layout = AttributeLayout::new([
//!     LayoutElement::new(ShaderDataType::Float3, "position"),
//!     LayoutElement::new(ShaderDataType::Float3, "color"),
//! ])
//! .unwrap();
//! let mut mesh = DynamicMesh::with_layout(&mut backend, layout).unwrap();
//!
//! let mut corners = Vec::new();
//! for x in [0.0, 1.0, 0.5] {
//!     mesh.append_vertex(Vec3::new(x, 0.0, 0.0)).unwrap();
//!     corners.push(mesh.append_vertex(Vec3::ONE).unwrap());
//! }
//! mesh.connect_vertices(corners[0], corners[1], corners[2]);
//! mesh.flush(&mut backend).unwrap();
//!
//! assert_eq!(mesh.vertex_count(), 3);
//! assert_eq!(mesh.index_data(), &[0, 1, 2]);
//! ```

use std::sync::Arc;

use crate::backend::{GraphicsBackend, PrimitiveTopology};
use crate::error::{MeshError, MeshResult};
use crate::mesh::buffer::{IndexBuffer, VertexBuffer};
use crate::mesh::layout::AttributeLayout;
use crate::mesh::staging::Staging;
use crate::mesh::vertex::VertexValue;
use crate::mesh::vertex_array::VertexArray;

#[derive(Debug)]
struct Slot {
    buffer: VertexBuffer,
    staging: Staging,
}

/// Mesh assembled on the host and synchronized to the GPU on demand.
#[derive(Debug)]
pub struct DynamicMesh {
    slots: Vec<Slot>,
    index_buffer: IndexBuffer,
    index_data: Vec<u32>,
    vertex_array: VertexArray,
    vertex_count: u32,
    topology: PrimitiveTopology,
}

impl DynamicMesh {
    /// Mesh with a single Float3 `position` slot.
    pub fn new(backend: &mut dyn GraphicsBackend) -> MeshResult<Self> {
        Self::with_layout(backend, AttributeLayout::position_only())
    }

    /// Mesh whose slot 0 uses `layout`.
    pub fn with_layout(
        backend: &mut dyn GraphicsBackend,
        layout: impl Into<Arc<AttributeLayout>>,
    ) -> MeshResult<Self> {
        let index_buffer = IndexBuffer::new(backend, "dynamic mesh indices")?;
        let mut vertex_array = VertexArray::new();
        vertex_array.set_index_buffer(&index_buffer)?;

        let mut mesh = Self {
            slots: Vec::new(),
            index_buffer,
            index_data: Vec::new(),
            vertex_array,
            vertex_count: 0,
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
        self.ensure_live()?;
        let slot = self.slots.len();
        let buffer = VertexBuffer::new(backend, layout.into(), format!("dynamic mesh slot {slot}"))?;
        self.vertex_array.add_vertex_buffer(&buffer)?;
        self.slots.push(Slot {
            buffer,
            staging: Staging::default(),
        });
        Ok(slot)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn layout(&self, slot: usize) -> MeshResult<&Arc<AttributeLayout>> {
        Ok(self.slot(slot)?.buffer.layout())
    }

    /// Complete records in slot 0.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices staged, three per triangle.
    pub fn element_count(&self) -> u32 {
        self.index_data.len() as u32
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

    /// Whether the mesh currently holds GPU buffers.
    pub fn is_live(&self) -> bool {
        self.index_buffer.is_live()
    }

    /// Staged components of `slot`.
    pub fn vertex_data(&self, slot: usize) -> MeshResult<&[f32]> {
        Ok(self.slot(slot)?.staging.data())
    }

    pub fn index_data(&self) -> &[u32] {
        &self.index_data
    }

    fn slot(&self, slot: usize) -> MeshResult<&Slot> {
        let count = self.slots.len();
        self.slots
            .get(slot)
            .ok_or(MeshError::InvalidSlot { slot, count })
    }

    fn slot_mut(&mut self, slot: usize) -> MeshResult<&mut Slot> {
        let count = self.slots.len();
        self.slots
            .get_mut(slot)
            .ok_or(MeshError::InvalidSlot { slot, count })
    }

    fn ensure_live(&self) -> MeshResult<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(MeshError::GpuBuffersReleased)
        }
    }

    /// Append `value` as the next field of `slot`.
    ///
    /// Returns the index of the completed record when this append finishes a
    /// slot-0 record, otherwise the current vertex count.
    pub fn append_vertex_field<T: VertexValue>(&mut self, slot: usize, value: T) -> MeshResult<u32> {
        let entry = self.slot_mut(slot)?;
        let completed = entry
            .staging
            .push_field(entry.buffer.layout(), slot, &value)?;

        if slot == 0 && completed {
            let index = self.vertex_count;
            self.vertex_count += 1;
            return Ok(index);
        }
        Ok(self.vertex_count)
    }

    /// Append the next field of slot 0.
    pub fn append_vertex<T: VertexValue>(&mut self, value: T) -> MeshResult<u32> {
        self.append_vertex_field(0, value)
    }

    /// Append whole pre-interleaved records to `slot`.
    ///
    /// Returns the vertex count before the append, which is the index of the
    /// first new record when `slot` is 0. Only slot-0 records are counted.
    pub fn append_raw_vertex_data_to(&mut self, slot: usize, values: &[f32]) -> MeshResult<u32> {
        let entry = self.slot_mut(slot)?;
        let added = entry
            .staging
            .extend_raw(entry.buffer.layout(), slot, values)?;

        let first = self.vertex_count;
        if slot == 0 {
            self.vertex_count += added as u32;
        }
        Ok(first)
    }

    /// Append whole pre-interleaved records to slot 0.
    pub fn append_raw_vertex_data(&mut self, values: &[f32]) -> MeshResult<u32> {
        self.append_raw_vertex_data_to(0, values)
    }

    /// Reserve room for `components` more staged values in `slot`.
    pub fn reserve_vertex_data(&mut self, slot: usize, components: usize) -> MeshResult<()> {
        self.slot_mut(slot)?.staging.reserve(components);
        Ok(())
    }

    /// Reserve room for `count` more staged indices.
    pub fn reserve_index_data(&mut self, count: usize) {
        self.index_data.reserve(count);
    }

    /// Staged values `slot` can hold before reallocating.
    pub fn vertex_capacity(&self, slot: usize) -> MeshResult<usize> {
        Ok(self.slot(slot)?.staging.capacity())
    }

    pub fn index_capacity(&self) -> usize {
        self.index_data.capacity()
    }

    /// Drop the staged vertex and index data and reset the counts.
    ///
    /// GPU buffers and their contents are left alone, so a later draw still
    /// uses the last flush. Each slot may pick a new append mode.
    pub fn clear_staging(&mut self) {
        for slot in &mut self.slots {
            slot.staging.clear();
        }
        self.index_data.clear();
        self.vertex_count = 0;
    }

    /// Append a triangle. Indices are not checked against the vertex count.
    pub fn connect_vertices(&mut self, i0: u32, i1: u32, i2: u32) {
        self.index_data.extend_from_slice(&[i0, i1, i2]);
    }

    /// Replace the first field of record `record` in `slot`.
    pub fn overwrite_vertex_field<T: VertexValue>(
        &mut self,
        slot: usize,
        record: usize,
        value: T,
    ) -> MeshResult<()> {
        self.overwrite_vertex_field_at(slot, record, 0, value)
    }

    /// Replace field `field` of record `record` in `slot`.
    pub fn overwrite_vertex_field_at<T: VertexValue>(
        &mut self,
        slot: usize,
        record: usize,
        field: usize,
        value: T,
    ) -> MeshResult<()> {
        let entry = self.slot_mut(slot)?;
        let range = field_range::<T>(entry, slot, record, field)?;
        value.write(&mut entry.staging.data_mut()[range]);
        Ok(())
    }

    /// Read field `field` of record `record` in `slot` back from staging.
    pub fn vertex<T: VertexValue>(&self, slot: usize, record: usize, field: usize) -> MeshResult<T> {
        let entry = self.slot(slot)?;
        let range = field_range::<T>(entry, slot, record, field)?;
        Ok(T::read(&entry.staging.data()[range]))
    }

    /// Upload every non-empty slot to its vertex buffer.
    pub fn flush_vertex_data(&self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.ensure_live()?;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.staging.is_empty() {
                log::info!("Slot {} has no vertex data to flush", index);
                continue;
            }
            let layout = slot.buffer.layout();
            let complete = slot.staging.record_count(layout) * layout.component_count();
            let data = slot.staging.data();
            if complete < data.len() {
                log::debug!(
                    "Slot {} has a partially written record, flushing {} of {} components",
                    index,
                    complete,
                    data.len()
                );
            }
            slot.buffer
                .upload(backend, bytemuck::cast_slice(&data[..complete]))?;
        }
        Ok(())
    }

    /// Upload the staged indices, if any.
    pub fn flush_index_data(&self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.ensure_live()?;
        if self.index_data.is_empty() {
            return Ok(());
        }
        self.index_buffer.upload(backend, &self.index_data)
    }

    /// Upload all staged vertex and index data.
    pub fn flush(&self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.flush_vertex_data(backend)?;
        self.flush_index_data(backend)
    }

    /// Start over: drop staged data, reset the counts and replace the GPU
    /// buffers with fresh empty ones. Slots and layouts are kept.
    pub fn new_mesh(&mut self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.clear_staging();
        self.recreate_gpu_buffers(backend)
    }

    /// Return the GPU buffers to the backend.
    ///
    /// Staged data is kept. Flushes and draws fail with
    /// [`MeshError::GpuBuffersReleased`] until
    /// [`DynamicMesh::recreate_gpu_buffers`] is called.
    pub fn clear_gpu_buffers(&mut self, backend: &mut dyn GraphicsBackend) {
        for slot in &mut self.slots {
            slot.buffer.release(backend);
        }
        self.index_buffer.release(backend);
        self.vertex_array.clear();
    }

    /// Create fresh GPU buffers for every slot and rebind them.
    pub fn recreate_gpu_buffers(&mut self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.index_buffer.recreate(backend)?;
        for slot in &mut self.slots {
            slot.buffer.recreate(backend)?;
        }

        self.vertex_array.clear();
        self.vertex_array.set_index_buffer(&self.index_buffer)?;
        for slot in &self.slots {
            self.vertex_array.add_vertex_buffer(&slot.buffer)?;
        }
        log::debug!("Recreated GPU buffers for {} slots", self.slots.len());
        Ok(())
    }

    /// Indexed draw over every staged index.
    pub fn draw_indexed(&self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.ensure_live()?;
        self.vertex_array
            .draw_indexed(backend, self.topology, 0..self.element_count())
    }

    /// Non-indexed draw over every vertex.
    pub fn draw_arrays(&self, backend: &mut dyn GraphicsBackend) -> MeshResult<()> {
        self.draw_arrays_with(backend, self.topology)
    }

    /// Non-indexed draw with a one-off topology.
    pub fn draw_arrays_with(
        &self,
        backend: &mut dyn GraphicsBackend,
        topology: PrimitiveTopology,
    ) -> MeshResult<()> {
        self.ensure_live()?;
        self.vertex_array
            .draw_arrays(backend, topology, 0..self.vertex_count)
    }

    /// Release the GPU buffers and drop the mesh.
    pub fn destroy(mut self, backend: &mut dyn GraphicsBackend) {
        self.clear_gpu_buffers(backend);
    }
}

impl Drop for DynamicMesh {
    fn drop(&mut self) {
        if self.is_live() {
            log::debug!("DynamicMesh dropped with live GPU buffers; the backend frees them on shutdown");
        }
    }
}

/// Component range of one field of one complete staged record.
fn field_range<T: VertexValue>(
    slot: &Slot,
    index: usize,
    record: usize,
    field: usize,
) -> MeshResult<std::ops::Range<usize>> {
    let layout = slot.buffer.layout();
    let element = layout.element(field).ok_or(MeshError::IndexOutOfRange {
        index: field,
        len: layout.field_count(),
    })?;
    if element.component_count() != T::COMPONENTS {
        return Err(MeshError::FieldMismatch {
            slot: index,
            field,
            name: element.name().to_string(),
            expected: element.component_count(),
            found: T::COMPONENTS,
        });
    }

    let records = slot.staging.record_count(layout);
    if record >= records {
        return Err(MeshError::IndexOutOfRange {
            index: record,
            len: records,
        });
    }

    let start = record * layout.component_count() + element.component_offset();
    Ok(start..start + T::COMPONENTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use crate::mesh::layout::{LayoutElement, ShaderDataType};
    use glam::{Vec2, Vec3};

    fn color_mesh(backend: &mut DummyBackend) -> DynamicMesh {
        let layout = AttributeLayout::new([
            LayoutElement::new(ShaderDataType::Float3, "position"),
            LayoutElement::new(ShaderDataType::Float3, "color"),
        ])
        .unwrap();
        DynamicMesh::with_layout(backend, layout).unwrap()
    }

    #[test]
    fn test_incomplete_record_returns_current_count() {
        let mut backend = DummyBackend::new();
        let mut mesh = color_mesh(&mut backend);

        assert_eq!(mesh.append_vertex(Vec3::ZERO).unwrap(), 0);
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.append_vertex(Vec3::ONE).unwrap(), 0);
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.append_vertex(Vec3::ZERO).unwrap(), 1);
        assert_eq!(mesh.vertex_count(), 1);
    }

    #[test]
    fn test_other_slots_do_not_complete_records() {
        let mut backend = DummyBackend::new();
        let mut mesh = DynamicMesh::new(&mut backend).unwrap();
        let uv = mesh
            .create_vertex_buffer(
                &mut backend,
                AttributeLayout::new([LayoutElement::new(ShaderDataType::Float2, "uv")]).unwrap(),
            )
            .unwrap();
        assert_eq!(uv, 1);

        assert_eq!(mesh.append_vertex_field(uv, Vec2::ONE).unwrap(), 0);
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.append_vertex(Vec3::X).unwrap(), 0);
        assert_eq!(mesh.append_vertex_field(uv, Vec2::ZERO).unwrap(), 1);
        assert_eq!(mesh.vertex_data(uv).unwrap(), &[1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_invalid_slot() {
        let mut backend = DummyBackend::new();
        let mut mesh = DynamicMesh::new(&mut backend).unwrap();

        assert!(matches!(
            mesh.append_vertex_field(3, Vec3::ZERO),
            Err(MeshError::InvalidSlot { slot: 3, count: 1 })
        ));
        assert!(matches!(
            mesh.vertex_data(1),
            Err(MeshError::InvalidSlot { slot: 1, count: 1 })
        ));
    }

    #[test]
    fn test_overwrite_checks_bounds() {
        let mut backend = DummyBackend::new();
        let mut mesh = color_mesh(&mut backend);
        mesh.append_vertex(Vec3::ZERO).unwrap();
        mesh.append_vertex(Vec3::ZERO).unwrap();

        mesh.overwrite_vertex_field_at(0, 0, 1, Vec3::new(0.5, 0.25, 1.0))
            .unwrap();
        assert_eq!(
            mesh.vertex::<Vec3>(0, 0, 1).unwrap(),
            Vec3::new(0.5, 0.25, 1.0)
        );
        assert_eq!(mesh.vertex_count(), 1);

        assert!(matches!(
            mesh.overwrite_vertex_field(0, 1, Vec3::ONE),
            Err(MeshError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(
            mesh.overwrite_vertex_field_at(0, 0, 2, Vec3::ONE),
            Err(MeshError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            mesh.overwrite_vertex_field(0, 0, Vec2::ONE),
            Err(MeshError::FieldMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_raw_append_counts_records() {
        let mut backend = DummyBackend::new();
        let layout = AttributeLayout::new([
            LayoutElement::new(ShaderDataType::Float3, "position"),
            LayoutElement::new(ShaderDataType::Float2, "uv"),
        ])
        .unwrap();
        let mut mesh = DynamicMesh::with_layout(&mut backend, layout).unwrap();

        let first = mesh.append_raw_vertex_data(&[0.0; 15]).unwrap();
        assert_eq!(first, 0);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.append_raw_vertex_data(&[0.0; 5]).unwrap(), 3);

        assert!(matches!(
            mesh.append_vertex(Vec3::ZERO),
            Err(MeshError::MixedAppendModes { slot: 0, .. })
        ));
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_raw_append_to_other_slot_keeps_vertex_count() {
        let mut backend = DummyBackend::new();
        let mut mesh = DynamicMesh::new(&mut backend).unwrap();
        let uv = mesh
            .create_vertex_buffer(
                &mut backend,
                AttributeLayout::new([LayoutElement::new(ShaderDataType::Float2, "uv")]).unwrap(),
            )
            .unwrap();

        for x in [0.0, 1.0, 0.5] {
            mesh.append_vertex(Vec3::new(x, 0.0, 0.0)).unwrap();
        }
        assert_eq!(mesh.append_raw_vertex_data_to(uv, &[0.0; 6]).unwrap(), 3);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_rejected_first_append_leaves_mode_open() {
        let mut backend = DummyBackend::new();
        let mut mesh = DynamicMesh::new(&mut backend).unwrap();

        assert!(matches!(
            mesh.append_raw_vertex_data(&[0.5]),
            Err(MeshError::PartialRecord { len: 1, record: 3 })
        ));
        assert_eq!(mesh.append_vertex(Vec3::ONE).unwrap(), 0);
        assert_eq!(mesh.vertex_count(), 1);

        let mut other = DynamicMesh::new(&mut backend).unwrap();
        assert!(matches!(
            other.append_vertex(Vec2::ONE),
            Err(MeshError::FieldMismatch { .. })
        ));
        assert_eq!(other.append_raw_vertex_data(&[0.0; 3]).unwrap(), 0);
        assert_eq!(other.vertex_count(), 1);
    }

    #[test]
    fn test_reserve_grows_capacity_only() {
        let mut backend = DummyBackend::new();
        let mut mesh = color_mesh(&mut backend);

        mesh.reserve_vertex_data(0, 600).unwrap();
        mesh.reserve_index_data(300);
        assert!(mesh.vertex_capacity(0).unwrap() >= 600);
        assert!(mesh.index_capacity() >= 300);
        assert!(mesh.vertex_data(0).unwrap().is_empty());
        assert_eq!(mesh.vertex_count(), 0);

        mesh.append_vertex(Vec3::ONE).unwrap();
        mesh.append_vertex(Vec3::ONE).unwrap();
        assert!(mesh.vertex_capacity(0).unwrap() >= 600);

        assert!(matches!(
            mesh.reserve_vertex_data(1, 10),
            Err(MeshError::InvalidSlot { slot: 1, count: 1 })
        ));
    }

    #[test]
    fn test_clear_staging_keeps_gpu_buffers() {
        let mut backend = DummyBackend::new();
        let mut mesh = color_mesh(&mut backend);
        mesh.append_raw_vertex_data(&[1.0; 18]).unwrap();
        mesh.append_vertex(Vec3::ONE).unwrap_err();
        mesh.connect_vertices(0, 1, 2);
        mesh.flush(&mut backend).unwrap();
        let input = mesh.vertex_array().input().clone();

        mesh.clear_staging();
        assert!(mesh.is_live());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.element_count(), 0);
        assert!(mesh.vertex_data(0).unwrap().is_empty());
        assert_eq!(mesh.vertex_array().input(), &input);
        assert_eq!(backend.buffer_size(input.buffers[0]), Some(72));
        assert_eq!(backend.live_buffer_count(), 2);

        // The slot may switch protocol, and a partial record starts over.
        mesh.append_vertex(Vec3::ZERO).unwrap();
        mesh.clear_staging();
        assert_eq!(mesh.append_vertex(Vec3::ZERO).unwrap(), 0);
        assert_eq!(mesh.append_vertex(Vec3::ONE).unwrap(), 0);
        assert_eq!(mesh.vertex_count(), 1);
    }

    #[test]
    fn test_flush_skips_partial_record() {
        let mut backend = DummyBackend::new();
        let mut mesh = color_mesh(&mut backend);
        mesh.append_vertex(Vec3::ONE).unwrap();
        mesh.append_vertex(Vec3::ONE).unwrap();
        mesh.append_vertex(Vec3::ZERO).unwrap();

        mesh.flush(&mut backend).unwrap();

        let handle = mesh.vertex_array().input().buffers[0];
        assert_eq!(backend.buffer_size(handle), Some(24));
        assert_eq!(mesh.vertex_data(0).unwrap().len(), 9);
    }

    #[test]
    fn test_clear_gpu_buffers_blocks_flush_until_recreated() {
        let mut backend = DummyBackend::new();
        let mut mesh = DynamicMesh::new(&mut backend).unwrap();
        mesh.append_vertex(Vec3::ONE).unwrap();

        mesh.clear_gpu_buffers(&mut backend);
        assert_eq!(backend.live_buffer_count(), 0);
        assert!(matches!(
            mesh.flush(&mut backend),
            Err(MeshError::GpuBuffersReleased)
        ));
        assert!(matches!(
            mesh.draw_arrays(&mut backend),
            Err(MeshError::GpuBuffersReleased)
        ));

        mesh.recreate_gpu_buffers(&mut backend).unwrap();
        mesh.flush(&mut backend).unwrap();
        assert_eq!(backend.live_buffer_count(), 2);
        assert_eq!(mesh.vertex_data(0).unwrap(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut backend = DummyBackend::new();
        let mut mesh = DynamicMesh::new(&mut backend).unwrap();
        mesh.create_vertex_buffer(&mut backend, AttributeLayout::default())
            .unwrap();
        assert_eq!(backend.live_buffer_count(), 3);

        mesh.destroy(&mut backend);
        assert_eq!(backend.live_buffer_count(), 0);
    }
}
