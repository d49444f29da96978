//! Binding of vertex buffers to pipeline input locations.
//!
//! Every field of every added buffer gets the next free shader location, so
//! the fields of buffer 0 occupy locations `0..k` and the fields of buffer 1
//! follow them. Matrix fields take one location per column and make their
//! buffer step once per instance.
//!
//! The array stores only handles and layouts. Draws receive the binding as an
//! explicit [`VertexInput`]; nothing is bound globally.

use std::ops::Range;

use crate::backend::{
    GraphicsBackend, PrimitiveTopology, VertexAttribute, VertexBufferLayout,
    VertexFormat, VertexInput, VertexStepMode,
};
use crate::error::MeshResult;
use crate::mesh::buffer::{IndexBuffer, VertexBuffer};
use crate::mesh::layout::{AttributeLayout, LayoutElement, ShaderDataType};

/// Pipeline format for a non-matrix field, `None` when it has no GPU equivalent.
fn vertex_format(element: &LayoutElement) -> Option<VertexFormat> {
    match (element.data_type(), element.is_normalized()) {
        (ShaderDataType::Float | ShaderDataType::Bool, _) => Some(VertexFormat::Float32),
        (ShaderDataType::Float2, _) => Some(VertexFormat::Float32x2),
        (ShaderDataType::Float3, _) => Some(VertexFormat::Float32x3),
        (ShaderDataType::Float4, _) => Some(VertexFormat::Float32x4),
        (ShaderDataType::Int, false) => Some(VertexFormat::Sint32),
        (ShaderDataType::Int2, false) => Some(VertexFormat::Sint32x2),
        (ShaderDataType::Int3, false) => Some(VertexFormat::Sint32x3),
        (ShaderDataType::Int4, false) => Some(VertexFormat::Sint32x4),
        _ => None,
    }
}

/// Attributes for `layout` starting at `first_location`.
///
/// Returns the buffer layout and the first location left free.
pub fn buffer_layout(layout: &AttributeLayout, first_location: u32) -> (VertexBufferLayout, u32) {
    let mut location = first_location;
    let mut attributes = Vec::with_capacity(layout.field_count());

    for element in layout.elements() {
        let offset = element.offset() as u64;
        match element.data_type() {
            ShaderDataType::Mat3 | ShaderDataType::Mat4 => {
                let (columns, format) = if element.data_type() == ShaderDataType::Mat3 {
                    (3, VertexFormat::Float32x3)
                } else {
                    (4, VertexFormat::Float32x4)
                };
                for column in 0..columns {
                    attributes.push(VertexAttribute {
                        location,
                        format,
                        offset: offset + column * format.size(),
                    });
                    location += 1;
                }
            }
            _ => match vertex_format(element) {
                Some(format) => {
                    attributes.push(VertexAttribute {
                        location,
                        format,
                        offset,
                    });
                    location += 1;
                }
                None => log::warn!(
                    "Unsupported vertex attribute '{}' ({:?}, normalized: {}), not bound",
                    element.name(),
                    element.data_type(),
                    element.is_normalized()
                ),
            },
        }
    }

    let step_mode = if layout.has_matrix() {
        if layout.elements().iter().any(|e| !e.data_type().is_matrix()) {
            log::warn!("Buffer mixes matrix and per-vertex fields; all of it steps per instance");
        }
        VertexStepMode::Instance
    } else {
        VertexStepMode::Vertex
    };

    (
        VertexBufferLayout {
            array_stride: layout.stride() as u64,
            step_mode,
            attributes,
        },
        location,
    )
}

/// Vertex buffers and one index buffer as seen by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct VertexArray {
    input: VertexInput,
    next_location: u32,
}

impl VertexArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every field of `buffer` to the next free locations.
    pub fn add_vertex_buffer(&mut self, buffer: &VertexBuffer) -> MeshResult<()> {
        let handle = buffer.handle()?;
        let (layout, next_location) = buffer_layout(buffer.layout(), self.next_location);
        log::trace!(
            "Binding '{}' to locations {}..{}",
            buffer.label(),
            self.next_location,
            next_location
        );
        self.next_location = next_location;
        self.input.layouts.push(layout);
        self.input.buffers.push(handle);
        Ok(())
    }

    pub fn set_index_buffer(&mut self, buffer: &IndexBuffer) -> MeshResult<()> {
        self.input.index_buffer = Some(buffer.handle()?);
        Ok(())
    }

    pub fn input(&self) -> &VertexInput {
        &self.input
    }

    /// Number of shader locations in use.
    pub fn location_count(&self) -> u32 {
        self.next_location
    }

    pub fn clear(&mut self) {
        self.input = VertexInput::default();
        self.next_location = 0;
    }

    pub fn draw_arrays(
        &self,
        backend: &mut dyn GraphicsBackend,
        topology: PrimitiveTopology,
        vertices: Range<u32>,
    ) -> MeshResult<()> {
        backend.draw(&self.input, topology, vertices)?;
        Ok(())
    }

    pub fn draw_indexed(
        &self,
        backend: &mut dyn GraphicsBackend,
        topology: PrimitiveTopology,
        indices: Range<u32>,
    ) -> MeshResult<()> {
        backend.draw_indexed(&self.input, topology, indices)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use std::sync::Arc;

    #[test]
    fn test_locations_run_across_buffers() {
        let mut backend = DummyBackend::new();
        let first = AttributeLayout::new([
            LayoutElement::new(ShaderDataType::Float3, "position"),
            LayoutElement::new(ShaderDataType::Float3, "color"),
        ])
        .unwrap();
        let second = AttributeLayout::new([LayoutElement::new(ShaderDataType::Float2, "uv")])
            .unwrap();
        let a = VertexBuffer::new(&mut backend, Arc::new(first), "a").unwrap();
        let b = VertexBuffer::new(&mut backend, Arc::new(second), "b").unwrap();

        let mut array = VertexArray::new();
        array.add_vertex_buffer(&a).unwrap();
        array.add_vertex_buffer(&b).unwrap();

        let input = array.input();
        assert_eq!(input.buffers, vec![a.handle().unwrap(), b.handle().unwrap()]);
        let locations: Vec<Vec<(u32, u64)>> = input
            .layouts
            .iter()
            .map(|l| l.attributes.iter().map(|a| (a.location, a.offset)).collect())
            .collect();
        assert_eq!(locations, vec![vec![(0, 0), (1, 12)], vec![(2, 0)]]);
        assert_eq!(input.layouts[0].array_stride, 24);
        assert_eq!(array.location_count(), 3);
    }

    #[test]
    fn test_matrix_expands_per_column_and_steps_per_instance() {
        let layout = AttributeLayout::new([LayoutElement::new(ShaderDataType::Mat4, "model")])
            .unwrap();
        let (buffer, next) = buffer_layout(&layout, 1);

        assert_eq!(next, 5);
        assert_eq!(buffer.step_mode, VertexStepMode::Instance);
        let offsets: Vec<u64> = buffer.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 16, 32, 48]);
        assert!(buffer
            .attributes
            .iter()
            .all(|a| a.format == VertexFormat::Float32x4));
    }

    #[test]
    fn test_matrix_columns_start_at_field_offset() {
        let layout = AttributeLayout::new([
            LayoutElement::new(ShaderDataType::Float, "weight"),
            LayoutElement::new(ShaderDataType::Mat3, "basis"),
        ])
        .unwrap();
        let (buffer, _) = buffer_layout(&layout, 0);

        let offsets: Vec<u64> = buffer.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 4, 16, 28]);
    }

    #[test]
    fn test_unsupported_kind_is_skipped_without_shifting_others() {
        let layout = AttributeLayout::new([
            LayoutElement::new(ShaderDataType::Float3, "position"),
            LayoutElement::new(ShaderDataType::Int4, "bones").normalized(),
            LayoutElement::new(ShaderDataType::Int, "id"),
        ])
        .unwrap();
        let (buffer, next) = buffer_layout(&layout, 0);

        assert_eq!(next, 2);
        assert_eq!(buffer.attributes.len(), 2);
        assert_eq!(buffer.attributes[0].location, 0);
        assert_eq!(buffer.attributes[1].location, 1);
        assert_eq!(buffer.attributes[1].offset, 28);
        assert_eq!(buffer.attributes[1].format, VertexFormat::Sint32);
        assert_eq!(buffer.array_stride, 32);
    }
}
