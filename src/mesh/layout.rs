//! Attribute layouts for vertex records.
//!
//! An [`AttributeLayout`] describes one vertex record: an ordered list of typed
//! fields, each field's byte offset inside the record and the record stride.
//! Offsets are a strict prefix sum of the field sizes and are computed once,
//! when the layout is built. Every component is 32 bits wide.
//!
//! Layouts are shared via `Arc` between a mesh slot and its GPU buffer.
//!
//! # Example
//!
//! ```
//! use meshbuf::mesh::{AttributeLayout, LayoutElement, ShaderDataType};
//!
//! let layout = AttributeLayout::new([
//!     LayoutElement::new(ShaderDataType::Float3, "position"),
//!     LayoutElement::new(ShaderDataType::Float3, "color"),
//! ])
//! .unwrap();
//!
//! assert_eq!(layout.stride(), 24);
//! assert_eq!(layout.elements()[1].offset(), 12);
//! ```

use crate::error::{MeshError, MeshResult};

/// Type of one field of a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
    /// Three columns of three floats.
    Mat3,
    /// Four columns of four floats.
    Mat4,
    /// Stored as a 32-bit float, 1.0 or 0.0.
    Bool,
}

impl ShaderDataType {
    /// Number of 32-bit components in one value of this type.
    pub fn component_count(&self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Bool => 1,
            Self::Float2 | Self::Int2 => 2,
            Self::Float3 | Self::Int3 => 3,
            Self::Float4 | Self::Int4 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.component_count() * 4
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Self::Mat3 | Self::Mat4)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int | Self::Int2 | Self::Int3 | Self::Int4)
    }
}

/// One named field of a vertex record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutElement {
    name: String,
    data_type: ShaderDataType,
    normalized: bool,
    offset: usize,
}

impl LayoutElement {
    pub fn new(data_type: ShaderDataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type,
            normalized: false,
            offset: 0,
        }
    }

    /// Ask the pipeline to normalize this field when reading it.
    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> ShaderDataType {
        self.data_type
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Byte offset inside the record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.data_type.size()
    }

    pub fn component_count(&self) -> usize {
        self.data_type.component_count()
    }

    /// Index of the first component of this field inside a record.
    pub fn component_offset(&self) -> usize {
        self.offset / 4
    }
}

/// Description of one vertex record: fields, offsets and stride.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeLayout {
    elements: Vec<LayoutElement>,
    stride: usize,
}

impl AttributeLayout {
    /// Build a layout, computing every element's offset and the stride.
    pub fn new(elements: impl IntoIterator<Item = LayoutElement>) -> MeshResult<Self> {
        let mut elements: Vec<LayoutElement> = elements.into_iter().collect();
        if elements.is_empty() {
            return Err(MeshError::EmptyLayout);
        }

        let mut offset = 0;
        for element in &mut elements {
            element.offset = offset;
            offset += element.size();
        }

        Ok(Self {
            elements,
            stride: offset,
        })
    }

    /// Single Float3 `position` field.
    pub fn position_only() -> Self {
        let position = LayoutElement::new(ShaderDataType::Float3, "position");
        Self {
            stride: position.size(),
            elements: vec![position],
        }
    }

    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Option<&LayoutElement> {
        self.elements.get(index)
    }

    /// Record size in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of fields in one record.
    pub fn field_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of 32-bit components in one record.
    pub fn component_count(&self) -> usize {
        self.stride / 4
    }

    pub fn has_matrix(&self) -> bool {
        self.elements.iter().any(|e| e.data_type.is_matrix())
    }
}

impl Default for AttributeLayout {
    fn default() -> Self {
        Self::position_only()
    }
}
