//! Triangle meshes and the pieces they are built from.
//!
//! - [`AttributeLayout`]: typed fields of one vertex record
//! - [`VertexBuffer`] / [`IndexBuffer`]: GPU buffer handles
//! - [`VertexArray`]: binding of buffers to shader locations
//! - [`DynamicMesh`]: host staging with incremental appends and flushes
//! - [`StaticMesh`]: one-shot uploads of complete arrays

pub mod buffer;
pub mod dynamic_mesh;
pub mod layout;
pub mod staging;
pub mod static_mesh;
pub mod vertex;
pub mod vertex_array;

pub use buffer::{IndexBuffer, VertexBuffer};
pub use dynamic_mesh::DynamicMesh;
pub use layout::{AttributeLayout, LayoutElement, ShaderDataType};
pub use staging::AppendMode;
pub use static_mesh::StaticMesh;
pub use vertex::VertexValue;
pub use vertex_array::VertexArray;
