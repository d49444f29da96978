//! Shared helpers for integration tests.

#![allow(dead_code)]

use meshbuf::backend::dummy::DummyBackend;
use meshbuf::{
    AttributeLayout, LayoutElement, ShaderDataType, ShaderProgram, UniformKind, UniformLayout,
};

/// Position and color program used for recorded draws.
pub const COLOR_SHADER: &str = r#"
struct Uniforms {
    use_color: i32,
    color: vec3<f32>,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if uniforms.use_color != 0 {
        return vec4<f32>(uniforms.color, 1.0);
    }
    return vec4<f32>(in.color, 1.0);
}
"#;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Float3 `position` followed by Float3 `color`.
pub fn color_layout() -> AttributeLayout {
    AttributeLayout::new([
        LayoutElement::new(ShaderDataType::Float3, "position"),
        LayoutElement::new(ShaderDataType::Float3, "color"),
    ])
    .unwrap()
}

pub fn color_program(backend: &mut DummyBackend) -> ShaderProgram {
    let uniforms = UniformLayout::new()
        .with("use_color", UniformKind::Int)
        .with("color", UniformKind::Float3);
    ShaderProgram::new(backend, "color", COLOR_SHADER, uniforms).unwrap()
}

/// Decode little-endian `f32` values from buffer bytes.
pub fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Decode little-endian `u32` values from buffer bytes.
pub fn indices(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
