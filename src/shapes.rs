//! Ready-made colored shapes built on [`DynamicMesh`].
//!
//! Every shape uses the [`color_layout`] (Float3 `position`, Float3 `color`)
//! except [`checker_triangle`], which carries texture coordinates instead.
//! All meshes come back flushed and ready to draw.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::backend::{GraphicsBackend, PrimitiveTopology};
use crate::error::MeshResult;
use crate::mesh::{AttributeLayout, DynamicMesh, LayoutElement, ShaderDataType};

/// Position and color, both Float3.
pub fn color_layout() -> MeshResult<AttributeLayout> {
    AttributeLayout::new([
        LayoutElement::new(ShaderDataType::Float3, "position"),
        LayoutElement::new(ShaderDataType::Float3, "color"),
    ])
}

/// Color at `t` along `colors`, where `t` runs from 0 to `colors.len() - 1`.
fn sample_gradient(colors: &[Vec3], t: f32) -> Vec3 {
    let last = colors.len().saturating_sub(1);
    let start = (t.floor() as usize).min(last);
    let end = (t.ceil() as usize).min(last);
    colors[start].lerp(colors[end], t - start as f32)
}

/// Annulus sector drawn as a triangle strip.
///
/// Each of the `samples` steps from `start_angle` to `end_angle` emits an
/// inner vertex at `inner_radius` and an outer one at `outer_radius`.
pub fn pie(
    backend: &mut dyn GraphicsBackend,
    color: Vec3,
    center: Vec2,
    samples: u32,
    (start_angle, end_angle): (f32, f32),
    (inner_radius, outer_radius): (f32, f32),
) -> MeshResult<DynamicMesh> {
    let mut mesh = DynamicMesh::with_layout(backend, color_layout()?)?;
    mesh.set_topology(PrimitiveTopology::TriangleStrip);

    let range = end_angle - start_angle;
    let denominator = samples.saturating_sub(1).max(1) as f32;
    for i in 0..samples {
        let angle = (i as f32 / denominator) * range + start_angle;
        let direction = Vec2::new(angle.cos(), angle.sin());

        for radius in [inner_radius, outer_radius] {
            mesh.append_vertex((center + direction * radius).extend(0.0))?;
            mesh.append_vertex(color)?;
        }
    }

    mesh.flush_vertex_data(backend)?;
    Ok(mesh)
}

/// Append a quad as two triangles `(p0, p1, p2)` and `(p2, p3, p0)`.
pub fn quad(mesh: &mut DynamicMesh, color: Vec3, points: [Vec3; 4]) -> MeshResult<()> {
    let mut corners = [0u32; 4];
    for (corner, point) in corners.iter_mut().zip(points) {
        mesh.append_vertex(point)?;
        *corner = mesh.append_vertex(color)?;
    }
    let [p0, p1, p2, p3] = corners;
    mesh.connect_vertices(p0, p1, p2);
    mesh.connect_vertices(p2, p3, p0);
    Ok(())
}

/// Hue wheel of radius 0.5 around the origin, drawn as a triangle strip.
pub fn circle(backend: &mut dyn GraphicsBackend) -> MeshResult<DynamicMesh> {
    const SAMPLES: u32 = 360;
    const RADIUS: f32 = 0.5;
    let colors = [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 0.0),
    ];

    let mut mesh = DynamicMesh::with_layout(backend, color_layout()?)?;
    mesh.set_topology(PrimitiveTopology::TriangleStrip);

    let color_step = (colors.len() - 1) as f32 / SAMPLES as f32;
    for i in 0..SAMPLES {
        let color = sample_gradient(&colors, i as f32 * color_step);
        let angle = (i as f32 / (SAMPLES - 1) as f32) * TAU;

        mesh.append_vertex(Vec3::new(angle.cos() * RADIUS, angle.sin() * RADIUS, 0.0))?;
        mesh.append_vertex(color)?;
        mesh.append_vertex(Vec3::ZERO)?;
        mesh.append_vertex(color)?;
    }

    mesh.flush_vertex_data(backend)?;
    Ok(mesh)
}

fn gradient(
    mesh: &mut DynamicMesh,
    steps: u32,
    origin: Vec2,
    size: Vec2,
    colors: [Vec3; 2],
) -> MeshResult<()> {
    let color_step = (colors.len() - 1) as f32 / steps as f32;
    let width = size.x / steps as f32;

    for i in 0..steps {
        let color = sample_gradient(&colors, i as f32 * color_step);
        let x = origin.x + i as f32 * width;
        quad(
            mesh,
            color,
            [
                Vec3::new(x, origin.y, 0.0),
                Vec3::new(x + width, origin.y, 0.0),
                Vec3::new(x + width, origin.y + size.y, 0.0),
                Vec3::new(x, origin.y + size.y, 0.0),
            ],
        )?;
    }
    Ok(())
}

/// Three horizontal bands of ten quads fading from black to red, green and blue.
pub fn gradients(backend: &mut dyn GraphicsBackend) -> MeshResult<DynamicMesh> {
    let mut mesh = DynamicMesh::with_layout(backend, color_layout()?)?;
    let size = Vec2::new(1.6, 0.2);
    let bands = [(0.6, Vec3::X), (0.2, Vec3::Y), (-0.2, Vec3::Z)];

    for (y, target) in bands {
        gradient(&mut mesh, 10, Vec2::new(-0.8, y), size, [Vec3::ZERO, target])?;
    }

    mesh.flush(backend)?;
    Ok(mesh)
}

/// A bar and a ring. The bar is indexed, the ring is a strip.
pub fn logo(backend: &mut dyn GraphicsBackend) -> MeshResult<[DynamicMesh; 2]> {
    let mut bar = DynamicMesh::with_layout(backend, color_layout()?)?;
    quad(
        &mut bar,
        Vec3::ONE,
        [
            Vec3::new(-0.8, 0.8, 0.0),
            Vec3::new(-0.6, 0.8, 0.0),
            Vec3::new(-0.6, -0.8, 0.0),
            Vec3::new(-0.8, -0.8, 0.0),
        ],
    )?;
    bar.flush(backend)?;

    let ring = pie(
        backend,
        Vec3::ONE,
        Vec2::new(0.4, 0.0),
        60,
        (0.0, TAU),
        (0.6, 0.8),
    )?;
    Ok([bar, ring])
}

/// Position and texture coordinates for the checker triangle.
pub fn uv_layout() -> MeshResult<AttributeLayout> {
    AttributeLayout::new([
        LayoutElement::new(ShaderDataType::Float3, "position"),
        LayoutElement::new(ShaderDataType::Float2, "uv"),
    ])
}

/// One triangle with texture coordinates, appended as raw records.
pub fn checker_triangle(backend: &mut dyn GraphicsBackend) -> MeshResult<DynamicMesh> {
    let mut mesh = DynamicMesh::with_layout(backend, uv_layout()?)?;

    #[rustfmt::skip]
    let records = [
        -0.5, -0.5, 0.0,    0.0, 0.0,
         0.5, -0.5, 0.0,    1.0, 0.0,
         0.0,  0.5, 0.0,    0.5, 1.0,
    ];
    mesh.append_raw_vertex_data(&records)?;

    mesh.flush(backend)?;
    Ok(mesh)
}
