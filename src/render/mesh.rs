// Scene tessellation: turns the retained scene graph into two vertex batches
// (line list, triangle list) plus the per-frame uniform block.
// Only depends on globe_core/glam/bytemuck so host tests can include it.

use glam::{Mat4, Vec3};
use globe_core::{Layer, Light, Primitive, SceneGraph};
use std::f32::consts::{PI, TAU};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Premultiplied by opacity.
    pub color: [f32; 4],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    #[inline]
    fn new(position: Vec3, normal: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            color,
        }
    }
}

#[inline]
pub fn premultiply(color: [f32; 3], opacity: f32) -> [f32; 4] {
    let a = opacity.clamp(0.0, 1.0);
    [color[0] * a, color[1] * a, color[2] * a, a]
}

/// Point on a sphere for longitude `u` and colatitude `v`, both in 0..=1.
#[inline]
fn sphere_point(u: f32, v: f32) -> Vec3 {
    let phi = u * TAU;
    let theta = v * PI;
    Vec3::new(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin())
}

/// Latitude/longitude wireframe as a line list.
pub fn wireframe_lines(radius: f32, segments: u32, rings: u32, color: [f32; 4], out: &mut Vec<Vertex>) {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let at = |ix: u32, iy: u32| {
        sphere_point(ix as f32 / segments as f32, iy as f32 / rings as f32) * radius
    };
    // parallels, skipping the degenerate poles
    for iy in 1..rings {
        for ix in 0..segments {
            out.push(Vertex::new(at(ix, iy), Vec3::ZERO, color));
            out.push(Vertex::new(at(ix + 1, iy), Vec3::ZERO, color));
        }
    }
    // meridians
    for ix in 0..segments {
        for iy in 0..rings {
            out.push(Vertex::new(at(ix, iy), Vec3::ZERO, color));
            out.push(Vertex::new(at(ix, iy + 1), Vec3::ZERO, color));
        }
    }
}

/// Open polyline as a line list; fewer than two points draws nothing.
pub fn polyline_lines(points: &[Vec3], color: [f32; 4], out: &mut Vec<Vertex>) {
    for pair in points.windows(2) {
        out.push(Vertex::new(pair[0], Vec3::ZERO, color));
        out.push(Vertex::new(pair[1], Vec3::ZERO, color));
    }
}

/// UV sphere as a triangle list with outward normals.
pub fn sphere_triangles(
    center: Vec3,
    radius: f32,
    rings: u32,
    slices: u32,
    color: [f32; 4],
    out: &mut Vec<Vertex>,
) {
    let rings = rings.max(2);
    let slices = slices.max(3);
    let vertex = |ix: u32, iy: u32| {
        let n = sphere_point(ix as f32 / slices as f32, iy as f32 / rings as f32);
        Vertex::new(center + n * radius, n, color)
    };
    for iy in 0..rings {
        for ix in 0..slices {
            let a = vertex(ix, iy);
            let b = vertex(ix, iy + 1);
            let c = vertex(ix + 1, iy + 1);
            let d = vertex(ix + 1, iy);
            // counter-clockwise seen from outside
            if iy != 0 {
                out.extend_from_slice(&[a, b, d]);
            }
            if iy != rings - 1 {
                out.extend_from_slice(&[b, c, d]);
            }
        }
    }
}

/// Number of triangle-list vertices `sphere_triangles` emits.
#[inline]
pub fn sphere_vertex_count(rings: u32, slices: u32) -> usize {
    let rings = rings.max(2) as usize;
    let slices = slices.max(3) as usize;
    slices * (rings - 1) * 2 * 3
}

/// Everything the GPU needs for one frame, in draw order.
#[derive(Debug, Default)]
pub struct SceneBatches {
    pub lines: Vec<Vertex>,
    pub triangles: Vec<Vertex>,
}

impl SceneBatches {
    pub fn clear(&mut self) {
        self.lines.clear();
        self.triangles.clear();
    }

    /// Rebuild from `scene`. Fully transparent primitives and lights are skipped;
    /// only globe-layer drawables are expected, all in group space.
    pub fn rebuild(&mut self, scene: &SceneGraph, marker_rings: u32, marker_slices: u32) {
        self.clear();
        for (_, node) in scene.nodes() {
            if node.layer != Layer::Globe {
                continue;
            }
            match &node.primitive {
                Primitive::Wireframe {
                    radius,
                    segments,
                    rings,
                    color,
                    opacity,
                } if *opacity > 0.0 => {
                    wireframe_lines(*radius, *segments, *rings, premultiply(*color, *opacity), &mut self.lines);
                }
                Primitive::Polyline {
                    points,
                    color,
                    opacity,
                } if *opacity > 0.0 => {
                    polyline_lines(points, premultiply(*color, *opacity), &mut self.lines);
                }
                Primitive::Marker {
                    center,
                    radius,
                    color,
                    opacity,
                } if *opacity > 0.0 => {
                    sphere_triangles(
                        *center,
                        *radius,
                        marker_rings,
                        marker_slices,
                        premultiply(*color, *opacity),
                        &mut self.triangles,
                    );
                }
                _ => {}
            }
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// rgb = colour x intensity, summed over ambient lights.
    pub ambient: [f32; 4],
    /// xyz = unit vector towards the directional light.
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
}

impl Globals {
    pub fn new<'a>(view_proj: Mat4, model: Mat4, lights: impl IntoIterator<Item = &'a Light>) -> Self {
        let mut ambient = Vec3::ZERO;
        let mut light_dir = Vec3::Z;
        let mut light_color = Vec3::ZERO;
        for light in lights {
            match light {
                Light::Ambient { color, intensity } => {
                    ambient += Vec3::from(*color) * *intensity;
                }
                Light::Directional {
                    color,
                    intensity,
                    position,
                } => {
                    light_dir = position.try_normalize().unwrap_or(Vec3::Z);
                    light_color = Vec3::from(*color) * *intensity;
                }
            }
        }
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            ambient: ambient.extend(1.0).to_array(),
            light_dir: light_dir.extend(0.0).to_array(),
            light_color: light_color.extend(1.0).to_array(),
        }
    }
}
