use crate::vulkan::Vertex;
use nalgebra_glm::{Vec2, Vec3, vec2, vec3};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub static MESH_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("{len} floats is not a multiple of the {stride} float stride")]
    BadStride { len: usize, stride: usize },
    #[error("index {index} references a missing vertex (mesh has {vertices})")]
    IndexOutOfRange { index: u32, vertices: usize },
}

/// Attribute sets an interleaved float buffer can carry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VertexLayout {
    Position,
    PositionNormal,
    PositionNormalUv,
}

impl VertexLayout {
    pub fn stride(&self) -> usize {
        match self {
            VertexLayout::Position => 3,
            VertexLayout::PositionNormal => 6,
            VertexLayout::PositionNormalUv => 8,
        }
    }

    fn unpack(&self, chunk: &[f32]) -> Vertex {
        let pos = vec3(chunk[0], chunk[1], chunk[2]);

        let normal = match self {
            VertexLayout::Position => Vec3::zeros(),
            _ => vec3(chunk[3], chunk[4], chunk[5]),
        };

        let uv = match self {
            VertexLayout::PositionNormalUv => vec2(chunk[6], chunk[7]),
            _ => Vec2::zeros(),
        };

        Vertex { pos, normal, uv }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    pub fn to_vec_u32(&self) -> Cow<'_, Vec<u32>> {
        match &self {
            Indices::U16(v) => Cow::Owned(v.iter().map(|&r| r as u32).collect()),
            Indices::U32(v) => Cow::Borrowed(v),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Indices::U16(v) => v.len(),
            Indices::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn max(&self) -> Option<u32> {
        match self {
            Indices::U16(v) => v.iter().max().map(|&m| m as u32),
            Indices::U32(v) => v.iter().max().copied(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        if vertices.is_empty() {
            return Self {
                min: Vec3::zeros(),
                max: Vec3::zeros(),
            };
        }

        let mut min = vec3(f32::MAX, f32::MAX, f32::MAX);
        let mut max = vec3(f32::MIN, f32::MIN, f32::MIN);

        for v in vertices {
            min = nalgebra_glm::min2(&min, &v.pos);
            max = nalgebra_glm::max2(&max, &v.pos);
        }

        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[derive(Debug)]
pub struct MeshResource {
    pub id: u64,
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Option<Indices>,
    pub bounds: Aabb,
}

impl MeshResource {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Option<Indices>) -> Self {
        let bounds = Aabb::from_vertices(&vertices);

        Self {
            id: MESH_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            name: name.into(),
            vertices,
            indices,
            bounds,
        }
    }

    pub fn from_interleaved(
        name: impl Into<String>,
        floats: &[f32],
        layout: VertexLayout,
        indices: Option<Indices>,
    ) -> Result<Self, MeshError> {
        let stride = layout.stride();

        if floats.len() % stride != 0 {
            return Err(MeshError::BadStride {
                len: floats.len(),
                stride,
            });
        }

        let vertices = floats.chunks_exact(stride).map(|c| layout.unpack(c)).collect::<Vec<_>>();

        if let Some(max) = indices.as_ref().and_then(|i| i.max()) {
            if max as usize >= vertices.len() {
                return Err(MeshError::IndexOutOfRange {
                    index: max,
                    vertices: vertices.len(),
                });
            }
        }

        Ok(Self::new(name, vertices, indices))
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Number of elements a draw call submits: indices when present, vertices otherwise.
    pub fn draw_count(&self) -> u32 {
        match &self.indices {
            Some(i) => i.len() as u32,
            None => self.vertices.len() as u32,
        }
    }
}

#[rustfmt::skip]
const CUBE: [f32; 288] = [
    // back
    -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0,
     0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0,
     0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 0.0,
     0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0,
    -0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0,
    -0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 1.0,
    // front
    -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0,
     0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 0.0,
     0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0,
     0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0,
    -0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 1.0,
    -0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0,
    // left
    -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0,
    -0.5,  0.5, -0.5, -1.0,  0.0,  0.0,  1.0, 1.0,
    -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0,
    -0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0,
    -0.5, -0.5,  0.5, -1.0,  0.0,  0.0,  0.0, 0.0,
    -0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0,
    // right
     0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0,
     0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0,
     0.5,  0.5, -0.5,  1.0,  0.0,  0.0,  1.0, 1.0,
     0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0,
     0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0,
     0.5, -0.5,  0.5,  1.0,  0.0,  0.0,  0.0, 0.0,
    // bottom
    -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0,
     0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  1.0, 1.0,
     0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0,
     0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0,
    -0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  0.0, 0.0,
    -0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0,
    // top
    -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0,
     0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0,
     0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  1.0, 1.0,
     0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0,
    -0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0,
    -0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  0.0, 0.0,
];

pub fn cube() -> MeshResource {
    let vertices = CUBE
        .chunks_exact(8)
        .map(|c| VertexLayout::PositionNormalUv.unpack(c))
        .collect();

    MeshResource::new("cube", vertices, None)
}

pub fn sphere(radius: f32, sectors: u32, stacks: u32) -> MeshResource {
    let sectors = sectors.max(3);
    let stacks = stacks.max(2);

    let mut vertices = Vec::with_capacity(((sectors + 1) * (stacks + 1)) as usize);

    for i in 0..=stacks {
        let stack_angle = std::f32::consts::FRAC_PI_2 - std::f32::consts::PI * i as f32 / stacks as f32;
        let xz = stack_angle.cos();
        let y = stack_angle.sin();

        for j in 0..=sectors {
            let sector_angle = 2.0 * std::f32::consts::PI * j as f32 / sectors as f32;
            let normal = vec3(xz * sector_angle.cos(), y, xz * sector_angle.sin());

            vertices.push(Vertex {
                pos: normal * radius,
                normal,
                uv: vec2(j as f32 / sectors as f32, i as f32 / stacks as f32),
            });
        }
    }

    let mut indices = Vec::with_capacity((sectors * stacks * 6) as usize);

    for i in 0..stacks {
        let k1 = i * (sectors + 1);
        let k2 = k1 + sectors + 1;

        for j in 0..sectors {
            if i != 0 {
                indices.extend([k1 + j, k1 + j + 1, k2 + j]);
            }
            if i != stacks - 1 {
                indices.extend([k1 + j + 1, k2 + j + 1, k2 + j]);
            }
        }
    }

    MeshResource::new("sphere", vertices, Some(Indices::U32(indices)))
}

pub fn plane(size: f32) -> MeshResource {
    let h = size * 0.5;
    let up = vec3(0.0, 1.0, 0.0);

    let vertices = vec![
        Vertex {
            pos: vec3(-h, 0.0, -h),
            normal: up,
            uv: vec2(0.0, 1.0),
        },
        Vertex {
            pos: vec3(h, 0.0, -h),
            normal: up,
            uv: vec2(1.0, 1.0),
        },
        Vertex {
            pos: vec3(h, 0.0, h),
            normal: up,
            uv: vec2(1.0, 0.0),
        },
        Vertex {
            pos: vec3(-h, 0.0, h),
            normal: up,
            uv: vec2(0.0, 0.0),
        },
    ];

    MeshResource::new("plane", vertices, Some(Indices::U16(vec![0, 2, 1, 0, 3, 2])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_rejects_bad_stride() {
        let floats = [0.0; 7];
        let res = MeshResource::from_interleaved("bad", &floats, VertexLayout::PositionNormal, None);

        assert!(matches!(res, Err(MeshError::BadStride { len: 7, stride: 6 })));
    }

    #[test]
    fn interleaved_fills_missing_attributes_with_zero() {
        let floats = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mesh = MeshResource::from_interleaved("points", &floats, VertexLayout::Position, None).unwrap();

        assert_eq!(mesh.vertices.len(), 2);
        assert_eq!(mesh.vertices[1].pos, vec3(4.0, 5.0, 6.0));
        assert_eq!(mesh.vertices[1].normal, Vec3::zeros());
        assert_eq!(mesh.vertices[1].uv, Vec2::zeros());
    }

    #[test]
    fn interleaved_rejects_dangling_index() {
        let floats = [0.0; 9];
        let res = MeshResource::from_interleaved(
            "tri",
            &floats,
            VertexLayout::Position,
            Some(Indices::U16(vec![0, 1, 3])),
        );

        assert!(matches!(res, Err(MeshError::IndexOutOfRange { index: 3, vertices: 3 })));
    }

    #[test]
    fn draw_count_follows_indices() {
        let floats = [0.0; 9];
        let plain = MeshResource::from_interleaved("tri", &floats, VertexLayout::Position, None).unwrap();
        assert_eq!(plain.draw_count(), 3);
        assert!(!plain.is_indexed());

        let indexed = MeshResource::from_interleaved(
            "tri",
            &floats,
            VertexLayout::Position,
            Some(Indices::U32(vec![0, 1, 2, 2, 1, 0])),
        )
        .unwrap();
        assert_eq!(indexed.draw_count(), 6);
        assert!(indexed.is_indexed());
    }

    #[test]
    fn ids_are_unique() {
        let a = cube();
        let b = cube();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn cube_is_unit_sized() {
        let mesh = cube();

        assert_eq!(mesh.draw_count(), 36);
        assert_eq!(mesh.bounds.min, vec3(-0.5, -0.5, -0.5));
        assert_eq!(mesh.bounds.max, vec3(0.5, 0.5, 0.5));
        assert!(mesh.vertices.iter().all(|v| (v.normal.norm() - 1.0).abs() < 1e-6));
    }

    #[test]
    fn sphere_indices_are_in_range() {
        let mesh = sphere(2.0, 16, 8);
        let indices = mesh.indices.as_ref().unwrap().to_vec_u32();

        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        assert!(mesh.vertices.iter().all(|v| (v.pos.norm() - 2.0).abs() < 1e-4));
    }

    #[test]
    fn plane_lies_flat() {
        let mesh = plane(4.0);

        assert_eq!(mesh.draw_count(), 6);
        assert_eq!(mesh.bounds.size(), vec3(4.0, 0.0, 4.0));
        assert_eq!(mesh.bounds.center(), Vec3::zeros());
    }

    #[test]
    fn u16_indices_widen() {
        let i = Indices::U16(vec![1, 2, 3]);
        assert_eq!(*i.to_vec_u32(), vec![1, 2, 3]);
        assert_eq!(i.len(), 3);
    }
}
