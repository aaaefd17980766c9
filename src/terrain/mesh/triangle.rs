// ============================================
// Mesh Records - Треугольники, якоря растительности, меш чанка
// ============================================

use serde::{Deserialize, Serialize};
use ultraviolet::Vec3;

/// Треугольник с собственными тремя вершинами (без общих индексов)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
pub struct Triangle {
    pub a: [f32; 3],
    pub b: [f32; 3],
    pub c: [f32; 3],
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a: a.into(), b: b.into(), c: c.into() }
    }

    #[inline]
    pub fn vertices(&self) -> [Vec3; 3] {
        [Vec3::from(self.a), Vec3::from(self.b), Vec3::from(self.c)]
    }

    /// Ненормированная нормаль (длина = удвоенная площадь)
    #[inline]
    pub fn cross(&self) -> Vec3 {
        let [a, b, c] = self.vertices();
        (b - a).cross(c - a)
    }

    pub fn normal(&self) -> Vec3 {
        let n = self.cross();
        let len = n.mag();
        if len > f32::EPSILON { n / len } else { Vec3::zero() }
    }

    pub fn centroid(&self) -> Vec3 {
        let [a, b, c] = self.vertices();
        (a + b + c) / 3.0
    }

    pub fn is_degenerate(&self) -> bool {
        self.cross().mag_sq() <= f32::EPSILON * f32::EPSILON
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        let [a, b, c] = self.vertices();
        Self::new(a + offset, b + offset, c + offset)
    }
}

/// Точка поверхности для посадки растительности.
/// `dot` = normal·up: 1 на ровном полу, 0 на вертикальной стене.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
pub struct VegetationAnchor {
    pub position: [f32; 3],
    pub dot: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Рендерный меш чанка: по 3 вершины на треугольник, индексы подряд
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMesh {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut vertices = Vec::with_capacity(triangles.len() * 3);
        let mut indices = Vec::with_capacity(triangles.len() * 3);

        for tri in triangles {
            let normal: [f32; 3] = tri.normal().into();
            for position in [tri.a, tri.b, tri.c] {
                indices.push(vertices.len() as u32);
                vertices.push(TerrainVertex { position, normal });
            }
        }

        Self { vertices, indices }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Позиции вершин как плоский байтовый буфер (для выгрузки в рендер)
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
