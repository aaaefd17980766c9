// ============================================
// Chunk Collider - Поверхность коллизий из треугольников чанка
// ============================================

use rapier3d::prelude::{Collider, ColliderBuilder, Point, Real};
use ultraviolet::Vec3;

use super::triangle::Triangle;

/// Trimesh-коллайдер в мировых координатах (сдвиг = origin чанка).
/// Пустой меш -> None.
pub fn build_collider(triangles: &[Triangle], origin: Vec3) -> Option<Collider> {
    if triangles.is_empty() {
        return None;
    }

    let mut points: Vec<Point<Real>> = Vec::with_capacity(triangles.len() * 3);
    let mut indices: Vec<[u32; 3]> = Vec::with_capacity(triangles.len());

    for tri in triangles {
        let base = points.len() as u32;
        for v in [tri.a, tri.b, tri.c] {
            points.push(Point::new(v[0], v[1], v[2]));
        }
        indices.push([base, base + 1, base + 2]);
    }

    let collider = ColliderBuilder::trimesh(points, indices)
        .translation([origin.x, origin.y, origin.z].into())
        .build();
    Some(collider)
}
