// ============================================
// Isosurface Extractor - Marching Cubes по плотностному полю
// ============================================
//
// Один проход на ячейку: индекс куба -> рёбра -> интерполяция -> треугольники.
// Поле раскладывается на z-срезы, каждый срез пишет в свои append-буферы,
// затем буферы сливаются в порядке срезов.

use ultraviolet::Vec3;

use crate::terrain::dispatch::{AppendBuffer, Dispatch};
use crate::terrain::generation::DensityField;

use super::tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use super::triangle::{Triangle, VegetationAnchor};

/// Максимум треугольников в одной ячейке для канонической таблицы
pub const MAX_TRIANGLES_PER_CELL: usize = 5;

/// Результат извлечения (только реально записанные элементы)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractionOutput {
    pub triangles: Vec<Triangle>,
    pub anchors: Vec<VegetationAnchor>,
}

impl ExtractionOutput {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct IsosurfaceExtractor {
    max_triangles_per_voxel: usize,
    dispatch: Dispatch,
    up: Vec3,
}

impl Default for IsosurfaceExtractor {
    fn default() -> Self {
        Self::new(MAX_TRIANGLES_PER_CELL, Dispatch::default())
    }
}

impl IsosurfaceExtractor {
    /// Ёмкость меньше табличного максимума обрезала бы вывод: это ошибка конфигурации
    pub fn new(max_triangles_per_voxel: usize, dispatch: Dispatch) -> Self {
        assert!(
            max_triangles_per_voxel >= MAX_TRIANGLES_PER_CELL,
            "max_triangles_per_voxel {} is below the marching cubes bound {}",
            max_triangles_per_voxel, MAX_TRIANGLES_PER_CELL
        );
        Self { max_triangles_per_voxel, dispatch, up: Vec3::unit_y() }
    }

    /// Опорный вектор "вверх" для dot у якорей
    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up.normalized();
        self
    }

    #[inline]
    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Худший случай по числу треугольников для поля
    #[inline]
    pub fn triangle_capacity(&self, field: &DensityField) -> usize {
        field.voxel_count() * self.max_triangles_per_voxel
    }

    /// Извлечь изоповерхность. Позиции в локальных координатах чанка × scale.
    pub fn extract(&self, field: &DensityField, iso_level: f32, scale: f32) -> ExtractionOutput {
        let voxels = field.voxels_per_axis();
        let slab_cells = (voxels as usize) * (voxels as usize);
        let max_per_cell = self.max_triangles_per_voxel;

        let slabs = self.dispatch.map_slices(voxels, |z| {
            let mut triangles = AppendBuffer::with_capacity(slab_cells * max_per_cell);
            let mut anchors = AppendBuffer::with_capacity(slab_cells);
            for y in 0..voxels {
                for x in 0..voxels {
                    self.march_cell(field, [x, y, z], iso_level, scale, &mut triangles, &mut anchors);
                }
            }
            (triangles, anchors)
        });

        let mut triangles = AppendBuffer::with_capacity(self.triangle_capacity(field));
        let mut anchors = AppendBuffer::with_capacity(field.voxel_count());
        for (slab_triangles, slab_anchors) in slabs {
            triangles.extend(slab_triangles);
            anchors.extend(slab_anchors);
        }

        ExtractionOutput {
            triangles: triangles.into_vec(),
            anchors: anchors.into_vec(),
        }
    }

    fn march_cell(
        &self,
        field: &DensityField,
        cell: [u32; 3],
        iso_level: f32,
        scale: f32,
        triangles: &mut AppendBuffer<Triangle>,
        anchors: &mut AppendBuffer<VegetationAnchor>,
    ) {
        let mut corners = [0.0f32; 8];
        let mut cube_index = 0usize;
        for (i, offset) in CORNER_OFFSETS.iter().enumerate() {
            corners[i] = field.get(cell[0] + offset[0], cell[1] + offset[1], cell[2] + offset[2]);
            if corners[i] > iso_level {
                cube_index |= 1 << i;
            }
        }

        let edges = EDGE_TABLE[cube_index];
        if edges == 0 {
            return;
        }

        let mut points = [Vec3::zero(); 12];
        for (e, pair) in EDGE_CORNERS.iter().enumerate() {
            if edges & (1 << e) == 0 {
                continue;
            }
            let p1 = corner_position(cell, pair[0]);
            let p2 = corner_position(cell, pair[1]);
            points[e] = interpolate_edge(p1, p2, corners[pair[0]], corners[pair[1]], iso_level) * scale;
        }

        let row = &TRI_TABLE[cube_index];
        let mut first = true;
        for tri in row.chunks_exact(3) {
            if tri[0] < 0 {
                break;
            }
            // Обратный порядок обхода: лицевая сторона смотрит из твёрдого
            let triangle = Triangle::new(
                points[tri[2] as usize],
                points[tri[1] as usize],
                points[tri[0] as usize],
            );
            triangles.append(triangle);

            if first {
                anchors.append(VegetationAnchor {
                    position: triangle.centroid().into(),
                    dot: triangle.normal().dot(self.up),
                });
            }
            first = false;
        }
    }
}

#[inline]
fn corner_position(cell: [u32; 3], corner: usize) -> Vec3 {
    let o = CORNER_OFFSETS[corner];
    Vec3::new((cell[0] + o[0]) as f32, (cell[1] + o[1]) as f32, (cell[2] + o[2]) as f32)
}

/// t = (iso - v1) / (v2 - v1), считается по значениям плотности
#[inline]
pub fn interpolate_edge(p1: Vec3, p2: Vec3, v1: f32, v2: f32, iso_level: f32) -> Vec3 {
    let delta = v2 - v1;
    let t = if delta.abs() > f32::EPSILON { (iso_level - v1) / delta } else { 0.5 };
    p1 + (p2 - p1) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    fn sequential() -> IsosurfaceExtractor {
        IsosurfaceExtractor::new(MAX_TRIANGLES_PER_CELL, Dispatch::Sequential)
    }

    #[test]
    fn test_tables_stay_within_cell_bound() {
        for row in TRI_TABLE.iter() {
            let count = row.iter().take_while(|&&e| e >= 0).count();
            assert_eq!(count % 3, 0);
            assert!(count / 3 <= MAX_TRIANGLES_PER_CELL);
        }
    }

    #[test]
    #[should_panic(expected = "below the marching cubes bound")]
    fn test_cap_below_table_maximum_panics() {
        IsosurfaceExtractor::new(1, Dispatch::Sequential);
    }

    #[test]
    fn test_every_table_triangle_is_emitted() {
        // Два противоположных угла: ячейка с двумя треугольниками
        let mut field = DensityField::filled(2, 0.2);
        field.set(0, 0, 0, 0.8);
        field.set(1, 1, 1, 0.8);
        let out = sequential().extract(&field, 0.5, 1.0);
        assert_eq!(out.triangle_count(), 2);
        assert_eq!(out.anchor_count(), 1);
    }

    #[test]
    fn test_all_below_iso_is_empty() {
        let field = DensityField::filled(6, 0.3);
        let out = sequential().extract(&field, 0.5, 1.0);
        assert!(out.is_empty());
        assert_eq!(out.anchor_count(), 0);
    }

    #[test]
    fn test_all_above_iso_is_empty() {
        let field = DensityField::filled(6, 0.9);
        assert!(sequential().extract(&field, 0.5, 1.0).is_empty());
    }

    #[test]
    fn test_single_corner_hand_computed() {
        let mut field = DensityField::filled(2, 0.2);
        field.set(0, 0, 0, 0.8);

        let out = sequential().extract(&field, 0.5, 1.0);
        assert_eq!(out.triangle_count(), 1);
        assert_eq!(out.anchor_count(), 1);

        // Строка таблицы [0, 8, 3], вывод в обратном порядке: рёбра 3, 8, 0
        let tri = out.triangles[0];
        assert!(approx(tri.a, [0.0, 0.5, 0.0]));
        assert!(approx(tri.b, [0.0, 0.0, 0.5]));
        assert!(approx(tri.c, [0.5, 0.0, 0.0]));

        // Нормаль смотрит от твёрдого угла
        let n = tri.normal();
        assert!(n.x > 0.0 && n.y > 0.0 && n.z > 0.0);

        let anchor = out.anchors[0];
        assert!(approx(anchor.position, [1.0 / 6.0, 1.0 / 6.0, 1.0 / 6.0]));
    }

    #[test]
    fn test_interpolation_uses_density_values() {
        let p = interpolate_edge(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0), 0.2, 0.8, 0.5);
        assert!((p.x - 0.5).abs() < 1e-6);
        let q = interpolate_edge(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0), 0.3, 0.9, 0.5);
        assert!((q.x - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_solid_sample_stays_in_its_cells() {
        let scale = 2.0;
        let mut field = DensityField::filled(5, 0.3);
        field.set(2, 2, 2, 0.9);

        let out = sequential().extract(&field, 0.5, scale);
        assert_eq!(out.triangle_count(), 8);
        assert_eq!(out.anchor_count(), 8);

        for tri in &out.triangles {
            assert!(!tri.is_degenerate());
            for v in tri.vertices() {
                for axis in [v.x, v.y, v.z] {
                    assert!(axis >= 1.0 * scale - 1e-5 && axis <= 3.0 * scale + 1e-5);
                }
                // Каждая вершина на 2/3 пути от твёрдого сэмпла к соседу
                let d = (v - Vec3::new(2.0, 2.0, 2.0) * scale).mag();
                assert!((d - 2.0 / 3.0 * scale).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_anchor_dot_points_up_on_floor() {
        // Твёрдый нижний слой: пол с нормалью вверх
        let mut field = DensityField::filled(3, 0.0);
        for z in 0..3 {
            for x in 0..3 {
                field.set(x, 0, z, 1.0);
            }
        }
        let out = sequential().extract(&field, 0.5, 1.0);
        assert!(!out.is_empty());
        for anchor in &out.anchors {
            assert!((anchor.dot - 1.0).abs() < 1e-5);
            assert!((anchor.position[1] - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut field = DensityField::filled(9, 0.0);
        for (i, v) in field.values_mut().iter_mut().enumerate() {
            *v = ((i * 7919) % 101) as f32 / 100.0;
        }
        let seq = sequential().extract(&field, 0.5, 1.5);
        let par = IsosurfaceExtractor::new(MAX_TRIANGLES_PER_CELL, Dispatch::Parallel).extract(&field, 0.5, 1.5);
        assert_eq!(seq, par);
        assert!(seq.triangle_count() <= field.voxel_count() * MAX_TRIANGLES_PER_CELL);
    }

    #[test]
    fn test_reextraction_is_byte_identical() {
        let mut field = DensityField::filled(6, 0.2);
        field.set(1, 1, 1, 0.7);
        field.set(3, 2, 4, 0.95);
        let extractor = IsosurfaceExtractor::default();
        let a = extractor.extract(&field, 0.5, 1.0);
        let b = extractor.extract(&field, 0.5, 1.0);
        assert_eq!(bytemuck::cast_slice::<Triangle, u8>(&a.triangles), bytemuck::cast_slice::<Triangle, u8>(&b.triangles));
    }
}
