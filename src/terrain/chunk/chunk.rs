// ============================================
// Chunk - Плотность, меш, коллизии и растительность одного чанка
// ============================================
//
// Жизненный цикл: generate (или restore из кэша) -> [terraform -> regenerate_mesh]*
// -> into_cache_entry при выходе из окна.

use rapier3d::prelude::Collider;
use ultraviolet::Vec3;

use super::context::ChunkContext;
use crate::terrain::cache::{ChunkCacheEntry, ChunkKey};
use crate::terrain::generation::{density_ceiling, generate_density, BiomeSampleMap, DensityField};
use crate::terrain::mesh::{build_collider, ChunkMesh, Triangle, VegetationAnchor};
use crate::terrain::terraform::TerraformBrush;
use crate::terrain::vegetation::{place_vegetation, VegetationPlacement};

/// Мировой AABB чанка
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ChunkBounds {
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    /// Пересечение со сферой: расстояние от центра до ближайшей точки AABB
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamped(self.min, self.max);
        (closest - center).mag_sq() <= radius * radius
    }
}

pub struct Chunk {
    key: ChunkKey,
    origin: Vec3,
    bounds: ChunkBounds,
    density: DensityField,
    triangles: Vec<Triangle>,
    anchors: Vec<VegetationAnchor>,
    mesh: ChunkMesh,
    collider: Option<Collider>,
    biome_samples: BiomeSampleMap,
    vegetation: Vec<VegetationPlacement>,
}

impl Chunk {
    /// Новый чанк: плотность с нуля, затем извлечение и растительность
    pub fn generate(key: ChunkKey, ctx: &ChunkContext) -> Self {
        let mut density = DensityField::new(ctx.config.chunk_size);
        let biome_samples = generate_density(&mut density, ctx, key);

        let mut chunk = Self::empty(key, ctx, density, biome_samples);
        chunk.regenerate_mesh(ctx);
        chunk.regenerate_vegetation(ctx);
        log::debug!("{} generated: {} triangles, {} plants", chunk.id(), chunk.triangles.len(), chunk.vegetation.len());
        chunk
    }

    /// Чанк из снимка кэша: плотность и меш берутся как есть,
    /// пересобираются только рендерный меш и коллайдер
    pub fn restore(key: ChunkKey, entry: ChunkCacheEntry, ctx: &ChunkContext) -> Self {
        let ChunkCacheEntry { density, triangles, anchors, biome_samples, vegetation } = entry;
        let mut chunk = Self::empty(key, ctx, density, biome_samples);
        chunk.set_surface(triangles, anchors);
        chunk.vegetation = vegetation;
        log::debug!("{} restored from cache", chunk.id());
        chunk
    }

    fn empty(key: ChunkKey, ctx: &ChunkContext, density: DensityField, biome_samples: BiomeSampleMap) -> Self {
        let origin = ctx.chunk_origin(key);
        let extent = ctx.config.chunk_world_size();
        let bounds = ChunkBounds { min: origin, max: origin + Vec3::new(extent, extent, extent) };
        Self {
            key,
            origin,
            bounds,
            density,
            triangles: Vec::new(),
            anchors: Vec::new(),
            mesh: ChunkMesh::default(),
            collider: None,
            biome_samples,
            vegetation: Vec::new(),
        }
    }

    fn set_surface(&mut self, triangles: Vec<Triangle>, anchors: Vec<VegetationAnchor>) {
        self.mesh = ChunkMesh::from_triangles(&triangles);
        self.collider = build_collider(&triangles, self.origin);
        self.triangles = triangles;
        self.anchors = anchors;
    }

    /// Переизвлечь поверхность из текущей плотности
    pub fn regenerate_mesh(&mut self, ctx: &ChunkContext) {
        let output = ctx.extractor.extract(&self.density, ctx.config.iso_level, ctx.config.chunk_scale);
        self.set_surface(output.triangles, output.anchors);
    }

    pub fn regenerate_vegetation(&mut self, ctx: &ChunkContext) {
        self.vegetation = place_vegetation(
            &self.anchors,
            self.origin,
            self.key,
            ctx.config.seed,
            ctx.environment.water_level(),
            &ctx.config.vegetation,
        );
    }

    /// Лепка: меняет плотность и переизвлекает меш (плотность заново не генерируется).
    /// false если кисть не задела ни одного сэмпла.
    pub fn terraform(&mut self, brush: &TerraformBrush, ctx: &ChunkContext, regenerate_vegetation: bool) -> bool {
        let ceiling = density_ceiling(ctx.config.elevation);
        let changed = brush.apply_bounded(&mut self.density, self.origin, ctx.config.chunk_scale, ceiling);
        if changed == 0 {
            return false;
        }
        self.regenerate_mesh(ctx);
        if regenerate_vegetation {
            self.regenerate_vegetation(ctx);
        }
        true
    }

    /// Копия состояния без уничтожения чанка (для сохранения на диск)
    pub fn snapshot(&self) -> ChunkCacheEntry {
        ChunkCacheEntry {
            density: self.density.clone(),
            triangles: self.triangles.clone(),
            anchors: self.anchors.clone(),
            biome_samples: self.biome_samples.clone(),
            vegetation: self.vegetation.clone(),
        }
    }

    /// Снимок для кэша (чанк уничтожается)
    pub fn into_cache_entry(self) -> ChunkCacheEntry {
        ChunkCacheEntry {
            density: self.density,
            triangles: self.triangles,
            anchors: self.anchors,
            biome_samples: self.biome_samples,
            vegetation: self.vegetation,
        }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    pub fn id(&self) -> String {
        self.key.id()
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn bounds(&self) -> ChunkBounds {
        self.bounds
    }

    pub fn density(&self) -> &DensityField {
        &self.density
    }

    /// Треугольники в локальных координатах
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn world_triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.triangles.iter().map(move |t| t.translated(self.origin))
    }

    pub fn anchors(&self) -> &[VegetationAnchor] {
        &self.anchors
    }

    pub fn mesh(&self) -> &ChunkMesh {
        &self.mesh
    }

    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    pub fn biome_samples(&self) -> &BiomeSampleMap {
        &self.biome_samples
    }

    pub fn vegetation(&self) -> &[VegetationPlacement] {
        &self.vegetation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceConfig;
    use crate::terrain::terraform::TerraformMode;

    fn test_context() -> ChunkContext {
        let config = SurfaceConfig {
            chunk_size: 10,
            chunk_scale: 2.0,
            ..SurfaceConfig::default()
        };
        ChunkContext::new(config).unwrap()
    }

    #[test]
    fn test_bounds_follow_origin() {
        let ctx = test_context();
        let chunk = Chunk::generate(ChunkKey::new(1, -1), &ctx);
        assert_eq!(chunk.origin(), Vec3::new(18.0, 0.0, -18.0));
        assert_eq!(chunk.bounds().max, Vec3::new(36.0, 18.0, 0.0));
        assert!(chunk.bounds().contains(Vec3::new(20.0, 5.0, -1.0)));
        assert!(chunk.bounds().intersects_sphere(Vec3::new(40.0, 5.0, -5.0), 4.5));
        assert!(!chunk.bounds().intersects_sphere(Vec3::new(40.0, 5.0, -5.0), 3.5));
        assert_eq!(chunk.id(), "Chunk 1, -1");
    }

    #[test]
    fn test_generated_surface_is_consistent() {
        let ctx = test_context();
        let chunk = Chunk::generate(ChunkKey::new(0, 0), &ctx);
        assert_eq!(chunk.mesh().triangle_count(), chunk.triangles().len());
        assert_eq!(chunk.collider().is_some(), !chunk.triangles().is_empty());
        assert!(chunk.anchors().len() <= chunk.triangles().len());
        assert!(chunk.vegetation().len() <= chunk.anchors().len());
    }

    #[test]
    fn test_cache_roundtrip_keeps_terraform_edits() {
        let ctx = test_context();
        let key = ChunkKey::new(0, 0);
        let mut chunk = Chunk::generate(key, &ctx);
        let brush = TerraformBrush::new(Vec3::new(9.0, 9.0, 9.0), 4.0, 0.8, TerraformMode::Add);
        assert!(chunk.terraform(&brush, &ctx, false));

        let edited = chunk.density().clone();
        let triangles = chunk.triangles().to_vec();
        let restored = Chunk::restore(key, chunk.into_cache_entry(), &ctx);
        assert_eq!(restored.density(), &edited);
        assert_eq!(restored.triangles(), &triangles[..]);
    }

    #[test]
    fn test_terraform_keeps_vegetation_unless_asked() {
        let ctx = test_context();
        let mut chunk = Chunk::generate(ChunkKey::new(0, 0), &ctx);
        let before = chunk.vegetation().to_vec();
        let brush = TerraformBrush::new(Vec3::new(9.0, 4.0, 9.0), 6.0, 1.5, TerraformMode::Remove);
        assert!(chunk.terraform(&brush, &ctx, false));
        assert_eq!(chunk.vegetation(), &before[..]);

        // Меш пересобран из изменённой плотности
        let fresh = ctx.extractor.extract(chunk.density(), ctx.config.iso_level, ctx.config.chunk_scale);
        assert_eq!(chunk.triangles(), &fresh.triangles[..]);
    }

    #[test]
    fn test_brush_outside_chunk_is_noop() {
        let ctx = test_context();
        let mut chunk = Chunk::generate(ChunkKey::new(0, 0), &ctx);
        let before = chunk.density().clone();
        let brush = TerraformBrush::new(Vec3::new(500.0, 0.0, 500.0), 3.0, 1.0, TerraformMode::Add);
        assert!(!chunk.terraform(&brush, &ctx, true));
        assert_eq!(chunk.density(), &before);
    }

    #[test]
    fn test_world_triangles_are_offset() {
        let ctx = test_context();
        let chunk = Chunk::generate(ChunkKey::new(2, 3), &ctx);
        for (local, world) in chunk.triangles().iter().zip(chunk.world_triangles()) {
            assert!((world.a[0] - local.a[0] - 36.0).abs() < 1e-4);
            assert!((world.a[2] - local.a[2] - 54.0).abs() < 1e-4);
        }
    }
}
