// ============================================
// Chunk Context - Всё, что чанк читает при генерации
// ============================================
//
// Собирается один раз на набор параметров генерации и раздаётся
// чанкам по ссылке (Arc). Сам по себе неизменяем: смена параметров
// = новый контекст.

use ultraviolet::Vec3;

use crate::biomes::{Biome, BiomeBlender, BiomeRegistry, Environment};
use crate::config::{ConfigError, GenerationParams, SurfaceConfig};
use crate::terrain::cache::ChunkKey;
use crate::terrain::generation::noise::{generate_from_config, NoiseField};
use crate::terrain::mesh::IsosurfaceExtractor;

pub struct ChunkContext {
    pub config: SurfaceConfig,
    /// Карты шума плотности (среднее по ним = входной шум столбца)
    pub density_noise: Vec<NoiseField>,
    pub environment: Environment,
    pub blender: BiomeBlender,
    pub extractor: IsosurfaceExtractor,
}

impl ChunkContext {
    /// Проверить конфиг, сгенерировать карты, собрать блендер из пресетов по умолчанию
    pub fn new(config: SurfaceConfig) -> Result<Self, ConfigError> {
        let presets = BiomeRegistry::new().into_biomes();
        Self::with_presets(config, presets)
    }

    pub fn with_presets(config: SurfaceConfig, presets: Vec<Biome>) -> Result<Self, ConfigError> {
        config.validate()?;
        let density_noise = config.noise_fields.iter()
            .map(|field| generate_from_config(field, config.seed))
            .collect();
        let environment = Environment::new(&config.environment, config.seed);
        let blender = BiomeBlender::new(presets, environment.feature_count(), config.blend)?;
        Self::with_parts(config, density_noise, environment, blender)
    }

    /// Собрать из готовых частей (внедрение зависимостей для тестов)
    pub fn with_parts(
        config: SurfaceConfig,
        density_noise: Vec<NoiseField>,
        environment: Environment,
        blender: BiomeBlender,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if blender.feature_count() != environment.feature_count() {
            return Err(ConfigError::Invalid(format!(
                "biome blender expects {} features, environment provides {}",
                blender.feature_count(), environment.feature_count()
            )));
        }
        let extractor = IsosurfaceExtractor::new(config.max_triangles_per_voxel, config.dispatch);
        log::debug!(
            "Chunk context: size {} scale {} seed {}, {} density maps, {} biome features",
            config.chunk_size, config.chunk_scale, config.seed,
            density_noise.len(), environment.feature_count()
        );
        Ok(Self { config, density_noise, environment, blender, extractor })
    }

    #[inline]
    pub fn params(&self) -> GenerationParams {
        self.config.generation_params()
    }

    /// Мировой угол чанка: соседи делят крайний ряд сэмплов
    #[inline]
    pub fn chunk_origin(&self, key: ChunkKey) -> Vec3 {
        let step = self.config.chunk_world_size();
        Vec3::new(key.x as f32 * step, 0.0, key.z as f32 * step)
    }

    /// Чанк, в клетке которого лежит мировая позиция
    #[inline]
    pub fn chunk_of(&self, position: Vec3) -> ChunkKey {
        let step = self.config.chunk_world_size();
        ChunkKey::new((position.x / step).floor() as i32, (position.z / step).floor() as i32)
    }

    /// Входной шум столбца: среднее всех карт плотности, 0..1
    pub fn sample_density_noise(&self, x: f32, z: f32) -> f32 {
        if self.density_noise.is_empty() {
            return 0.5;
        }
        let extent = self.config.environment.world_extent;
        let (u, v) = (x / extent, z / extent);
        let sum: f32 = self.density_noise.iter().map(|field| field.sample(u, v)).sum();
        sum / self.density_noise.len() as f32
    }
}
