// ============================================
// Density Field - Плотностное поле чанка
// ============================================
//
// Плоский массив size³, index(x,y,z) = x + y·size + z·size².
// Ячейка "твёрдая" если значение > isoLevel. После создания
// размер не меняется, мутируют только генерация и терраформинг.

use ndshape::{RuntimeShape, Shape};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::biomes::{BiomeParams, MAX_BIOME_FEATURES};
use crate::terrain::cache::ChunkKey;
use crate::terrain::chunk::ChunkContext;

use super::noise::hash_chunk_seed;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityField {
    size: u32,
    values: Vec<f32>,
}

impl DensityField {
    /// Поле из нулей. Нужен хотя бы один сэмпл сверх вокселей по оси.
    pub fn new(size: u32) -> Self {
        Self::filled(size, 0.0)
    }

    pub fn filled(size: u32, value: f32) -> Self {
        assert!(size >= 2, "density grid needs at least 2 samples per axis, got {}", size);
        let len = (size as usize).pow(3);
        Self { size, values: vec![value; len] }
    }

    /// Сэмплов на ось
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Вокселей на ось (ячеек между сэмплами)
    #[inline]
    pub fn voxels_per_axis(&self) -> u32 {
        self.size - 1
    }

    #[inline]
    pub fn voxel_count(&self) -> usize {
        (self.voxels_per_axis() as usize).pow(3)
    }

    #[inline]
    pub fn shape(&self) -> RuntimeShape<u32, 3> {
        RuntimeShape::<u32, 3>::new([self.size, self.size, self.size])
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(
            x < self.size && y < self.size && z < self.size,
            "density sample ({}, {}, {}) outside grid of size {}", x, y, z, self.size
        );
        self.shape().linearize([x, y, z]) as usize
    }

    #[inline]
    pub fn position_of(&self, index: usize) -> [u32; 3] {
        self.shape().delinearize(index as u32)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> f32 {
        self.values[self.index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, z: u32, value: f32) {
        let idx = self.index(x, y, z);
        self.values[idx] = value;
    }

    #[inline]
    pub fn is_solid(&self, x: u32, y: u32, z: u32, iso_level: f32) -> bool {
        self.get(x, y, z) > iso_level
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }
}

/// Выходы биомов по чанку: сетка resolution² смешанных параметров
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeSampleMap {
    pub resolution: u32,
    pub samples: Vec<BiomeParams>,
    /// Индекс пресета с наибольшим весом в каждом пикселе
    pub dominant: Vec<u16>,
}

impl BiomeSampleMap {
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> &BiomeParams {
        &self.samples[(y * self.resolution + x) as usize]
    }
}

/// Верхняя граница генерируемой плотности: (0.5 + 1) · 1.5 · elevation
#[inline]
pub fn density_ceiling(elevation: f32) -> f32 {
    2.25 * elevation
}

#[inline]
fn random_between(rng: &mut ChaCha8Rng, low: f32, high: f32) -> f32 {
    low + (high - low) * rng.random::<f32>()
}

/// Заполнить поле плотности чанка.
///
/// Плотность = шум · random(e/2, 3e/2) · random(0, elevation), где e = exp(-h·falloff),
/// а falloff модулируется признаками биомов в столбце. RNG сидируется по
/// (seed, глобальный столбец сэмплов) и проходит столбец снизу вверх: повторная
/// генерация даёт то же поле, а соседние чанки пишут одинаковые значения
/// в общий граничный ряд.
pub fn generate_density(field: &mut DensityField, ctx: &ChunkContext, key: ChunkKey) -> BiomeSampleMap {
    let config = &ctx.config;
    let size = field.size();
    let step = field.voxels_per_axis() as i32;
    let scale = config.chunk_scale;
    let top = field.voxels_per_axis() as f32;
    let feature_count = ctx.environment.feature_count();
    let mut features = [0.0f32; MAX_BIOME_FEATURES];

    for z in 0..size {
        for x in 0..size {
            // Глобальный индекс столбца: общий для соседей на границе
            let gx = key.x * step + x as i32;
            let gz = key.z * step + z as i32;
            let world_x = gx as f32 * scale;
            let world_z = gz as f32 * scale;

            let noise = 0.5 + ctx.sample_density_noise(world_x, world_z);
            let feature_mean = if feature_count == 0 {
                0.5
            } else {
                ctx.environment.sample_features(world_x, world_z, &mut features[..feature_count]);
                features[..feature_count].iter().sum::<f32>() / feature_count as f32
            };
            let falloff = config.height_falloff * (0.5 + feature_mean);

            let mut rng = ChaCha8Rng::seed_from_u64(hash_chunk_seed(config.seed, gx, gz));
            for y in 0..size {
                let height = y as f32 / top;
                let expected = (-height * falloff).exp();
                let spread = random_between(&mut rng, expected * 0.5, expected * 1.5);
                let lift = random_between(&mut rng, 0.0, config.elevation);
                field.set(x, y, z, noise * spread * lift);
            }
        }
    }

    generate_biome_samples(ctx, key)
}

/// Выходы биомов по площади чанка (вторичны, для окружения)
pub fn generate_biome_samples(ctx: &ChunkContext, key: ChunkKey) -> BiomeSampleMap {
    let resolution = ctx.config.biome_sample_resolution.max(1);
    let origin = ctx.chunk_origin(key);
    let extent = ctx.config.chunk_world_size();
    let feature_count = ctx.environment.feature_count();

    let mut samples = Vec::with_capacity((resolution * resolution) as usize);
    let mut dominant = Vec::with_capacity(samples.capacity());
    let mut features = [0.0f32; MAX_BIOME_FEATURES];

    for py in 0..resolution {
        for px in 0..resolution {
            let world_x = origin.x + (px as f32 + 0.5) / resolution as f32 * extent;
            let world_z = origin.z + (py as f32 + 0.5) / resolution as f32 * extent;
            ctx.environment.sample_features(world_x, world_z, &mut features[..feature_count]);
            let sample = ctx.blender.biome_at(&features[..feature_count]);
            samples.push(sample.params);
            dominant.push(sample.dominant as u16);
        }
    }

    BiomeSampleMap { resolution, samples, dominant }
}
