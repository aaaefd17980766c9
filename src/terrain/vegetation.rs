// ============================================
// Vegetation - Посадка растительности по якорям поверхности
// ============================================
// Якоря приходят из Marching Cubes, класс решает уровень воды

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use ultraviolet::Vec3;

use crate::config::VegetationConfig;
use crate::terrain::cache::ChunkKey;
use crate::terrain::generation::hash_chunk_seed;
use crate::terrain::mesh::VegetationAnchor;

/// Отдельный поток RNG для растительности, не пересекается с плотностью
const VEGETATION_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VegetationKind {
    /// Над уровнем воды
    DryLand,
    /// Под водой, но не глубже shallow_depth
    ShallowWater,
    DeepWater,
}

impl VegetationKind {
    pub fn classify(height: f32, water_level: f32, shallow_depth: f32) -> Self {
        if height >= water_level {
            VegetationKind::DryLand
        } else if water_level - height <= shallow_depth {
            VegetationKind::ShallowWater
        } else {
            VegetationKind::DeepWater
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VegetationPlacement {
    /// Мировая позиция
    pub position: [f32; 3],
    pub kind: VegetationKind,
    /// Поворот вокруг вертикали, радианы
    pub rotation: f32,
    pub scale: f32,
}

/// Расставить растительность по якорям чанка (позиции якорей локальные).
/// Детерминировано по (seed, key).
pub fn place_vegetation(
    anchors: &[VegetationAnchor],
    origin: Vec3,
    key: ChunkKey,
    seed: i32,
    water_level: f32,
    config: &VegetationConfig,
) -> Vec<VegetationPlacement> {
    let mut rng = ChaCha8Rng::seed_from_u64(hash_chunk_seed(seed, key.x, key.z) ^ VEGETATION_SALT);
    let mut placements = Vec::new();

    for anchor in anchors {
        // Бросаем всегда, чтобы поток не зависел от отбраковки
        let roll: f32 = rng.random();
        let rotation = rng.random::<f32>() * std::f32::consts::TAU;
        let scale = 0.75 + rng.random::<f32>() * 0.5;

        if anchor.dot < config.min_slope_dot || roll >= config.placement_chance {
            continue;
        }

        let position = Vec3::from(anchor.position) + origin;
        placements.push(VegetationPlacement {
            position: position.into(),
            kind: VegetationKind::classify(position.y, water_level, config.shallow_depth),
            rotation,
            scale,
        });
    }

    placements
}
