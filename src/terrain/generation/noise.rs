// ============================================
// Noise Fields - 2D шумовые карты для плотности и биомов
// ============================================

use serde::{Deserialize, Serialize};
use simdnoise::NoiseBuilder;

use crate::config::NoiseFieldConfig;

/// Тип шума карты
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseKind {
    /// Когерентный градиентный шум, нормализован в 0.0..1.0
    Perlin,
    /// Клеточный (Worley) шум - расстояние до ближайшей точки, не нормализован
    Cellular,
}

/// Hash точки сетки (чанка или столбца сэмплов): смешивает сид мира с координатой
#[inline(always)]
pub fn hash_chunk_seed(seed: i32, cx: i32, cz: i32) -> u64 {
    let n = (cx as i64).wrapping_mul(374761393)
        .wrapping_add((cz as i64).wrapping_mul(668265263))
        .wrapping_add((seed as i64).wrapping_mul(1274126177));
    let n = (n ^ (n >> 13)).wrapping_mul(1911520717);
    (n ^ (n >> 16)) as u64
}

/// 2D скалярная карта (row-major, x быстрее y)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseField {
    pub width: usize,
    pub height: usize,
    pub kind: NoiseKind,
    values: Vec<f32>,
}

impl NoiseField {
    pub fn from_values(width: usize, height: usize, kind: NoiseKind, values: Vec<f32>) -> Self {
        assert_eq!(values.len(), width * height, "noise field buffer does not match its resolution");
        Self { width, height, kind, values }
    }

    /// Карта с одинаковым значением (удобно для тестов и плоского мира)
    pub fn constant(width: usize, height: usize, value: f32) -> Self {
        Self::from_values(width, height, NoiseKind::Perlin, vec![value; width * height])
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Билинейная выборка по нормализованным координатам, карта тайлится.
    /// Результат зажат в 0.0..1.0 (клеточный шум не ограничен сверху).
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let fx = u.rem_euclid(1.0) * self.width as f32;
        let fy = v.rem_euclid(1.0) * self.height as f32;

        let x0 = (fx.floor() as usize) % self.width;
        let y0 = (fy.floor() as usize) % self.height;
        let x1 = (x0 + 1) % self.width;
        let y1 = (y0 + 1) % self.height;
        let tx = fx - fx.floor();
        let ty = fy - fy.floor();

        let n00 = self.get(x0, y0);
        let n10 = self.get(x1, y0);
        let n01 = self.get(x0, y1);
        let n11 = self.get(x1, y1);

        let nx0 = n00 + tx * (n10 - n00);
        let nx1 = n01 + tx * (n11 - n01);

        (nx0 + ty * (nx1 - nx0)).clamp(0.0, 1.0)
    }
}

/// Сгенерировать карту шума. Чистая функция (resolution, scale, seed, kind).
///
/// Perlin берёт выборку в `(seed + x/res*scale, seed + y/res*scale)`,
/// Cellular - в `((x + seed)*scale, (y + seed)*scale)`.
pub fn generate_noise_field(resolution: [u32; 2], scale: f32, seed: i32, kind: NoiseKind) -> NoiseField {
    let width = resolution[0].max(1) as usize;
    let height = resolution[1].max(1) as usize;

    let values = match kind {
        NoiseKind::Perlin => {
            // simdnoise семплирует (offset + i) * freq, частота одна на обе оси:
            // шаг по y берётся по ширине карты
            let freq = (scale / width as f32).max(f32::EPSILON);
            let offset = seed as f32 / freq;
            let (raw, min, max) = NoiseBuilder::gradient_2d_offset(offset, width, offset, height)
                .with_freq(freq)
                .with_seed(seed)
                .generate();
            normalize(raw, min, max)
        }
        NoiseKind::Cellular => {
            let (raw, _min, _max) = NoiseBuilder::cellular_2d_offset(seed as f32, width, seed as f32, height)
                .with_freq(scale)
                .with_seed(seed)
                .generate();
            raw
        }
    };

    NoiseField::from_values(width, height, kind, values)
}

/// Сгенерировать карту по конфигу, сид мира сдвигается на seed_offset
pub fn generate_from_config(config: &NoiseFieldConfig, world_seed: i32) -> NoiseField {
    generate_noise_field(config.resolution, config.scale, world_seed.wrapping_add(config.seed_offset), config.kind)
}

fn normalize(mut values: Vec<f32>, min: f32, max: f32) -> Vec<f32> {
    let range = max - min;
    if !(range > f32::EPSILON) {
        values.fill(0.5);
        return values;
    }
    for v in values.iter_mut() {
        *v = ((*v - min) / range).clamp(0.0, 1.0);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perlin_is_deterministic() {
        let a = generate_noise_field([32, 32], 4.0, 7, NoiseKind::Perlin);
        let b = generate_noise_field([32, 32], 4.0, 7, NoiseKind::Perlin);
        assert_eq!(a, b);
    }

    #[test]
    fn test_perlin_range() {
        let field = generate_noise_field([24, 16], 3.0, 11, NoiseKind::Perlin);
        assert_eq!(field.values().len(), 24 * 16);
        assert!(field.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_seed_changes_field() {
        let a = generate_noise_field([32, 32], 4.0, 1, NoiseKind::Perlin);
        let b = generate_noise_field([32, 32], 4.0, 2, NoiseKind::Perlin);
        assert_ne!(a.values(), b.values());
    }

    #[test]
    fn test_cellular_is_deterministic() {
        let a = generate_noise_field([16, 16], 0.1, 3, NoiseKind::Cellular);
        let b = generate_noise_field([16, 16], 0.1, 3, NoiseKind::Cellular);
        assert_eq!(a.values(), b.values());
        assert!(a.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_sample_clamps_and_wraps() {
        let field = NoiseField::from_values(2, 1, NoiseKind::Cellular, vec![0.25, 3.0]);
        assert_eq!(field.sample(0.0, 0.0), 0.25);
        assert_eq!(field.sample(1.0, 0.0), 0.25);
        assert_eq!(field.sample(0.5, 0.0), 1.0);
    }

    #[test]
    fn test_sample_interpolates() {
        let field = NoiseField::from_values(2, 1, NoiseKind::Perlin, vec![0.0, 1.0]);
        assert!((field.sample(0.25, 0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_hash_chunk_seed_varies() {
        assert_eq!(hash_chunk_seed(42, 1, 2), hash_chunk_seed(42, 1, 2));
        assert_ne!(hash_chunk_seed(42, 1, 2), hash_chunk_seed(42, 2, 1));
        assert_ne!(hash_chunk_seed(42, 1, 2), hash_chunk_seed(43, 1, 2));
    }
}
