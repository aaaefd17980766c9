// ============================================
// Biome Blender - Смешивание 2^N пресетов по N признакам
// ============================================
//
// Двоичное дерево глубины N разворачивается в плоский массив весов листьев.
// На уровне d каждый вес делится между "низким" (левым) и "высоким" (правым)
// потомком по признаку d. Первый признак = старший бит индекса листа.

use std::fmt;

use super::types::{inverse_lerp, Biome, BiomeParams, BiomeSample};
use super::MAX_BIOME_FEATURES;
use crate::config::{BlendConfig, ConfigError};

const MAX_LEAVES: usize = 1 << MAX_BIOME_FEATURES;

#[derive(Debug, Clone, PartialEq)]
pub enum BlendError {
    TooManyFeatures { count: usize, max: usize },
    PresetCount { expected: usize, actual: usize },
    Thresholds { low: f32, high: f32 },
}

impl fmt::Display for BlendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendError::TooManyFeatures { count, max } => {
                write!(f, "{} biome features requested, at most {} supported", count, max)
            }
            BlendError::PresetCount { expected, actual } => {
                write!(f, "biome preset table needs {} entries, got {}", expected, actual)
            }
            BlendError::Thresholds { low, high } => {
                write!(f, "blend band [{}, {}] is not ordered inside [0, 1]", low, high)
            }
        }
    }
}

impl std::error::Error for BlendError {}

impl From<BlendError> for ConfigError {
    fn from(e: BlendError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct BiomeBlender {
    presets: Vec<Biome>,
    feature_count: usize,
    low: f32,
    high: f32,
}

impl BiomeBlender {
    /// Проверка размеров делается один раз здесь, запросы не падают
    pub fn new(presets: Vec<Biome>, feature_count: usize, band: BlendConfig) -> Result<Self, BlendError> {
        if feature_count > MAX_BIOME_FEATURES {
            return Err(BlendError::TooManyFeatures { count: feature_count, max: MAX_BIOME_FEATURES });
        }
        let expected = 1usize << feature_count;
        if presets.len() != expected {
            return Err(BlendError::PresetCount { expected, actual: presets.len() });
        }
        let (low, high) = (band.low_threshold, band.high_threshold);
        if !(0.0 <= low && low < high && high <= 1.0) {
            return Err(BlendError::Thresholds { low, high });
        }
        Ok(Self { presets, feature_count, low, high })
    }

    #[inline]
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    #[inline]
    pub fn preset_count(&self) -> usize {
        self.presets.len()
    }

    pub fn presets(&self) -> &[Biome] {
        &self.presets
    }

    /// Доля веса, уходящая в "низкого" потомка
    #[inline]
    pub fn low_share(&self, feature: f32) -> f32 {
        if feature < self.low {
            1.0
        } else if feature > self.high {
            0.0
        } else {
            inverse_lerp(self.high, self.low, feature)
        }
    }

    /// Веса листьев, валидны первые 2^N элементов.
    /// Длина `features` обязана совпадать с числом признаков.
    pub fn leaf_weights(&self, features: &[f32]) -> [f32; MAX_LEAVES] {
        assert_eq!(
            features.len(), self.feature_count,
            "biome blender expects {} features, got {}", self.feature_count, features.len()
        );

        let mut weights = [0.0f32; MAX_LEAVES];
        weights[0] = 1.0;
        for (depth, &feature) in features.iter().enumerate() {
            let low = self.low_share(feature);
            // С конца: запись в 2i и 2i+1 не затирает ещё не прочитанные веса
            for i in (0..1usize << depth).rev() {
                let w = weights[i];
                weights[2 * i] = w * low;
                weights[2 * i + 1] = w * (1.0 - low);
            }
        }
        weights
    }

    pub fn biome_at(&self, features: &[f32]) -> BiomeSample {
        let weights = self.leaf_weights(features);
        let mut params = BiomeParams::BLANK;
        let mut dominant = 0;

        for (i, preset) in self.presets.iter().enumerate() {
            let w = weights[i];
            if w > weights[dominant] {
                dominant = i;
            }
            if w > 0.0 {
                params.add_fraction(&preset.params, w);
            }
        }

        BiomeSample { params, dominant }
    }

    pub fn dominant_name(&self, sample: &BiomeSample) -> &str {
        &self.presets[sample.dominant].name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::registry::BiomeRegistry;
    use crate::biomes::types::Rgba;

    fn preset(density: f32) -> Biome {
        Biome::new("p", BiomeParams {
            start_fog_density: density,
            shallow_color: Rgba::new(density, 0.0, 0.0, 1.0),
            ..BiomeParams::BLANK
        })
    }

    fn blender(n: usize) -> BiomeBlender {
        let presets = (0..1 << n).map(|i| preset(i as f32)).collect();
        BiomeBlender::new(presets, n, BlendConfig::default()).unwrap()
    }

    #[test]
    fn test_midpoint_splits_evenly() {
        let b = blender(1);
        let w = b.leaf_weights(&[0.5]);
        let expected = inverse_lerp(0.54, 0.46, 0.5);
        assert!((w[0] - expected).abs() < 1e-6);
        assert!((w[1] - (1.0 - expected)).abs() < 1e-6);
    }

    #[test]
    fn test_below_band_goes_low() {
        let b = blender(1);
        let w = b.leaf_weights(&[0.0]);
        assert_eq!(w[0], 1.0);
        assert_eq!(w[1], 0.0);
        assert_eq!(b.biome_at(&[0.0]).dominant, 0);
        assert_eq!(b.biome_at(&[0.9]).dominant, 1);
    }

    #[test]
    fn test_first_feature_is_most_significant() {
        let b = blender(2);
        // Признак 0 высокий, признак 1 низкий -> лист 0b10
        let w = b.leaf_weights(&[1.0, 0.0]);
        assert_eq!(w[2], 1.0);
        assert_eq!(w[0] + w[1] + w[3], 0.0);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let b = blender(4);
        let inputs = [
            [0.5, 0.5, 0.5, 0.5],
            [0.47, 0.0, 0.53, 1.0],
            [0.1, 0.49, 0.51, 0.9],
            [0.46, 0.54, 0.5, 0.48],
        ];
        for features in inputs.iter() {
            let w = b.leaf_weights(features);
            let sum: f32 = w[..16].iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "sum {} for {:?}", sum, features);
            assert!(w[16..].iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    #[should_panic(expected = "biome blender expects 2 features, got 1")]
    fn test_short_feature_vector_panics() {
        blender(2).biome_at(&[0.5]);
    }

    #[test]
    #[should_panic(expected = "biome blender expects 1 features, got 2")]
    fn test_long_feature_vector_panics() {
        blender(1).leaf_weights(&[0.5, 0.5]);
    }

    #[test]
    fn test_blend_interpolates_presets() {
        let b = blender(1);
        let sample = b.biome_at(&[0.5]);
        // 0.5·0 + 0.5·1
        assert!((sample.params.start_fog_density - 0.5).abs() < 1e-5);
        assert!((sample.params.shallow_color.a - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_preset_count_mismatch_is_rejected() {
        let presets = BiomeRegistry::new().into_biomes();
        let err = BiomeBlender::new(presets, 3, BlendConfig::default()).unwrap_err();
        assert_eq!(err, BlendError::PresetCount { expected: 8, actual: 16 });
    }

    #[test]
    fn test_too_many_features_is_rejected() {
        let err = BiomeBlender::new(Vec::new(), 7, BlendConfig::default()).unwrap_err();
        assert!(matches!(err, BlendError::TooManyFeatures { count: 7, .. }));
    }

    #[test]
    fn test_default_registry_fits_four_features() {
        let b = BiomeBlender::new(BiomeRegistry::new().into_biomes(), 4, BlendConfig::default()).unwrap();
        let sample = b.biome_at(&[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(b.dominant_name(&sample), "Rocky Meadows");
        assert!((sample.params.end_fog_density - 0.15).abs() < 1e-6);
    }
}
