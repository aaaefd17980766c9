// ============================================
// Environment - Вода, карты признаков биомов, туман
// ============================================
// Карты читаются по нормализованной мировой позиции (x/extent, z/extent)

use serde::{Deserialize, Serialize};

use super::types::{inverse_lerp, lerp, BiomeParams, Rgba};
use crate::config::EnvironmentConfig;
use crate::terrain::generation::noise::{generate_from_config, NoiseField};

/// Именованная карта признака (температура, эрозия, ...)
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMap {
    pub name: String,
    pub field: NoiseField,
}

/// Туман на высоте наблюдателя
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Rgba,
    pub density: f32,
}

#[derive(Clone, Debug)]
pub struct Environment {
    water_level: f32,
    world_extent: f32,
    start_fog_height: f32,
    end_fog_height: f32,
    features: Vec<FeatureMap>,
}

impl Environment {
    /// Сгенерировать карты признаков из конфига
    pub fn new(config: &EnvironmentConfig, seed: i32) -> Self {
        let features = config.feature_maps.iter()
            .map(|map| FeatureMap {
                name: map.name.clone(),
                field: generate_from_config(map, seed),
            })
            .collect();
        Self::from_maps(config, features)
    }

    /// Готовые карты (тесты, загрузка извне)
    pub fn from_maps(config: &EnvironmentConfig, features: Vec<FeatureMap>) -> Self {
        Self {
            water_level: config.water_level,
            world_extent: config.world_extent,
            start_fog_height: config.start_fog_height,
            end_fog_height: config.end_fog_height,
            features,
        }
    }

    #[inline]
    pub fn water_level(&self) -> f32 {
        self.water_level
    }

    #[inline]
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    pub fn feature(&self, name: &str) -> Option<&NoiseField> {
        self.features.iter().find(|f| f.name == name).map(|f| &f.field)
    }

    #[inline]
    fn normalized(&self, x: f32, z: f32) -> (f32, f32) {
        (x / self.world_extent, z / self.world_extent)
    }

    pub fn sample_feature(&self, name: &str, x: f32, z: f32) -> Option<f32> {
        let (u, v) = self.normalized(x, z);
        self.feature(name).map(|field| field.sample(u, v))
    }

    /// Все признаки в точке, out.len() == feature_count()
    pub fn sample_features(&self, x: f32, z: f32, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.features.len());
        let (u, v) = self.normalized(x, z);
        for (slot, map) in out.iter_mut().zip(self.features.iter()) {
            *slot = map.field.sample(u, v);
        }
    }

    /// Ниже воды
    #[inline]
    pub fn is_submerged(&self, y: f32) -> bool {
        y < self.water_level
    }

    /// Туман по высоте: от стартового (у поверхности) к конечному (в глубине)
    pub fn fog_at(&self, biome: &BiomeParams, height: f32) -> Fog {
        let t = inverse_lerp(self.start_fog_height, self.end_fog_height, height);
        Fog {
            color: biome.start_fog_color.lerp(biome.end_fog_color, t),
            density: lerp(biome.start_fog_density, biome.end_fog_density, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generation::NoiseKind;

    fn flat_environment() -> Environment {
        let config = EnvironmentConfig::default();
        let maps = vec![
            FeatureMap { name: "temperature".into(), field: NoiseField::constant(4, 4, 0.25) },
            FeatureMap {
                name: "erosion".into(),
                field: NoiseField::from_values(2, 1, NoiseKind::Perlin, vec![0.0, 1.0]),
            },
        ];
        Environment::from_maps(&config, maps)
    }

    #[test]
    fn test_sample_by_name() {
        let env = flat_environment();
        assert_eq!(env.sample_feature("temperature", 100.0, -40.0), Some(0.25));
        assert_eq!(env.sample_feature("missing", 0.0, 0.0), None);
        // Середина между двумя текселями erosion по x
        let v = env.sample_feature("erosion", 0.25 * 512.0, 0.0).unwrap();
        assert!((v - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_sample_features_in_order() {
        let env = flat_environment();
        let mut out = [0.0; 2];
        env.sample_features(0.0, 0.0, &mut out);
        assert_eq!(out, [0.25, 0.0]);
        assert_eq!(env.feature_names().collect::<Vec<_>>(), vec!["temperature", "erosion"]);
    }

    #[test]
    fn test_fog_blends_with_height() {
        let env = flat_environment();
        let biome = BiomeParams {
            start_fog_density: 0.06,
            end_fog_density: 0.15,
            start_fog_color: Rgba::new(1.0, 1.0, 1.0, 1.0),
            end_fog_color: Rgba::new(0.0, 0.0, 0.0, 1.0),
            ..BiomeParams::BLANK
        };
        // Выше стартовой высоты -> стартовый туман
        assert_eq!(env.fog_at(&biome, 50.0).density, 0.06);
        // Ниже конечной -> конечный
        assert_eq!(env.fog_at(&biome, 0.0).density, 0.15);
        let mid = env.fog_at(&biome, 20.0);
        assert!((mid.density - 0.105).abs() < 1e-5);
        assert!((mid.color.r - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_generated_maps_follow_config() {
        let env = Environment::new(&EnvironmentConfig::default(), 42);
        assert_eq!(env.feature_count(), 4);
        assert!(env.feature("salinity").is_some());
        assert!(env.is_submerged(3.0));
        assert!(!env.is_submerged(20.0));
    }
}
