// ============================================
// Surface Config - Параметры генерации terrain
// ============================================
// Data-Driven: всё читается из JSON, недостающие поля берутся из Default

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::terrain::dispatch::Dispatch;
use crate::terrain::generation::NoiseKind;
use crate::terrain::mesh::MAX_TRIANGLES_PER_CELL;
use crate::biomes::MAX_BIOME_FEATURES;

/// Ошибки конфигурации (ловятся при старте, не во время работы)
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
            ConfigError::Invalid(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Глобальные параметры генерации. Любое изменение = полная перезагрузка окна.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub seed: i32,
    pub iso_level: f32,
    pub elevation: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { seed: 0, iso_level: 0.5, elevation: 1.0 }
    }
}

/// Описание одной шумовой карты
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseFieldConfig {
    pub name: String,
    pub resolution: [u32; 2],
    pub scale: f32,
    /// Добавляется к глобальному сиду, чтобы карты не совпадали
    pub seed_offset: i32,
    pub kind: NoiseKind,
}

impl NoiseFieldConfig {
    pub fn new(name: &str, kind: NoiseKind, scale: f32, seed_offset: i32) -> Self {
        Self {
            name: name.to_string(),
            resolution: [64, 64],
            scale,
            seed_offset,
            kind,
        }
    }
}

impl Default for NoiseFieldConfig {
    fn default() -> Self {
        Self::new("noise", NoiseKind::Perlin, 4.0, 0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    pub radius: f32,
    pub strength: f32,
    /// Минимальный интервал между применениями (кулдаун)
    pub interval_ms: u64,
    /// Дальность луча у вызывающей стороны
    pub range: f32,
    /// Перегенерировать растительность после терраформинга
    pub regenerate_vegetation: bool,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            radius: 5.0,
            strength: 0.5,
            interval_ms: 100,
            range: 10.0,
            regenerate_vegetation: false,
        }
    }
}

/// Нечёткая граница смешивания биомов вокруг 0.5
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self { low_threshold: 0.46, high_threshold: 0.54 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub water_level: f32,
    /// Размер мира, на который нормализуются координаты при чтении карт
    pub world_extent: f32,
    pub start_fog_height: f32,
    pub end_fog_height: f32,
    pub feature_maps: Vec<NoiseFieldConfig>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            water_level: 12.0,
            world_extent: 512.0,
            start_fog_height: 35.0,
            end_fog_height: 5.0,
            feature_maps: vec![
                NoiseFieldConfig::new("temperature", NoiseKind::Perlin, 3.0, 101),
                NoiseFieldConfig::new("erosion", NoiseKind::Perlin, 5.0, 202),
                NoiseFieldConfig::new("salinity", NoiseKind::Cellular, 0.08, 303),
                NoiseFieldConfig::new("volcanism", NoiseKind::Perlin, 2.0, 404),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationConfig {
    /// Глубина под водой, до которой растительность считается мелководной
    pub shallow_depth: f32,
    /// Минимальный normal·up, круче - ничего не растёт
    pub min_slope_dot: f32,
    /// Вероятность посадки на якорь
    pub placement_chance: f32,
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            shallow_depth: 6.0,
            min_slope_dot: 0.3,
            placement_chance: 0.35,
        }
    }
}

/// Полная конфигурация поверхности (аналог SurfaceManager)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Сэмплов плотности на ось (вокселей на ось = size - 1)
    pub chunk_size: u32,
    /// Мировой размер одного вокселя
    pub chunk_scale: f32,
    pub seed: i32,
    pub iso_level: f32,
    pub elevation: f32,
    /// Скорость экспоненциального спада плотности по высоте
    pub height_falloff: f32,
    /// Радиус окна в чанках: окно (2r+1)²
    pub view_radius: i32,
    /// Снимки дальше этого радиуса (в чанках) от центра окна выбрасываются.
    /// null = кэш без ограничения.
    pub cache_radius: Option<i32>,
    pub max_triangles_per_voxel: usize,
    pub dispatch: Dispatch,
    pub biome_sample_resolution: u32,
    pub noise_fields: Vec<NoiseFieldConfig>,
    pub terraform: TerraformConfig,
    pub blend: BlendConfig,
    pub environment: EnvironmentConfig,
    pub vegetation: VegetationConfig,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            chunk_scale: 1.0,
            seed: 42,
            iso_level: 0.5,
            elevation: 1.0,
            height_falloff: 3.0,
            view_radius: 2,
            cache_radius: Some(32),
            max_triangles_per_voxel: MAX_TRIANGLES_PER_CELL,
            dispatch: Dispatch::Parallel,
            biome_sample_resolution: 4,
            noise_fields: vec![
                NoiseFieldConfig::new("relief", NoiseKind::Perlin, 6.0, 0),
                NoiseFieldConfig::new("ridges", NoiseKind::Cellular, 0.05, 17),
            ],
            terraform: TerraformConfig::default(),
            blend: BlendConfig::default(),
            environment: EnvironmentConfig::default(),
            vegetation: VegetationConfig::default(),
        }
    }
}

impl SurfaceConfig {
    /// Загрузить из JSON строки (без валидации)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Загрузить из файла и проверить
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            seed: self.seed,
            iso_level: self.iso_level,
            elevation: self.elevation,
        }
    }

    pub fn set_generation_params(&mut self, params: GenerationParams) {
        self.seed = params.seed;
        self.iso_level = params.iso_level;
        self.elevation = params.elevation;
    }

    /// Мировая ширина чанка: соседние чанки делят один ряд сэмплов
    #[inline]
    pub fn chunk_world_size(&self) -> f32 {
        (self.chunk_size - 1) as f32 * self.chunk_scale
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be at least 2 samples per axis, got {}", self.chunk_size
            )));
        }
        if !(self.chunk_scale > 0.0) {
            return Err(ConfigError::Invalid(format!("chunk_scale must be positive, got {}", self.chunk_scale)));
        }
        if !(0.0..=1.0).contains(&self.iso_level) {
            return Err(ConfigError::Invalid(format!("iso_level must be in [0, 1], got {}", self.iso_level)));
        }
        if self.view_radius < 0 {
            return Err(ConfigError::Invalid(format!("view_radius must be >= 0, got {}", self.view_radius)));
        }
        if let Some(cache_radius) = self.cache_radius {
            if cache_radius < self.view_radius {
                return Err(ConfigError::Invalid(format!(
                    "cache_radius {} must not be smaller than view_radius {}", cache_radius, self.view_radius
                )));
            }
        }
        if self.max_triangles_per_voxel < MAX_TRIANGLES_PER_CELL {
            return Err(ConfigError::Invalid(format!(
                "max_triangles_per_voxel {} is below the marching cubes bound {}",
                self.max_triangles_per_voxel, MAX_TRIANGLES_PER_CELL
            )));
        }
        let blend = &self.blend;
        if !(0.0 <= blend.low_threshold && blend.low_threshold < blend.high_threshold && blend.high_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "blend thresholds must satisfy 0 <= low < high <= 1, got [{}, {}]",
                blend.low_threshold, blend.high_threshold
            )));
        }
        if self.environment.feature_maps.len() > MAX_BIOME_FEATURES {
            return Err(ConfigError::Invalid(format!(
                "at most {} biome feature maps are supported, got {}",
                MAX_BIOME_FEATURES, self.environment.feature_maps.len()
            )));
        }
        if !(self.environment.world_extent > 0.0) {
            return Err(ConfigError::Invalid("environment.world_extent must be positive".to_string()));
        }
        for field in self.noise_fields.iter().chain(self.environment.feature_maps.iter()) {
            if field.resolution[0] == 0 || field.resolution[1] == 0 {
                return Err(ConfigError::Invalid(format!("noise field '{}' has zero resolution", field.name)));
            }
        }
        Ok(())
    }
}
