// ============================================
// Biome Registry - Реестр пресетов биомов
// ============================================
// Порядок пресетов = порядок листьев дерева смешивания

use std::fs;
use std::path::Path;

use super::types::{Biome, BiomeParams, Rgba};
use crate::config::ConfigError;

const SHALLOW: Rgba = Rgba::new(0.168, 0.325, 0.952, 1.0);
const DEEP: Rgba = Rgba::new(0.015, 0.063, 0.254, 1.0);

/// Пресет подводного биома: вода и туман от мелководья к глубине
fn underwater(name: &str, start_fog_density: f32, end_fog_density: f32) -> Biome {
    Biome::new(name, BiomeParams {
        shallow_color: SHALLOW,
        deep_color: DEEP,
        start_fog_color: SHALLOW,
        end_fog_color: DEEP,
        start_fog_density,
        end_fog_density,
    })
}

pub struct BiomeRegistry {
    biomes: Vec<Biome>,
}

impl BiomeRegistry {
    pub fn new() -> Self {
        let mut registry = Self { biomes: Vec::new() };
        registry.register_default_biomes();
        registry
    }

    pub fn from_biomes(biomes: Vec<Biome>) -> Self {
        Self { biomes }
    }

    /// Загрузить пресеты из JSON массива
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let biomes: Vec<Biome> = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        log::info!("Loaded {} biome presets from {}", biomes.len(), path.as_ref().display());
        Ok(Self { biomes })
    }

    fn register_default_biomes(&mut self) {
        // 4 признака -> 16 листьев
        self.register(underwater("Rocky Meadows", 0.06, 0.15));
        self.register(underwater("Deep Sea", 0.03, 0.03));
        self.register(underwater("Caverns", 0.03, 0.03));
        self.register(underwater("Serenity Fields", 0.03, 0.03));

        self.register(underwater("Canyons", 0.03, 0.03));
        self.register(underwater("Steaming Valley", 0.03, 0.03));
        self.register(underwater("Wasteland", 0.03, 0.03));
        self.register(underwater("Blooming Hills", 0.03, 0.03));

        self.register(underwater("Underwater Tundra", 0.03, 0.03));
        self.register(underwater("Tropical Islands", 0.03, 0.05));
        self.register(underwater("Dead Lands", 0.03, 0.03));
        self.register(underwater("Stone Valley", 0.03, 0.03));

        self.register(underwater("Acid Plateau", 0.03, 0.03));
        self.register(underwater("Dark Deeps", 0.03, 0.03));
        self.register(underwater("Nowhere", 0.03, 0.03));
        self.register(underwater("Rocky Meadows", 0.06, 0.15));
    }

    pub fn register(&mut self, biome: Biome) {
        self.biomes.push(biome);
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Biome> {
        self.biomes.get(index)
    }

    pub fn count(&self) -> usize {
        self.biomes.len()
    }

    pub fn biomes(&self) -> &[Biome] {
        &self.biomes
    }

    pub fn into_biomes(self) -> Vec<Biome> {
        self.biomes
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
