// ============================================
// Biomes Module - Биомы, смешивание, окружение
// ============================================

pub mod types;
pub mod registry;
pub mod blend;
pub mod environment;

/// Предел числа признаков: веса листьев живут в массиве на стеке (2^6)
pub const MAX_BIOME_FEATURES: usize = 6;

pub use types::{Biome, BiomeParams, BiomeSample, Rgba, lerp, inverse_lerp};
pub use registry::BiomeRegistry;
pub use blend::{BiomeBlender, BlendError};
pub use environment::{Environment, FeatureMap, Fog};
