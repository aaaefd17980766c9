// ============================================
// Seabed - Воксельный terrain для подводного мира
// ============================================
//
// Плотностное поле по чанкам, Marching Cubes на параллельном
// диспатче, стриминг окна чанков, терраформинг и смешивание биомов.

pub mod config;
pub mod terrain;
pub mod biomes;
pub mod save;

pub use config::{SurfaceConfig, GenerationParams, ConfigError};
pub use terrain::{
    Chunk, ChunkContext, ChunkKey, ChunkCache, ChunkStreamer, StreamerReport,
    DensityField, IsosurfaceExtractor, Terraformer, TerraformMode,
};
pub use biomes::{Biome, BiomeBlender, Environment};
pub use save::{CacheFile, SaveError};
