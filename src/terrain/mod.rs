// ============================================
// Terrain Module - Плотностный воксельный terrain
// ============================================

pub mod generation;
pub mod dispatch;
pub mod mesh;
pub mod chunk;
pub mod cache;
pub mod manager;
pub mod terraform;
pub mod vegetation;

// Re-exports
pub use generation::{DensityField, NoiseField, NoiseKind, generate_noise_field};
pub use dispatch::{AppendBuffer, Dispatch};
pub use mesh::{IsosurfaceExtractor, ExtractionOutput, Triangle, VegetationAnchor, ChunkMesh};
pub use chunk::{Chunk, ChunkContext, ChunkBounds};
pub use cache::{ChunkKey, ChunkCache, ChunkCacheEntry};
pub use manager::{ChunkStreamer, StreamerReport, StreamerState};
pub use terraform::{Terraformer, TerraformMode, TerraformBrush};
pub use vegetation::{VegetationKind, VegetationPlacement};
