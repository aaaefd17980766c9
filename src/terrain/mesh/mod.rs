// ============================================
// Mesh Module - Извлечение изоповерхности и коллизии
// ============================================

pub mod tables;
pub mod marching;
pub mod triangle;
pub mod collider;

pub use marching::{IsosurfaceExtractor, ExtractionOutput, MAX_TRIANGLES_PER_CELL, interpolate_edge};
pub use triangle::{Triangle, VegetationAnchor, TerrainVertex, ChunkMesh};
pub use collider::build_collider;
