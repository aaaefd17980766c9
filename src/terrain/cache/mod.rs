pub mod chunk_key;
pub mod chunk_cache;

pub use chunk_key::ChunkKey;
pub use chunk_cache::{ChunkCache, ChunkCacheEntry};
