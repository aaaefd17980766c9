pub mod context;
pub mod chunk;

pub use context::ChunkContext;
pub use chunk::{Chunk, ChunkBounds};
