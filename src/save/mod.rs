// ============================================
// Save System - Кэш чанков на диске
// ============================================
// Заголовок bincode + тело bincode под ZSTD

mod header;
mod cache_file;

pub use header::{CacheHeader, MAGIC_NUMBER, SAVE_VERSION};
pub use cache_file::{CacheFile, SaveError};
