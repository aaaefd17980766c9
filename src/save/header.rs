// ============================================
// Cache Header - Заголовок файла кэша
// ============================================

use serde::{Serialize, Deserialize};

use crate::config::GenerationParams;

/// Магическое число "SBED" в ASCII
pub const MAGIC_NUMBER: [u8; 4] = [0x53, 0x42, 0x45, 0x44];

/// Версия формата
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHeader {
    pub magic: [u8; 4],
    pub version: u32,
    /// Параметры, при которых собран кэш
    pub params: GenerationParams,
    /// Число записей в теле
    pub entry_count: u32,
}

impl CacheHeader {
    pub fn new(params: GenerationParams, entry_count: u32) -> Self {
        Self {
            magic: MAGIC_NUMBER,
            version: SAVE_VERSION,
            params,
            entry_count,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC_NUMBER && self.version == SAVE_VERSION
    }
}
