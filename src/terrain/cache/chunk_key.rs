// ============================================
// Chunk Key - Идентификатор чанка
// ============================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ключ чанка: целочисленная координата сетки (chunk_x, chunk_z)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct ChunkKey {
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self { x: self.x + dx, z: self.z + dz }
    }

    /// Расстояние Чебышёва в чанках
    #[inline]
    pub fn chebyshev(self, other: ChunkKey) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Строковый id, под которым чанк живёт в кэше и логах
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chunk {}, {}", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        assert_eq!(ChunkKey::new(3, -2).id(), "Chunk 3, -2");
    }

    #[test]
    fn test_offset_and_distance() {
        let key = ChunkKey::new(1, 1).offset(-3, 2);
        assert_eq!(key, ChunkKey::new(-2, 3));
        assert_eq!(key.chebyshev(ChunkKey::new(0, 0)), 3);
    }
}
