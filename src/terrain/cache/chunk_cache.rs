// ============================================
// Chunk Cache - Снимки выгруженных чанков
// ============================================
// Чанк, ушедший из окна, отдаёт сюда плотность, меш и выходы биомов.
// При возврате на ту же координату забирает их обратно без пересчёта.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::chunk_key::ChunkKey;
use crate::config::GenerationParams;
use crate::terrain::generation::{BiomeSampleMap, DensityField};
use crate::terrain::mesh::{Triangle, VegetationAnchor};
use crate::terrain::vegetation::VegetationPlacement;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkCacheEntry {
    /// Плотность со всеми правками терраформинга
    pub density: DensityField,
    /// Треугольники в локальных координатах чанка
    pub triangles: Vec<Triangle>,
    pub anchors: Vec<VegetationAnchor>,
    pub biome_samples: BiomeSampleMap,
    pub vegetation: Vec<VegetationPlacement>,
}

/// Кэш действителен только для тех параметров генерации, при которых он собран
#[derive(Clone, Debug, Default)]
pub struct ChunkCache {
    entries: HashMap<ChunkKey, ChunkCacheEntry>,
    params: GenerationParams,
}

impl ChunkCache {
    pub fn new(params: GenerationParams) -> Self {
        Self { entries: HashMap::new(), params }
    }

    pub fn from_entries(params: GenerationParams, entries: Vec<(ChunkKey, ChunkCacheEntry)>) -> Self {
        Self { entries: entries.into_iter().collect(), params }
    }

    #[inline]
    pub fn params(&self) -> GenerationParams {
        self.params
    }

    /// Положить снимок (повторная выгрузка той же координаты заменяет старый)
    pub fn insert(&mut self, key: ChunkKey, entry: ChunkCacheEntry) {
        self.entries.insert(key, entry);
    }

    /// Забрать снимок: владение переходит обратно к чанку
    pub fn take(&mut self, key: ChunkKey) -> Option<ChunkCacheEntry> {
        self.entries.remove(&key)
    }

    pub fn get(&self, key: ChunkKey) -> Option<&ChunkCacheEntry> {
        self.entries.get(&key)
    }

    #[inline]
    pub fn contains(&self, key: ChunkKey) -> bool {
        self.entries.contains_key(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Полная очистка под новые параметры генерации
    pub fn reset(&mut self, params: GenerationParams) {
        self.entries.clear();
        self.params = params;
    }

    /// Выбросить снимки дальше `radius` чанков (по Чебышёву) от центра.
    /// Правки терраформинга в них теряются. Возвращает число выброшенных.
    pub fn evict_beyond(&mut self, center: ChunkKey, radius: i32) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.chebyshev(center) <= radius);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChunkKey, &ChunkCacheEntry)> {
        self.entries.iter()
    }

    /// Записи в стабильном порядке ключей (для сохранения на диск)
    pub fn sorted_entries(&self) -> Vec<(ChunkKey, &ChunkCacheEntry)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, e)| (*k, e)).collect();
        entries.sort_by_key(|(k, _)| (k.x, k.z));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: f32) -> ChunkCacheEntry {
        ChunkCacheEntry {
            density: DensityField::filled(3, value),
            triangles: Vec::new(),
            anchors: Vec::new(),
            biome_samples: BiomeSampleMap { resolution: 0, samples: Vec::new(), dominant: Vec::new() },
            vegetation: Vec::new(),
        }
    }

    #[test]
    fn test_take_transfers_ownership() {
        let mut cache = ChunkCache::new(GenerationParams::default());
        cache.insert(ChunkKey::new(1, 2), entry(0.7));
        assert!(cache.contains(ChunkKey::new(1, 2)));

        let restored = cache.take(ChunkKey::new(1, 2)).unwrap();
        assert_eq!(restored.density.get(0, 0, 0), 0.7);
        assert!(cache.is_empty());
        assert!(cache.take(ChunkKey::new(1, 2)).is_none());
    }

    #[test]
    fn test_reinsert_replaces() {
        let mut cache = ChunkCache::new(GenerationParams::default());
        cache.insert(ChunkKey::new(0, 0), entry(0.1));
        cache.insert(ChunkKey::new(0, 0), entry(0.2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(ChunkKey::new(0, 0)).unwrap().density.get(1, 1, 1), 0.2);
    }

    #[test]
    fn test_reset_clears_and_rekeys() {
        let mut cache = ChunkCache::new(GenerationParams::default());
        cache.insert(ChunkKey::new(0, 0), entry(0.1));
        let params = GenerationParams { seed: 9, ..GenerationParams::default() };
        cache.reset(params);
        assert!(cache.is_empty());
        assert_eq!(cache.params(), params);
    }

    #[test]
    fn test_evict_beyond_radius() {
        let mut cache = ChunkCache::new(GenerationParams::default());
        for (x, z) in [(0, 0), (3, -3), (4, 0), (-2, 7)] {
            cache.insert(ChunkKey::new(x, z), entry(0.0));
        }
        assert_eq!(cache.evict_beyond(ChunkKey::new(1, 0), 3), 2);
        assert!(cache.contains(ChunkKey::new(0, 0)));
        assert!(cache.contains(ChunkKey::new(3, -3)));
        assert!(!cache.contains(ChunkKey::new(4, 0)));
        assert_eq!(cache.evict_beyond(ChunkKey::new(1, 0), 3), 0);
    }

    #[test]
    fn test_sorted_entries_are_stable() {
        let mut cache = ChunkCache::new(GenerationParams::default());
        for (x, z) in [(2, 0), (-1, 5), (-1, -3), (0, 0)] {
            cache.insert(ChunkKey::new(x, z), entry(0.0));
        }
        let keys: Vec<_> = cache.sorted_entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![ChunkKey::new(-1, -3), ChunkKey::new(-1, 5), ChunkKey::new(0, 0), ChunkKey::new(2, 0)]);
    }
}
