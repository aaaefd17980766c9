// ============================================
// Cache File - Чтение/запись кэша чанков
// ============================================
//
// [CacheHeader (bincode)] [zstd(bincode(Vec<(ChunkKey, ChunkCacheEntry)>))]
// Записи пишутся в порядке ключей: одинаковый кэш = одинаковый файл.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::terrain::cache::{ChunkCache, ChunkCacheEntry, ChunkKey};

use super::header::{CacheHeader, MAGIC_NUMBER, SAVE_VERSION};

const COMPRESSION_LEVEL: i32 = 3;

/// Ошибки сохранения/загрузки
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Serialize(String),
    Deserialize(String),
    InvalidMagic,
    UnsupportedVersion(u32),
    Compression(String),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "cache io error: {}", e),
            SaveError::Serialize(e) => write!(f, "cache serialize error: {}", e),
            SaveError::Deserialize(e) => write!(f, "cache deserialize error: {}", e),
            SaveError::InvalidMagic => write!(f, "not a chunk cache file"),
            SaveError::UnsupportedVersion(v) => {
                write!(f, "unsupported cache version {} (expected {})", v, SAVE_VERSION)
            }
            SaveError::Compression(e) => write!(f, "cache compression error: {}", e),
        }
    }
}

impl std::error::Error for SaveError {}

pub struct CacheFile;

impl CacheFile {
    pub fn save(path: impl AsRef<Path>, cache: &ChunkCache) -> Result<(), SaveError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let entries = cache.sorted_entries();
        let header = CacheHeader::new(cache.params(), entries.len() as u32);
        bincode::serialize_into(&mut writer, &header)
            .map_err(|e| SaveError::Serialize(e.to_string()))?;

        let body_bytes = bincode::serialize(&entries)
            .map_err(|e| SaveError::Serialize(e.to_string()))?;
        let compressed = zstd::encode_all(&body_bytes[..], COMPRESSION_LEVEL)
            .map_err(|e| SaveError::Compression(e.to_string()))?;
        writer.write_all(&compressed)?;
        writer.flush()?;

        log::info!(
            "Saved {} cached chunks to {} ({} -> {} bytes)",
            entries.len(), path.display(), body_bytes.len(), compressed.len()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<ChunkCache, SaveError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header: CacheHeader = bincode::deserialize_from(&mut reader)
            .map_err(|e| SaveError::Deserialize(e.to_string()))?;
        if header.magic != MAGIC_NUMBER {
            return Err(SaveError::InvalidMagic);
        }
        if header.version != SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion(header.version));
        }

        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed)?;
        let body_bytes = zstd::decode_all(&compressed[..])
            .map_err(|e| SaveError::Compression(e.to_string()))?;
        let entries: Vec<(ChunkKey, ChunkCacheEntry)> = bincode::deserialize(&body_bytes)
            .map_err(|e| SaveError::Deserialize(e.to_string()))?;

        if entries.len() != header.entry_count as usize {
            return Err(SaveError::Deserialize(format!(
                "header announces {} entries, body has {}", header.entry_count, entries.len()
            )));
        }

        log::info!("Loaded {} cached chunks from {}", entries.len(), path.display());
        Ok(ChunkCache::from_entries(header.params, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationParams;
    use crate::terrain::generation::{BiomeSampleMap, DensityField};
    use crate::terrain::mesh::{Triangle, VegetationAnchor};
    use std::env;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("seabed_{}_{}.cache", name, std::process::id()))
    }

    fn sample_cache() -> ChunkCache {
        let params = GenerationParams { seed: 42, iso_level: 0.4, elevation: 2.0 };
        let mut cache = ChunkCache::new(params);
        for (x, z) in [(0, 0), (-3, 1)] {
            let mut density = DensityField::filled(4, 0.25);
            density.set(1, 2, 3, x as f32);
            cache.insert(ChunkKey::new(x, z), ChunkCacheEntry {
                density,
                triangles: vec![Triangle { a: [0.0, 1.0, 0.0], b: [1.0, 0.0, 0.0], c: [0.0, 0.0, 1.0] }],
                anchors: vec![VegetationAnchor { position: [0.3, 0.3, 0.3], dot: 0.5 }],
                biome_samples: BiomeSampleMap { resolution: 0, samples: Vec::new(), dominant: Vec::new() },
                vegetation: Vec::new(),
            });
        }
        cache
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let cache = sample_cache();
        CacheFile::save(&path, &cache).unwrap();
        let loaded = CacheFile::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.params(), cache.params());
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(ChunkKey::new(-3, 1)), cache.get(ChunkKey::new(-3, 1)));
        assert_eq!(loaded.get(ChunkKey::new(-3, 1)).unwrap().density.get(1, 2, 3), -3.0);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let path = temp_path("magic");
        let header = CacheHeader { magic: *b"RUST", ..CacheHeader::new(GenerationParams::default(), 0) };
        std::fs::write(&path, bincode::serialize(&header).unwrap()).unwrap();
        let result = CacheFile::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(SaveError::InvalidMagic)));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let path = temp_path("version");
        let header = CacheHeader { version: SAVE_VERSION + 1, ..CacheHeader::new(GenerationParams::default(), 0) };
        std::fs::write(&path, bincode::serialize(&header).unwrap()).unwrap();
        let result = CacheFile::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(SaveError::UnsupportedVersion(v)) if v == SAVE_VERSION + 1));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = CacheFile::load(temp_path("missing_never_written"));
        assert!(matches!(result, Err(SaveError::Io(_))));
    }

    #[test]
    fn test_identical_cache_gives_identical_file() {
        let (a, b) = (temp_path("same_a"), temp_path("same_b"));
        CacheFile::save(&a, &sample_cache()).unwrap();
        CacheFile::save(&b, &sample_cache()).unwrap();
        let (bytes_a, bytes_b) = (std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
        std::fs::remove_file(&a).ok();
        std::fs::remove_file(&b).ok();
        assert_eq!(bytes_a, bytes_b);
    }
}
