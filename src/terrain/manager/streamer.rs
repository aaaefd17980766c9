// ============================================
// Chunk Streamer - Скользящее окно чанков вокруг наблюдателя
// ============================================
//
// Окно (2r+1)², слот [gx][gz] хранит чанк (center.x + gx - r, center.z + gz - r).
// Перецентровка только при переходе в другую клетку: ряды/столбцы сдвигаются
// на ±1, выпавшие чанки уходят в кэш, пустые слоты заполняются.
// Смена параметров генерации = полная перезагрузка (кэш тоже сбрасывается).

use std::sync::Arc;

use ultraviolet::Vec3;

use crate::config::{ConfigError, GenerationParams};
use crate::terrain::cache::{ChunkCache, ChunkCacheEntry, ChunkKey};
use crate::terrain::chunk::{Chunk, ChunkContext};
use crate::terrain::terraform::TerraformBrush;

/// Фаза стримера. Shifting и Reloading существуют только внутри `update` и
/// `reload` (под `&mut self`); снаружи всегда виден Idle. Снаружи полезно
/// смотреть на StreamerReport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamerState {
    Idle,
    /// Окно сдвигается и дозаполняется
    Shifting,
    /// Всё уничтожается и создаётся заново
    Reloading,
}

/// Что произошло за один вызов update / reload
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamerReport {
    pub created: usize,
    pub restored: usize,
    pub destroyed: usize,
    /// Снимки, выброшенные из кэша по дальности
    pub evicted: usize,
    pub reloaded: bool,
}

impl StreamerReport {
    pub fn is_empty(&self) -> bool {
        *self == StreamerReport::default()
    }
}

pub struct ChunkStreamer {
    ctx: Arc<ChunkContext>,
    radius: i32,
    side: usize,
    /// Строка = ось x, внутри строки ось z
    slots: Vec<Option<Chunk>>,
    center: ChunkKey,
    params: GenerationParams,
    cache: ChunkCache,
    state: StreamerState,
}

impl ChunkStreamer {
    /// Создать окно вокруг позиции и сразу заполнить его
    pub fn new(ctx: Arc<ChunkContext>, position: Vec3) -> Self {
        let radius = ctx.config.view_radius;
        let side = (2 * radius + 1) as usize;
        let params = ctx.params();
        let center = ctx.chunk_of(position);

        let mut streamer = Self {
            ctx,
            radius,
            side,
            slots: (0..side * side).map(|_| None).collect(),
            center,
            params,
            cache: ChunkCache::new(params),
            state: StreamerState::Idle,
        };
        let report = streamer.fill_empty_slots();
        log::info!(
            "Streamer started at {} with radius {}: {} chunks",
            center, radius, report.created + report.restored
        );
        streamer
    }

    #[inline]
    pub fn context(&self) -> &Arc<ChunkContext> {
        &self.ctx
    }

    #[inline]
    pub fn center(&self) -> ChunkKey {
        self.center
    }

    #[inline]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    #[inline]
    pub fn state(&self) -> StreamerState {
        self.state
    }

    #[inline]
    pub fn params(&self) -> GenerationParams {
        self.params
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    #[inline]
    fn slot_index(&self, gx: usize, gz: usize) -> usize {
        gx * self.side + gz
    }

    #[inline]
    fn slot_key(&self, gx: usize, gz: usize) -> ChunkKey {
        self.center.offset(gx as i32 - self.radius, gz as i32 - self.radius)
    }

    /// Чанк по координате, если он в окне
    pub fn chunk(&self, key: ChunkKey) -> Option<&Chunk> {
        let gx = key.x - self.center.x + self.radius;
        let gz = key.z - self.center.z + self.radius;
        if gx < 0 || gz < 0 || gx >= self.side as i32 || gz >= self.side as i32 {
            return None;
        }
        self.slots[self.slot_index(gx as usize, gz as usize)].as_ref()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.slots.iter().flatten()
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks().count()
    }

    /// Чанки, чей AABB пересекает сферу
    pub fn chunks_in_radius(&self, position: Vec3, radius: f32) -> Vec<&Chunk> {
        self.chunks()
            .filter(|chunk| chunk.bounds().intersects_sphere(position, radius))
            .collect()
    }

    /// Перецентровать окно по позиции наблюдателя
    pub fn update(&mut self, position: Vec3) -> StreamerReport {
        let center = self.ctx.chunk_of(position);
        if center == self.center {
            return StreamerReport::default();
        }

        self.state = StreamerState::Shifting;
        let dx = center.x - self.center.x;
        let dz = center.z - self.center.z;
        let mut report = StreamerReport::default();

        // Дальше side шагов всё окно уже выброшено
        for _ in 0..dx.unsigned_abs().min(self.side as u32) {
            report.destroyed += self.shift_rows(dx.signum());
        }
        for _ in 0..dz.unsigned_abs().min(self.side as u32) {
            report.destroyed += self.shift_columns(dz.signum());
        }
        self.center = center;

        let filled = self.fill_empty_slots();
        report.created = filled.created;
        report.restored = filled.restored;
        if let Some(cache_radius) = self.ctx.config.cache_radius {
            report.evicted = self.cache.evict_beyond(center, cache_radius);
        }
        self.state = StreamerState::Idle;

        log::debug!(
            "Window moved to {}: +{} new, +{} cached, -{} unloaded, {} evicted, cache {}",
            center, report.created, report.restored, report.destroyed, report.evicted, self.cache.len()
        );
        report
    }

    /// Сдвиг вдоль x: выпавшая строка уходит в кэш, освободившаяся пустеет
    fn shift_rows(&mut self, step: i32) -> usize {
        let side = self.side;
        let discard = if step > 0 { 0 } else { side - 1 };
        let mut destroyed = 0;
        for gz in 0..side {
            let idx = self.slot_index(discard, gz);
            destroyed += self.destroy_slot(idx);
        }
        if step > 0 {
            self.slots.rotate_left(side);
        } else {
            self.slots.rotate_right(side);
        }
        destroyed
    }

    /// Сдвиг вдоль z внутри каждой строки
    fn shift_columns(&mut self, step: i32) -> usize {
        let side = self.side;
        let discard = if step > 0 { 0 } else { side - 1 };
        let mut destroyed = 0;
        for gx in 0..side {
            let idx = self.slot_index(gx, discard);
            destroyed += self.destroy_slot(idx);
        }
        for row in self.slots.chunks_mut(side) {
            if step > 0 {
                row.rotate_left(1);
            } else {
                row.rotate_right(1);
            }
        }
        destroyed
    }

    fn destroy_slot(&mut self, idx: usize) -> usize {
        match self.slots[idx].take() {
            Some(chunk) => {
                self.cache.insert(chunk.key(), chunk.into_cache_entry());
                1
            }
            None => 0,
        }
    }

    /// Заполнить пустые слоты: из кэша или генерацией, по задаче на чанк.
    /// Результаты применяются только после завершения всех задач.
    fn fill_empty_slots(&mut self) -> StreamerReport {
        let mut jobs: Vec<(usize, ChunkKey, Option<ChunkCacheEntry>)> = Vec::new();
        for gx in 0..self.side {
            for gz in 0..self.side {
                let idx = self.slot_index(gx, gz);
                if self.slots[idx].is_none() {
                    let key = self.slot_key(gx, gz);
                    jobs.push((idx, key, self.cache.take(key)));
                }
            }
        }

        let mut report = StreamerReport::default();
        if jobs.is_empty() {
            return report;
        }

        let ctx = Arc::clone(&self.ctx);
        let built = self.ctx.config.dispatch.map_items(jobs, move |(idx, key, entry)| {
            let restored = entry.is_some();
            let chunk = match entry {
                Some(entry) => Chunk::restore(key, entry, &ctx),
                None => Chunk::generate(key, &ctx),
            };
            (idx, chunk, restored)
        });

        for (idx, chunk, restored) in built {
            if restored {
                report.restored += 1;
            } else {
                report.created += 1;
            }
            self.slots[idx] = Some(chunk);
        }
        report
    }

    /// Сменить параметры генерации. Те же параметры -> ничего не делает.
    pub fn set_params(&mut self, params: GenerationParams, position: Vec3) -> Result<StreamerReport, ConfigError> {
        if params == self.params {
            return Ok(StreamerReport::default());
        }
        let mut config = self.ctx.config.clone();
        config.set_generation_params(params);
        let ctx = ChunkContext::with_presets(config, self.ctx.blender.presets().to_vec())?;
        Ok(self.reload(Arc::new(ctx), position))
    }

    /// Полная перезагрузка под новый контекст: всё уничтожить, кэш очистить, окно создать заново
    pub fn reload(&mut self, ctx: Arc<ChunkContext>, position: Vec3) -> StreamerReport {
        self.state = StreamerState::Reloading;
        let destroyed = self.slots.iter_mut().filter_map(Option::take).count();

        self.radius = ctx.config.view_radius;
        self.side = (2 * self.radius + 1) as usize;
        self.slots = (0..self.side * self.side).map(|_| None).collect();
        self.params = ctx.params();
        self.center = ctx.chunk_of(position);
        self.ctx = ctx;
        self.cache.reset(self.params);

        let filled = self.fill_empty_slots();
        self.state = StreamerState::Idle;
        log::info!(
            "Reloaded with seed {} iso {} elevation {}: {} chunks",
            self.params.seed, self.params.iso_level, self.params.elevation, filled.created
        );

        StreamerReport { created: filled.created, restored: filled.restored, destroyed, reloaded: true, ..StreamerReport::default() }
    }

    /// Лепка по всем загруженным чанкам, задетым кистью. Возвращает число изменённых.
    pub fn terraform(&mut self, brush: &TerraformBrush, regenerate_vegetation: bool) -> usize {
        let ctx = Arc::clone(&self.ctx);
        self.slots.iter_mut()
            .flatten()
            .filter(|chunk| chunk.bounds().intersects_sphere(brush.center, brush.radius))
            .map(|chunk| chunk.terraform(brush, &ctx, regenerate_vegetation))
            .filter(|&changed| changed)
            .count()
    }

    /// Кэш + снимки загруженных чанков (для записи на диск)
    pub fn snapshot_cache(&self) -> ChunkCache {
        let mut snapshot = self.cache.clone();
        for chunk in self.chunks() {
            snapshot.insert(chunk.key(), chunk.snapshot());
        }
        snapshot
    }

    /// Принять сохранённый кэш. Отклоняется, если собран при других параметрах.
    /// Загруженные чанки, для которых есть снимок, сразу подменяются им.
    pub fn adopt_cache(&mut self, mut cache: ChunkCache) -> bool {
        if cache.params() != self.params {
            log::warn!(
                "Ignoring chunk cache built for seed {} (current seed {})",
                cache.params().seed, self.params.seed
            );
            return false;
        }

        let ctx = Arc::clone(&self.ctx);
        let mut replaced = 0;
        for slot in self.slots.iter_mut() {
            let key = match slot {
                Some(chunk) => chunk.key(),
                None => continue,
            };
            if let Some(entry) = cache.take(key) {
                *slot = Some(Chunk::restore(key, entry, &ctx));
                replaced += 1;
            }
        }

        let adopted = cache.len();
        for (key, entry) in cache.sorted_entries() {
            self.cache.insert(key, entry.clone());
        }
        log::info!("Adopted chunk cache: {} loaded chunks replaced, {} entries cached", replaced, adopted);
        true
    }
}
