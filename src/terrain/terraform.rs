// ============================================
// Terraform - Локальная лепка плотностного поля
// ============================================
// Кисть = сфера в мировых координатах. Вес спадает как (1 - d/r)²,
// на границе радиуса ровно ноль. Плотность заново не генерируется,
// правки живут в поле до выгрузки чанка.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use ultraviolet::Vec3;

use crate::config::TerraformConfig;
use crate::terrain::generation::DensityField;
use crate::terrain::manager::ChunkStreamer;

/// Пределы, до которых лепка может довести плотность
pub const DENSITY_MIN: f32 = -1.0;
pub const DENSITY_MAX: f32 = 2.0;

/// Граница действует только в сторону правки: Add никогда не опускает сэмпл,
/// Remove никогда не поднимает
#[inline]
fn clamp_edit(value: f32, delta: f32, ceiling: f32) -> f32 {
    let edited = value + delta;
    if delta > 0.0 {
        value.max(edited.min(ceiling))
    } else {
        value.min(edited.max(DENSITY_MIN))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerraformMode {
    Add,
    Remove,
}

impl TerraformMode {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            TerraformMode::Add => 1.0,
            TerraformMode::Remove => -1.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TerraformMode::Add => TerraformMode::Remove,
            TerraformMode::Remove => TerraformMode::Add,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerraformBrush {
    pub center: Vec3,
    pub radius: f32,
    pub strength: f32,
    pub mode: TerraformMode,
}

impl TerraformBrush {
    pub fn new(center: Vec3, radius: f32, strength: f32, mode: TerraformMode) -> Self {
        Self { center, radius, strength, mode }
    }

    /// Монотонно убывает, 0 при d >= radius
    #[inline]
    pub fn falloff(&self, distance: f32) -> f32 {
        if distance >= self.radius || self.radius <= 0.0 {
            return 0.0;
        }
        let k = 1.0 - distance / self.radius;
        k * k
    }

    /// Применить к полю чанка с мировым углом `origin`, потолок DENSITY_MAX.
    /// Возвращает число изменённых сэмплов.
    pub fn apply(&self, field: &mut DensityField, origin: Vec3, scale: f32) -> usize {
        self.apply_bounded(field, origin, scale, DENSITY_MAX)
    }

    /// То же с явным потолком для Add (не ниже DENSITY_MAX)
    pub fn apply_bounded(&self, field: &mut DensityField, origin: Vec3, scale: f32, ceiling: f32) -> usize {
        let ceiling = ceiling.max(DENSITY_MAX);
        let local = (self.center - origin) / scale;
        let reach = self.radius / scale;
        let last = (field.size() - 1) as f32;

        let lo = |c: f32| (c - reach).floor().clamp(0.0, last) as u32;
        let hi = |c: f32| (c + reach).ceil().clamp(0.0, last) as u32;
        if local.x + reach < 0.0 || local.y + reach < 0.0 || local.z + reach < 0.0
            || local.x - reach > last || local.y - reach > last || local.z - reach > last
        {
            return 0;
        }

        let delta = self.mode.sign() * self.strength;
        let mut changed = 0;
        for z in lo(local.z)..=hi(local.z) {
            for y in lo(local.y)..=hi(local.y) {
                for x in lo(local.x)..=hi(local.x) {
                    let world = origin + Vec3::new(x as f32, y as f32, z as f32) * scale;
                    let weight = self.falloff((world - self.center).mag());
                    if weight <= 0.0 {
                        continue;
                    }
                    let value = field.get(x, y, z);
                    field.set(x, y, z, clamp_edit(value, delta * weight, ceiling));
                    changed += 1;
                }
            }
        }
        changed
    }
}

/// Контроллер лепки: режим, параметры кисти, кулдаун
#[derive(Clone, Debug)]
pub struct Terraformer {
    config: TerraformConfig,
    mode: TerraformMode,
    last_applied: Option<Instant>,
}

impl Terraformer {
    pub fn new(config: TerraformConfig) -> Self {
        Self { config, mode: TerraformMode::Remove, last_applied: None }
    }

    #[inline]
    pub fn mode(&self) -> TerraformMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TerraformMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> TerraformMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Дальность луча прицеливания у вызывающей стороны
    #[inline]
    pub fn range(&self) -> f32 {
        self.config.range
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.config.interval_ms)
    }

    pub fn brush_at(&self, point: Vec3) -> TerraformBrush {
        TerraformBrush::new(point, self.config.radius, self.config.strength, self.mode)
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_applied {
            Some(last) => now.saturating_duration_since(last) >= self.interval(),
            None => true,
        }
    }

    /// Лепить в точке попадания. None если кулдаун ещё идёт,
    /// иначе число затронутых чанков (0 если рядом нет загруженных).
    pub fn apply(&mut self, streamer: &mut ChunkStreamer, point: Vec3, now: Instant) -> Option<usize> {
        if !self.is_ready(now) {
            log::trace!("Terraform on cooldown");
            return None;
        }
        self.last_applied = Some(now);

        let brush = self.brush_at(point);
        let affected = streamer.terraform(&brush, self.config.regenerate_vegetation);
        log::debug!("Terraform {:?} at ({:.1}, {:.1}, {:.1}): {} chunks", brush.mode, point.x, point.y, point.z, affected);
        Some(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brush(mode: TerraformMode) -> TerraformBrush {
        TerraformBrush::new(Vec3::new(4.0, 4.0, 4.0), 2.5, 0.5, mode)
    }

    #[test]
    fn test_falloff_shape() {
        let b = brush(TerraformMode::Add);
        assert_eq!(b.falloff(0.0), 1.0);
        assert_eq!(b.falloff(2.5), 0.0);
        assert_eq!(b.falloff(10.0), 0.0);
        assert!(b.falloff(0.5) > b.falloff(1.0));
        assert!(b.falloff(2.4) > 0.0);
    }

    #[test]
    fn test_add_raises_only_inside_radius() {
        let original = DensityField::filled(9, 0.3);
        let mut field = original.clone();
        let b = brush(TerraformMode::Add);
        let changed = b.apply(&mut field, Vec3::zero(), 1.0);
        assert!(changed > 0);

        for z in 0..9 {
            for y in 0..9 {
                for x in 0..9 {
                    let d = (Vec3::new(x as f32, y as f32, z as f32) - b.center).mag();
                    let before = original.get(x, y, z);
                    let after = field.get(x, y, z);
                    if d < b.radius {
                        assert!(after > before, "({}, {}, {}) not raised", x, y, z);
                    } else {
                        assert_eq!(after, before);
                    }
                }
            }
        }
    }

    #[test]
    fn test_remove_lowers_inside_radius() {
        let mut field = DensityField::filled(9, 0.3);
        brush(TerraformMode::Remove).apply(&mut field, Vec3::zero(), 1.0);
        assert!(field.get(4, 4, 4) < 0.3);
        assert!((field.get(4, 4, 4) - (0.3 - 0.5)).abs() < 1e-6);
        assert_eq!(field.get(0, 0, 0), 0.3);
    }

    #[test]
    fn test_add_then_remove_restores() {
        let mut field = DensityField::filled(9, 0.4);
        for (i, v) in field.values_mut().iter_mut().enumerate() {
            *v = (i % 13) as f32 / 13.0;
        }
        let original = field.clone();
        for _ in 0..10 {
            brush(TerraformMode::Add).apply(&mut field, Vec3::zero(), 1.0);
            brush(TerraformMode::Remove).apply(&mut field, Vec3::zero(), 1.0);
        }
        for (a, b) in field.values().iter().zip(original.values()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_brush_respects_chunk_origin_and_scale() {
        // Центр кисти вне чанка, но в пределах радиуса от его края
        let mut field = DensityField::filled(5, 0.0);
        let b = TerraformBrush::new(Vec3::new(-1.0, 0.0, 0.0), 2.0, 1.0, TerraformMode::Add);
        let changed = b.apply(&mut field, Vec3::zero(), 1.0);
        // x = 0 и y² + z² < 3
        assert_eq!(changed, 4);
        assert!((field.get(0, 0, 0) - 0.25).abs() < 1e-6);
        assert_eq!(field.get(1, 0, 0), 0.0);

        let far = TerraformBrush::new(Vec3::new(100.0, 0.0, 0.0), 2.0, 1.0, TerraformMode::Add);
        assert_eq!(far.apply(&mut field, Vec3::zero(), 1.0), 0);
    }

    #[test]
    fn test_values_are_clamped() {
        let mut field = DensityField::filled(3, 1.9);
        let b = TerraformBrush::new(Vec3::new(1.0, 1.0, 1.0), 1.5, 5.0, TerraformMode::Add);
        b.apply(&mut field, Vec3::zero(), 1.0);
        assert_eq!(field.get(1, 1, 1), DENSITY_MAX);
    }

    #[test]
    fn test_edits_above_clamp_range_stay_monotonic() {
        use crate::terrain::generation::density_ceiling;

        let b = TerraformBrush::new(Vec3::new(2.0, 2.0, 2.0), 2.0, 0.5, TerraformMode::Add);
        let mut field = DensityField::filled(5, 2.2);
        b.apply(&mut field, Vec3::zero(), 1.0);
        assert_eq!(field.get(2, 2, 2), 2.2);
        assert!(field.values().iter().all(|&v| v >= 2.2));

        // Remove с последующим Add под потолком генерации возвращает значения выше DENSITY_MAX
        let original = DensityField::filled(5, 2.2);
        let mut field = original.clone();
        let remove = TerraformBrush { mode: TerraformMode::Remove, ..b };
        let ceiling = density_ceiling(1.0);
        remove.apply_bounded(&mut field, Vec3::zero(), 1.0, ceiling);
        assert!((field.get(2, 2, 2) - 1.7).abs() < 1e-6);
        b.apply_bounded(&mut field, Vec3::zero(), 1.0, ceiling);
        for (a, o) in field.values().iter().zip(original.values()) {
            assert!((a - o).abs() < 1e-5);
        }
    }

    #[test]
    fn test_generated_chunk_never_lowered_by_add() {
        use crate::config::SurfaceConfig;
        use crate::terrain::cache::ChunkKey;
        use crate::terrain::chunk::ChunkContext;
        use crate::terrain::generation::generate_density;

        let config = SurfaceConfig { chunk_size: 10, elevation: 4.0, ..SurfaceConfig::default() };
        let ctx = ChunkContext::new(config).unwrap();
        let mut field = DensityField::new(10);
        generate_density(&mut field, &ctx, ChunkKey::new(0, 0));
        let before = field.clone();

        let b = TerraformBrush::new(Vec3::new(4.0, 1.0, 4.0), 3.0, 0.5, TerraformMode::Add);
        b.apply(&mut field, Vec3::zero(), 1.0);
        for (after, before) in field.values().iter().zip(before.values()) {
            assert!(after >= before);
        }
    }

    #[test]
    fn test_mode_toggle_and_cooldown() {
        let mut terraformer = Terraformer::new(TerraformConfig::default());
        assert_eq!(terraformer.mode(), TerraformMode::Remove);
        assert_eq!(terraformer.toggle_mode(), TerraformMode::Add);
        assert_eq!(terraformer.brush_at(Vec3::zero()).radius, 5.0);
        assert_eq!(terraformer.range(), 10.0);

        let start = Instant::now();
        assert!(terraformer.is_ready(start));
        terraformer.last_applied = Some(start);
        assert!(!terraformer.is_ready(start + Duration::from_millis(50)));
        assert!(terraformer.is_ready(start + Duration::from_millis(100)));
    }

    #[test]
    fn test_apply_edits_streamed_chunks_with_cooldown() {
        use crate::config::SurfaceConfig;
        use crate::terrain::cache::ChunkKey;
        use crate::terrain::chunk::ChunkContext;
        use crate::terrain::dispatch::Dispatch;
        use std::sync::Arc;

        let config = SurfaceConfig {
            chunk_size: 6,
            view_radius: 1,
            dispatch: Dispatch::Sequential,
            terraform: TerraformConfig { radius: 1.5, strength: 1.0, ..TerraformConfig::default() },
            ..SurfaceConfig::default()
        };
        let ctx = Arc::new(ChunkContext::new(config.clone()).unwrap());
        let mut streamer = ChunkStreamer::new(ctx, Vec3::new(2.5, 0.0, 2.5));
        let before = streamer.chunk(ChunkKey::new(0, 0)).unwrap().density().clone();

        let mut terraformer = Terraformer::new(config.terraform);
        let start = Instant::now();
        let point = Vec3::new(2.5, 2.0, 2.5);
        assert_eq!(terraformer.apply(&mut streamer, point, start), Some(1));
        assert_eq!(terraformer.apply(&mut streamer, point, start + Duration::from_millis(10)), None);

        let after = streamer.chunk(ChunkKey::new(0, 0)).unwrap().density();
        assert!(after.get(2, 2, 2) < before.get(2, 2, 2) || before.get(2, 2, 2) == DENSITY_MIN);

        // Вдали от загруженных чанков - тихий no-op
        let later = start + Duration::from_secs(1);
        assert_eq!(terraformer.apply(&mut streamer, Vec3::new(900.0, 0.0, 900.0), later), Some(0));
    }
}
