// ============================================
// Seabed - Безголовый прогон: подлодка идёт над дном
// ============================================
//
// seabed [config.json] [cache.bin]
// Кэш из второго аргумента подхватывается при старте и пишется при выходе.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ultraviolet::Vec3;

use seabed::biomes::MAX_BIOME_FEATURES;
use seabed::{CacheFile, ChunkContext, ChunkStreamer, StreamerReport, SurfaceConfig, Terraformer};

const FRAMES: u32 = 600;
const FRAME_TIME: Duration = Duration::from_millis(16);
/// Скорость подлодки, м/с
const CRUISE_SPEED: f32 = 6.0;
/// Каждые N кадров меняется режим лепки
const TOGGLE_EVERY: u32 = 150;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SurfaceConfig::load_from_file(&path).unwrap_or_else(|e| {
            log::warn!("Failed to load config '{}': {}, using defaults", path, e);
            SurfaceConfig::default()
        }),
        None => SurfaceConfig::default(),
    };
    let cache_path = args.next().map(PathBuf::from);

    let terraform_config = config.terraform.clone();
    let ctx = match ChunkContext::new(config) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            log::error!("Invalid terrain config: {}", e);
            std::process::exit(1);
        }
    };

    let cruise_height = ctx.config.chunk_world_size() * 0.6;
    let start = Vec3::new(0.0, cruise_height, 0.0);
    let mut streamer = ChunkStreamer::new(Arc::clone(&ctx), start);

    if let Some(path) = cache_path.as_ref().filter(|p| p.exists()) {
        match CacheFile::load(path) {
            Ok(cache) => {
                streamer.adopt_cache(cache);
            }
            Err(e) => log::warn!("Failed to load chunk cache '{}': {}", path.display(), e),
        }
    }

    let mut terraformer = Terraformer::new(terraform_config);
    let mut totals = StreamerReport::default();
    let mut edits = 0usize;
    let clock = Instant::now();
    let mut features = [0.0f32; MAX_BIOME_FEATURES];
    let feature_count = ctx.environment.feature_count();

    for frame in 0..FRAMES {
        let t = frame as f32 * FRAME_TIME.as_secs_f32();
        let position = start + Vec3::new(
            t * CRUISE_SPEED,
            (t * 0.4).sin() * cruise_height * 0.3,
            (t * 0.25).sin() * 40.0,
        );

        let report = streamer.update(position);
        totals.created += report.created;
        totals.restored += report.restored;
        totals.destroyed += report.destroyed;
        totals.evicted += report.evicted;

        if frame > 0 && frame % TOGGLE_EVERY == 0 {
            let mode = terraformer.toggle_mode();
            log::info!("Terraform mode: {:?}", mode);
        }

        // Прицел прямо под подлодкой, на пределе дальности луча
        let aim = position - Vec3::new(0.0, terraformer.range().min(position.y), 0.0);
        let now = clock + FRAME_TIME * frame;
        if let Some(affected) = terraformer.apply(&mut streamer, aim, now) {
            edits += affected;
        }

        if frame % 120 == 0 {
            ctx.environment.sample_features(position.x, position.z, &mut features[..feature_count]);
            let biome = ctx.blender.biome_at(&features[..feature_count]);
            let fog = ctx.environment.fog_at(&biome.params, position.y);
            log::info!(
                "Frame {}: {} in {}, fog density {:.3}, submerged {}",
                frame,
                streamer.center(),
                ctx.blender.dominant_name(&biome),
                fog.density,
                ctx.environment.is_submerged(position.y)
            );
        }
    }

    let triangles: usize = streamer.chunks().map(|c| c.triangles().len()).sum();
    let plants: usize = streamer.chunks().map(|c| c.vegetation().len()).sum();
    let colliders = streamer.chunks().filter(|c| c.collider().is_some()).count();
    log::info!(
        "Done: {} chunks created, {} restored, {} unloaded, {} evicted, {} chunk edits",
        totals.created, totals.restored, totals.destroyed, totals.evicted, edits
    );
    log::info!(
        "Loaded: {} chunks, {} triangles, {} plants, {} colliders, {} cached",
        streamer.loaded_count(), triangles, plants, colliders, streamer.cache().len()
    );

    if let Some(path) = cache_path {
        if let Err(e) = CacheFile::save(&path, &streamer.snapshot_cache()) {
            log::error!("Failed to save chunk cache '{}': {}", path.display(), e);
        }
    }
}
