pub mod noise;
pub mod density;

pub use noise::{NoiseField, NoiseKind, generate_noise_field, hash_chunk_seed};
pub use density::{DensityField, BiomeSampleMap, density_ceiling, generate_density};
