pub mod streamer;

pub use streamer::{ChunkStreamer, StreamerReport, StreamerState};
