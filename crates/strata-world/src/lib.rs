//! Resident chunk storage and the terrain view used by the light engine.
#![forbid(unsafe_code)]

mod chunk_coord;
mod world;

pub use chunk_coord::ChunkCoord;
pub use world::{World, enqueue_box};
