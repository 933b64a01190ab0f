//! Block and sun light propagation over a shared terrain, driven by a single worker thread.
#![forbid(unsafe_code)]

mod engine;
mod flood;
mod terrain;

pub use engine::{EngineReport, LightQueue, LightingConfig, LightingEngine, LightingError, ShutdownPolicy};
pub use flood::{Flood, FloodStats, LightKind, NEIGHBORS, block_base, candidate, sun_base};
pub use terrain::{Pos, Terrain};

pub use strata_blocks::registry::MAX_LIGHT;
