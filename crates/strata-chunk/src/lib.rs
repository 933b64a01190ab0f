//! Chunk coordinate layout and the chunk attribute buffers.
#![forbid(unsafe_code)]

mod chunk;
mod layout;

pub use chunk::{BLOCK_LIGHT, Chunk, ChunkTag, SUN_LIGHT};
pub use layout::{ChunkLayout, LayoutError, Pos};
