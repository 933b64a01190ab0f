use strata_blocks::{Block, BlockType};

/// Global voxel position.
pub type Pos = (i32, i32, i32);

/// World access needed by the light engine.
///
/// The engine's worker is the only writer of light values, but block data may
/// change under it. Implementations must make each single-voxel read and write
/// atomic; nothing stronger is assumed across a flood.
pub trait Terrain: Send + Sync {
    fn is_block_loaded(&self, x: i32, y: i32, z: i32) -> bool;

    fn block(&self, x: i32, y: i32, z: i32) -> Block;

    fn block_type(&self, block: Block) -> &BlockType;

    /// Highest non-air voxel of the column, or `None` if the column is empty.
    fn highest_block_z_at(&self, x: i32, y: i32) -> Option<i32>;

    fn block_light(&self, x: i32, y: i32, z: i32) -> u8;

    fn set_block_light(&self, x: i32, y: i32, z: i32, value: u8);

    fn sun_light(&self, x: i32, y: i32, z: i32) -> u8;

    fn set_sun_light(&self, x: i32, y: i32, z: i32, value: u8);
}
