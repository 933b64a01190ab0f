use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::HashMap;
use rayon::prelude::*;
use strata_blocks::{Block, BlockRegistry, BlockType};
use strata_chunk::{Chunk, ChunkLayout, ChunkTag, Pos};
use strata_lighting::{LightQueue, LightingError, Terrain};

use crate::chunk_coord::ChunkCoord;

#[derive(Default)]
struct Resident {
    chunks: HashMap<ChunkCoord, Chunk>,
    // Loaded cz values per (cx, cy) column, highest first.
    columns: HashMap<(i32, i32), Vec<i32>>,
}

impl Resident {
    /// Insert or replace a chunk, returning the one it replaced.
    fn put(&mut self, coord: ChunkCoord, chunk: Chunk) -> Option<Chunk> {
        let prev = self.chunks.insert(coord, chunk);
        if prev.is_none() {
            let col = self.columns.entry((coord.cx, coord.cy)).or_default();
            col.push(coord.cz);
            col.sort_unstable_by(|a, b| b.cmp(a));
        }
        prev
    }
}

/// Sparse set of resident chunks addressed by global voxel coordinates.
///
/// All access goes through one reader-writer lock, so every single-voxel read
/// or write is atomic with respect to the light worker.
pub struct World {
    layout: ChunkLayout,
    registry: Arc<BlockRegistry>,
    resident: RwLock<Resident>,
}

impl World {
    pub fn new(layout: ChunkLayout, registry: Arc<BlockRegistry>) -> Self {
        Self {
            layout,
            registry,
            resident: RwLock::new(Resident::default()),
        }
    }

    #[inline]
    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    #[inline]
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    fn read(&self) -> RwLockReadGuard<'_, Resident> {
        self.resident.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Resident> {
        self.resident.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Chunk holding a global position and the position inside it.
    #[inline]
    pub fn chunk_of(&self, x: i32, y: i32, z: i32) -> (ChunkCoord, Pos) {
        let (bx, by, bz) = self.layout.chunk_bits();
        let (sx, sy, sz) = self.layout.chunk_size();
        (
            ChunkCoord::new(x >> bx, y >> by, z >> bz),
            (x & (sx - 1), y & (sy - 1), z & (sz - 1)),
        )
    }

    /// Global position of a chunk's first voxel.
    #[inline]
    pub fn chunk_origin(&self, coord: ChunkCoord) -> Pos {
        let (bx, by, bz) = self.layout.chunk_bits();
        (coord.cx << bx, coord.cy << by, coord.cz << bz)
    }

    /// Make a chunk resident with empty attributes. Returns false if it already was.
    pub fn load_chunk(&self, coord: ChunkCoord) -> bool {
        let mut r = self.write();
        if r.chunks.contains_key(&coord) {
            return false;
        }
        r.put(coord, Chunk::new(self.layout));
        true
    }

    pub fn unload_chunk(&self, coord: ChunkCoord) -> Option<Chunk> {
        let mut r = self.write();
        let chunk = r.chunks.remove(&coord)?;
        if let Some(col) = r.columns.get_mut(&(coord.cx, coord.cy)) {
            col.retain(|&cz| cz != coord.cz);
            if col.is_empty() {
                r.columns.remove(&(coord.cx, coord.cy));
            }
        }
        Some(chunk)
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.read().chunks.contains_key(&coord)
    }

    pub fn loaded_chunks(&self) -> Vec<ChunkCoord> {
        let mut v: Vec<ChunkCoord> = self.read().chunks.keys().copied().collect();
        v.sort_unstable_by_key(|c| (c.cz, c.cy, c.cx));
        v
    }

    pub fn with_chunk<R>(&self, coord: ChunkCoord, f: impl FnOnce(&Chunk) -> R) -> Option<R> {
        self.read().chunks.get(&coord).map(f)
    }

    /// Write a block. Returns false when the position is not resident.
    pub fn set_block(&self, x: i32, y: i32, z: i32, block: Block) -> bool {
        let (coord, (lx, ly, lz)) = self.chunk_of(x, y, z);
        match self.write().chunks.get_mut(&coord) {
            Some(chunk) => {
                chunk.set_block(lx, ly, lz, block);
                true
            }
            None => false,
        }
    }

    /// Block at a global position; air where no chunk is resident.
    pub fn block(&self, x: i32, y: i32, z: i32) -> Block {
        let (coord, (lx, ly, lz)) = self.chunk_of(x, y, z);
        self.read()
            .chunks
            .get(&coord)
            .map_or(Block::AIR, |c| c.block(lx, ly, lz))
    }

    /// Write a block and queue its position for relighting.
    pub fn edit(&self, queue: &LightQueue, x: i32, y: i32, z: i32, block: Block) -> Result<bool, LightingError> {
        if !self.set_block(x, y, z, block) {
            return Ok(false);
        }
        queue.update_light(x, y, z)?;
        Ok(true)
    }

    /// Fill the inclusive box with `block`, skipping non-resident voxels. Returns voxels written.
    pub fn fill_box(&self, min: Pos, max: Pos, block: Block) -> usize {
        let mut r = self.write();
        let mut written = 0;
        for z in min.2..=max.2 {
            for y in min.1..=max.1 {
                for x in min.0..=max.0 {
                    let (coord, (lx, ly, lz)) = self.chunk_of(x, y, z);
                    if let Some(chunk) = r.chunks.get_mut(&coord) {
                        chunk.set_block(lx, ly, lz, block);
                        written += 1;
                    }
                }
            }
        }
        written
    }

    /// Compress every resident chunk in parallel. Returns how many written sections collapsed.
    pub fn compress(&self) -> usize {
        let mut r = self.write();
        let before: usize = r.chunks.values().map(Chunk::dense_sections).sum();
        let uniform: usize = r.chunks.par_iter_mut().map(|(_, c)| c.compress()).sum();
        let after: usize = r.chunks.values().map(Chunk::dense_sections).sum();
        log::debug!(
            "compressed {} chunks: dense sections {} -> {}",
            r.chunks.len(),
            before,
            after
        );
        uniform
    }

    pub fn save_chunk(&self, coord: ChunkCoord) -> Option<ChunkTag> {
        self.with_chunk(coord, Chunk::write)
    }

    /// Replace (or load) a chunk from its record.
    pub fn restore_chunk(&self, coord: ChunkCoord, tag: &ChunkTag) {
        let chunk = Chunk::from_tag(self.layout, tag);
        self.write().put(coord, chunk);
    }

    fn light_at(&self, x: i32, y: i32, z: i32, kind: usize) -> u8 {
        let (coord, (lx, ly, lz)) = self.chunk_of(x, y, z);
        self.read()
            .chunks
            .get(&coord)
            .map_or(0, |c| c.light(lx, ly, lz, kind))
    }

    fn set_light_at(&self, x: i32, y: i32, z: i32, kind: usize, value: u8) {
        let (coord, (lx, ly, lz)) = self.chunk_of(x, y, z);
        if let Some(c) = self.write().chunks.get_mut(&coord) {
            c.set_light(lx, ly, lz, kind, value);
        }
    }
}

impl Terrain for World {
    fn is_block_loaded(&self, x: i32, y: i32, z: i32) -> bool {
        self.is_loaded(self.chunk_of(x, y, z).0)
    }

    fn block(&self, x: i32, y: i32, z: i32) -> Block {
        World::block(self, x, y, z)
    }

    fn block_type(&self, block: Block) -> &BlockType {
        self.registry.resolve(block)
    }

    fn highest_block_z_at(&self, x: i32, y: i32) -> Option<i32> {
        let (coord, (lx, ly, _)) = self.chunk_of(x, y, 0);
        let r = self.read();
        let column = r.columns.get(&(coord.cx, coord.cy))?;
        column.iter().find_map(|&cz| {
            let chunk = r.chunks.get(&ChunkCoord::new(coord.cx, coord.cy, cz))?;
            let z = chunk.highest_block_z(lx, ly)?;
            Some(self.chunk_origin(ChunkCoord::new(coord.cx, coord.cy, cz)).2 + z)
        })
    }

    fn block_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light_at(x, y, z, strata_chunk::BLOCK_LIGHT)
    }

    fn set_block_light(&self, x: i32, y: i32, z: i32, value: u8) {
        self.set_light_at(x, y, z, strata_chunk::BLOCK_LIGHT, value);
    }

    fn sun_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light_at(x, y, z, strata_chunk::SUN_LIGHT)
    }

    fn set_sun_light(&self, x: i32, y: i32, z: i32, value: u8) {
        self.set_light_at(x, y, z, strata_chunk::SUN_LIGHT, value);
    }
}

/// Queue every voxel of the inclusive box. Returns how many were queued.
pub fn enqueue_box(queue: &LightQueue, min: Pos, max: Pos) -> Result<usize, LightingError> {
    let mut n = 0;
    for z in (min.2..=max.2).rev() {
        for y in min.1..=max.1 {
            for x in min.0..=max.0 {
                queue.update_light(x, y, z)?;
                n += 1;
            }
        }
    }
    Ok(n)
}
