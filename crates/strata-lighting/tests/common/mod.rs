#![allow(dead_code)]

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use strata_blocks::{Block, BlockRegistry, BlockType};
use strata_lighting::{Pos, Terrain};

pub const BLOCKS_TOML: &str = r#"
[[blocks]]
name = "air"
id = 0
solid = false
light_trough = -1

[[blocks]]
name = "stone"
id = 1
light_trough = -15

[[blocks]]
name = "lamp"
id = 2
solid = false
light_trough = -1
light_emit = 15
"#;

/// Dense box of voxels with lock-free per-voxel storage. Everything outside the
/// box is unloaded.
pub struct GridTerrain {
    pub min: Pos,
    pub max: Pos,
    dims: Pos,
    blocks: Vec<AtomicU32>,
    block_light: Vec<AtomicU8>,
    sun_light: Vec<AtomicU8>,
    registry: BlockRegistry,
}

impl GridTerrain {
    pub fn new(min: Pos, max: Pos, registry: BlockRegistry) -> Self {
        let dims = (max.0 - min.0 + 1, max.1 - min.1 + 1, max.2 - min.2 + 1);
        let n = (dims.0 * dims.1 * dims.2) as usize;
        Self {
            min,
            max,
            dims,
            blocks: (0..n).map(|_| AtomicU32::new(0)).collect(),
            block_light: (0..n).map(|_| AtomicU8::new(0)).collect(),
            sun_light: (0..n).map(|_| AtomicU8::new(0)).collect(),
            registry,
        }
    }

    /// Air with the given trough everywhere inside the box.
    pub fn with_air_trough(min: Pos, max: Pos, trough: i32) -> Self {
        let toml = BLOCKS_TOML.replacen("light_trough = -1", &format!("light_trough = {trough}"), 1);
        Self::new(min, max, BlockRegistry::from_toml_str(&toml).unwrap())
    }

    /// Single-voxel-wide column at (0, 0) from z = 0 to `height`.
    pub fn column(height: i32, air_trough: i32) -> Self {
        Self::with_air_trough((0, 0, 0), (0, 0, height), air_trough)
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    fn idx(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if !self.is_block_loaded(x, y, z) {
            return None;
        }
        let (lx, ly, lz) = (x - self.min.0, y - self.min.1, z - self.min.2);
        Some(((lz * self.dims.1 + ly) * self.dims.0 + lx) as usize)
    }

    pub fn set_block(&self, x: i32, y: i32, z: i32, block: Block) {
        if let Some(i) = self.idx(x, y, z) {
            let packed = (u32::from(block.id) << 8) | u32::from(block.data);
            self.blocks[i].store(packed, Ordering::Release);
        }
    }

    pub fn set_named(&self, x: i32, y: i32, z: i32, name: &str) {
        let block = self.registry.block_by_name(name).unwrap();
        self.set_block(x, y, z, block);
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (self.min.2..=self.max.2).flat_map(move |z| {
            (self.min.1..=self.max.1)
                .flat_map(move |y| (self.min.0..=self.max.0).map(move |x| (x, y, z)))
        })
    }
}

impl Terrain for GridTerrain {
    fn is_block_loaded(&self, x: i32, y: i32, z: i32) -> bool {
        (self.min.0..=self.max.0).contains(&x)
            && (self.min.1..=self.max.1).contains(&y)
            && (self.min.2..=self.max.2).contains(&z)
    }

    fn block(&self, x: i32, y: i32, z: i32) -> Block {
        match self.idx(x, y, z) {
            Some(i) => {
                let packed = self.blocks[i].load(Ordering::Acquire);
                Block::new((packed >> 8) as u16, packed as u8)
            }
            None => Block::AIR,
        }
    }

    fn block_type(&self, block: Block) -> &BlockType {
        self.registry.resolve(block)
    }

    fn highest_block_z_at(&self, x: i32, y: i32) -> Option<i32> {
        (self.min.2..=self.max.2)
            .rev()
            .find(|&z| !self.block(x, y, z).is_air())
    }

    fn block_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.idx(x, y, z).map_or(0, |i| self.block_light[i].load(Ordering::Acquire))
    }

    fn set_block_light(&self, x: i32, y: i32, z: i32, value: u8) {
        if let Some(i) = self.idx(x, y, z) {
            self.block_light[i].store(value, Ordering::Release);
        }
    }

    fn sun_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.idx(x, y, z).map_or(0, |i| self.sun_light[i].load(Ordering::Acquire))
    }

    fn set_sun_light(&self, x: i32, y: i32, z: i32, value: u8) {
        if let Some(i) = self.idx(x, y, z) {
            self.sun_light[i].store(value, Ordering::Release);
        }
    }
}
