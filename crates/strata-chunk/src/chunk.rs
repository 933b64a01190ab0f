use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use strata_blocks::Block;
use strata_section::{ByteSection, NibbleSection, SectionTag, ShortSection};

use crate::layout::{ChunkLayout, Pos};

/// Light sub-field holding block (emitted) light.
pub const BLOCK_LIGHT: usize = 0;
/// Light sub-field holding sun light.
pub const SUN_LIGHT: usize = 1;

/// Per-voxel attributes of one chunk, stored as three section grids sharing a layout.
#[derive(Clone, Debug)]
pub struct Chunk {
    layout: ChunkLayout,
    blocks: Vec<ShortSection>,
    data: Vec<ByteSection>,
    light: Vec<NibbleSection>,
}

/// Persisted chunk: one section record per grid cell for each attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkTag {
    #[serde(rename = "Blocks", default)]
    pub blocks: Vec<SectionTag>,
    #[serde(rename = "Data", default)]
    pub data: Vec<SectionTag>,
    #[serde(rename = "Light", default)]
    pub light: Vec<SectionTag>,
}

impl Chunk {
    pub fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            blocks: layout.create_data(ShortSection::new),
            data: layout.create_data(ByteSection::new),
            light: layout.create_data(NibbleSection::new),
        }
    }

    #[inline]
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.layout.contains(x, y, z)
    }

    pub fn block(&self, x: i32, y: i32, z: i32) -> Block {
        let o = self.layout.local_offset(x, y, z);
        let id = self.layout.section(&self.blocks, x, y, z).get(o);
        let data = self.layout.section(&self.data, x, y, z).get(o);
        Block::new(id, data as u8)
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) {
        let o = self.layout.local_offset(x, y, z);
        self.layout
            .section_mut(&mut self.blocks, x, y, z)
            .set(o, block.id);
        self.layout
            .section_mut(&mut self.data, x, y, z)
            .set(o, u16::from(block.data));
    }

    #[inline]
    fn light_offset(&self, x: i32, y: i32, z: i32, kind: usize) -> usize {
        self.layout.local_offset(x, y, z) * 2 + kind
    }

    pub fn light(&self, x: i32, y: i32, z: i32, kind: usize) -> u8 {
        let o = self.light_offset(x, y, z, kind);
        self.layout.section(&self.light, x, y, z).get(o) as u8
    }

    pub fn set_light(&mut self, x: i32, y: i32, z: i32, kind: usize, value: u8) {
        let o = self.light_offset(x, y, z, kind);
        self.layout
            .section_mut(&mut self.light, x, y, z)
            .set(o, u16::from(value));
    }

    #[inline]
    pub fn block_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light(x, y, z, BLOCK_LIGHT)
    }

    #[inline]
    pub fn set_block_light(&mut self, x: i32, y: i32, z: i32, value: u8) {
        self.set_light(x, y, z, BLOCK_LIGHT, value);
    }

    #[inline]
    pub fn sun_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light(x, y, z, SUN_LIGHT)
    }

    #[inline]
    pub fn set_sun_light(&mut self, x: i32, y: i32, z: i32, value: u8) {
        self.set_light(x, y, z, SUN_LIGHT, value);
    }

    /// True when every voxel in the inclusive box is air.
    pub fn is_empty_in_box(&self, min: Pos, max: Pos) -> bool {
        let layout = self.layout;
        let (ssx, ssy, ssz) = layout.section_size();
        let flow = layout.for_in_box(&self.blocks, min, max, |i, section| {
            if section.is_empty() {
                return ControlFlow::Continue(());
            }
            if section.is_uniform() {
                return ControlFlow::Break(());
            }
            let (ox, oy, oz) = layout.section_origin(i);
            let lo = (min.0.max(ox), min.1.max(oy), min.2.max(oz));
            let hi = (
                max.0.min(ox + ssx - 1),
                max.1.min(oy + ssy - 1),
                max.2.min(oz + ssz - 1),
            );
            for z in lo.2..=hi.2 {
                for y in lo.1..=hi.1 {
                    for x in lo.0..=hi.0 {
                        if section.get(layout.local_offset(x, y, z)) != 0 {
                            return ControlFlow::Break(());
                        }
                    }
                }
            }
            ControlFlow::Continue(())
        });
        flow.is_continue()
    }

    #[inline]
    pub fn is_all_air(&self) -> bool {
        self.blocks.iter().all(|s| s.is_empty())
    }

    /// Highest non-air voxel in the local column `(x, y)`.
    pub fn highest_block_z(&self, x: i32, y: i32) -> Option<i32> {
        let (_, _, size_z) = self.layout.chunk_size();
        let (_, _, ssz) = self.layout.section_size();
        let mut top = size_z - 1;
        while top >= 0 {
            let section = self.layout.section(&self.blocks, x, y, top);
            if !section.is_empty() {
                for z in (top - ssz + 1..=top).rev() {
                    if section.get(self.layout.local_offset(x, y, z)) != 0 {
                        return Some(z);
                    }
                }
            }
            top -= ssz;
        }
        None
    }

    /// Compress every section; returns how many report the uniform representation.
    pub fn compress(&mut self) -> usize {
        let blocks = self.blocks.iter_mut().map(|s| s.compress());
        let data = self.data.iter_mut().map(|s| s.compress());
        let light = self.light.iter_mut().map(|s| s.compress());
        blocks.chain(data).chain(light).filter(|&uniform| uniform).count()
    }

    /// Sections currently holding a dense buffer.
    pub fn dense_sections(&self) -> usize {
        self.blocks.iter().filter(|s| !s.is_uniform()).count()
            + self.data.iter().filter(|s| !s.is_uniform()).count()
            + self.light.iter().filter(|s| !s.is_uniform()).count()
    }

    pub fn write(&self) -> ChunkTag {
        ChunkTag {
            blocks: self.blocks.iter().map(|s| s.write()).collect(),
            data: self.data.iter().map(|s| s.write()).collect(),
            light: self.light.iter().map(|s| s.write()).collect(),
        }
    }

    /// Restore from a record. Missing section records reset that section to empty.
    pub fn read(&mut self, tag: &ChunkTag) {
        let count = self.layout.section_count();
        if tag.blocks.len() != count || tag.data.len() != count || tag.light.len() != count {
            log::warn!(
                "chunk record has {}/{}/{} sections, expected {}",
                tag.blocks.len(),
                tag.data.len(),
                tag.light.len(),
                count
            );
        }
        let empty = SectionTag::default();
        for (i, s) in self.blocks.iter_mut().enumerate() {
            s.read(tag.blocks.get(i).unwrap_or(&empty));
        }
        for (i, s) in self.data.iter_mut().enumerate() {
            s.read(tag.data.get(i).unwrap_or(&empty));
        }
        for (i, s) in self.light.iter_mut().enumerate() {
            s.read(tag.light.get(i).unwrap_or(&empty));
        }
    }

    pub fn from_tag(layout: ChunkLayout, tag: &ChunkTag) -> Self {
        let mut c = Self::new(layout);
        c.read(tag);
        c
    }
}
