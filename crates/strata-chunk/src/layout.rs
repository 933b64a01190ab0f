use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Integer voxel position, chunk-local unless stated otherwise.
pub type Pos = (i32, i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("position ({x}, {y}, {z}) is outside the chunk ({sx}x{sy}x{sz})")]
    OutOfRange {
        x: i32,
        y: i32,
        z: i32,
        sx: i32,
        sy: i32,
        sz: i32,
    },
}

/// Bit widths splitting a chunk into a grid of sections.
///
/// A chunk is `2^x_section_bits * 2^y_section_bits * 2^z_section_bits` sections,
/// each `2^x_size_bits * 2^y_size_bits * 2^z_size_bits` voxels. A chunk-local
/// coordinate `x` lives in section `x >> x_size_bits` at offset `x & x_size_mask`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkLayout {
    pub x_section_bits: u8,
    pub y_section_bits: u8,
    pub z_section_bits: u8,
    pub x_size_bits: u8,
    pub y_size_bits: u8,
    pub z_size_bits: u8,
}

impl Default for ChunkLayout {
    // 16x16x128 chunks made of eight 16^3 sections stacked along z.
    fn default() -> Self {
        Self::new((0, 0, 3), (4, 4, 4))
    }
}

impl ChunkLayout {
    pub const fn new(section_bits: (u8, u8, u8), size_bits: (u8, u8, u8)) -> Self {
        Self {
            x_section_bits: section_bits.0,
            y_section_bits: section_bits.1,
            z_section_bits: section_bits.2,
            x_size_bits: size_bits.0,
            y_size_bits: size_bits.1,
            z_size_bits: size_bits.2,
        }
    }

    #[inline]
    pub fn size_bits(&self) -> (u8, u8, u8) {
        (self.x_size_bits, self.y_size_bits, self.z_size_bits)
    }

    /// Per-axis chunk extent as a power of two.
    #[inline]
    pub fn chunk_bits(&self) -> (u8, u8, u8) {
        (
            self.x_section_bits + self.x_size_bits,
            self.y_section_bits + self.y_size_bits,
            self.z_section_bits + self.z_size_bits,
        )
    }

    #[inline]
    pub fn chunk_size(&self) -> Pos {
        let (bx, by, bz) = self.chunk_bits();
        (1 << bx, 1 << by, 1 << bz)
    }

    #[inline]
    pub fn section_size(&self) -> Pos {
        (1 << self.x_size_bits, 1 << self.y_size_bits, 1 << self.z_size_bits)
    }

    #[inline]
    pub fn section_count(&self) -> usize {
        1usize << (self.x_section_bits + self.y_section_bits + self.z_section_bits)
    }

    /// Number of voxels in one section.
    #[inline]
    pub fn section_volume(&self) -> usize {
        1usize << (self.x_size_bits + self.y_size_bits + self.z_size_bits)
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        let (sx, sy, sz) = self.chunk_size();
        x >= 0 && y >= 0 && z >= 0 && x < sx && y < sy && z < sz
    }

    /// Split a chunk-local coordinate into (section coordinate, intra-section coordinate).
    #[inline]
    pub fn split(&self, x: i32, y: i32, z: i32) -> (Pos, Pos) {
        (
            (x >> self.x_size_bits, y >> self.y_size_bits, z >> self.z_size_bits),
            (
                x & ((1 << self.x_size_bits) - 1),
                y & ((1 << self.y_size_bits) - 1),
                z & ((1 << self.z_size_bits) - 1),
            ),
        )
    }

    /// Inverse of `split`.
    #[inline]
    pub fn join(&self, section: Pos, local: Pos) -> Pos {
        (
            (section.0 << self.x_size_bits) | local.0,
            (section.1 << self.y_size_bits) | local.1,
            (section.2 << self.z_size_bits) | local.2,
        )
    }

    #[inline]
    fn index_of(&self, s: Pos) -> usize {
        let i = (((s.2 << self.y_section_bits) | s.1) << self.x_section_bits) | s.0;
        i as usize
    }

    pub fn section_index(&self, x: i32, y: i32, z: i32) -> Result<usize, LayoutError> {
        if !self.contains(x, y, z) {
            let (sx, sy, sz) = self.chunk_size();
            return Err(LayoutError::OutOfRange { x, y, z, sx, sy, sz });
        }
        let (s, _) = self.split(x, y, z);
        Ok(self.index_of(s))
    }

    /// Chunk-local coordinate of the first voxel of section `index`.
    pub fn section_origin(&self, index: usize) -> Pos {
        let i = index as i32;
        let sx = i & ((1 << self.x_section_bits) - 1);
        let sy = (i >> self.x_section_bits) & ((1 << self.y_section_bits) - 1);
        let sz = i >> (self.x_section_bits + self.y_section_bits);
        self.join((sx, sy, sz), (0, 0, 0))
    }

    /// Voxel offset of a chunk-local coordinate inside its section.
    #[inline]
    pub fn local_offset(&self, x: i32, y: i32, z: i32) -> usize {
        let (_, (lx, ly, lz)) = self.split(x, y, z);
        let o = (((lz << self.y_size_bits) | ly) << self.x_size_bits) | lx;
        o as usize
    }

    #[track_caller]
    fn expect_index(&self, x: i32, y: i32, z: i32) -> usize {
        match self.section_index(x, y, z) {
            Ok(i) => i,
            Err(e) => panic!("{e}"),
        }
    }

    /// Section covering `(x, y, z)`. Panics when the position is outside the chunk.
    #[track_caller]
    pub fn section<'a, S>(&self, data: &'a [S], x: i32, y: i32, z: i32) -> &'a S {
        &data[self.expect_index(x, y, z)]
    }

    #[track_caller]
    pub fn section_mut<'a, S>(&self, data: &'a mut [S], x: i32, y: i32, z: i32) -> &'a mut S {
        &mut data[self.expect_index(x, y, z)]
    }

    // Section-coordinate bounds of an inclusive box clamped to the chunk, or None when disjoint.
    fn section_span(&self, min: Pos, max: Pos) -> Option<(Pos, Pos)> {
        let (sx, sy, sz) = self.chunk_size();
        let lo = (min.0.max(0), min.1.max(0), min.2.max(0));
        let hi = (max.0.min(sx - 1), max.1.min(sy - 1), max.2.min(sz - 1));
        if lo.0 > hi.0 || lo.1 > hi.1 || lo.2 > hi.2 {
            return None;
        }
        let (a, _) = self.split(lo.0, lo.1, lo.2);
        let (b, _) = self.split(hi.0, hi.1, hi.2);
        Some((a, b))
    }

    /// Visit every section intersecting the inclusive box `min..=max`.
    pub fn for_in_box<S, F>(&self, data: &[S], min: Pos, max: Pos, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(usize, &S) -> ControlFlow<()>,
    {
        let Some((a, b)) = self.section_span(min, max) else {
            return ControlFlow::Continue(());
        };
        for sz in a.2..=b.2 {
            for sy in a.1..=b.1 {
                for sx in a.0..=b.0 {
                    let i = self.index_of((sx, sy, sz));
                    visit(i, &data[i])?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    pub fn for_in_box_mut<S, F>(&self, data: &mut [S], min: Pos, max: Pos, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(usize, &mut S) -> ControlFlow<()>,
    {
        let Some((a, b)) = self.section_span(min, max) else {
            return ControlFlow::Continue(());
        };
        for sz in a.2..=b.2 {
            for sy in a.1..=b.1 {
                for sx in a.0..=b.0 {
                    let i = self.index_of((sx, sy, sz));
                    visit(i, &mut data[i])?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Allocate one section per grid cell; the factory receives the per-section bit widths.
    pub fn create_data<S>(&self, mut factory: impl FnMut(u8, u8, u8) -> S) -> Vec<S> {
        (0..self.section_count())
            .map(|_| factory(self.x_size_bits, self.y_size_bits, self.z_size_bits))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_orders_x_fastest() {
        let l = ChunkLayout::new((1, 1, 2), (2, 2, 2));
        assert_eq!(l.section_index(0, 0, 0), Ok(0));
        assert_eq!(l.section_index(4, 0, 0), Ok(1));
        assert_eq!(l.section_index(0, 4, 0), Ok(2));
        assert_eq!(l.section_index(0, 0, 4), Ok(4));
        assert_eq!(l.section_index(7, 7, 15), Ok(15));
        assert_eq!(l.section_origin(15), (4, 4, 12));
    }

    #[test]
    fn out_of_range_is_reported() {
        let l = ChunkLayout::new((0, 0, 1), (2, 2, 2));
        assert!(matches!(l.section_index(0, 0, 8), Err(LayoutError::OutOfRange { z: 8, .. })));
        assert!(l.section_index(-1, 0, 0).is_err());
    }

    #[test]
    #[should_panic(expected = "outside the chunk")]
    fn section_panics_out_of_range() {
        let l = ChunkLayout::new((0, 0, 0), (1, 1, 1));
        let data = l.create_data(|_, _, _| 0u8);
        l.section(&data, 2, 0, 0);
    }

    #[test]
    fn box_visits_intersecting_sections_only() {
        let l = ChunkLayout::new((2, 2, 2), (2, 2, 2));
        let data = l.create_data(|_, _, _| ());
        let mut seen = Vec::new();
        let _ = l.for_in_box(&data, (3, 0, 0), (4, 3, 3), |i, _| {
            seen.push(i);
            ControlFlow::Continue(())
        });
        assert_eq!(seen, vec![0, 1]);

        // Clamped to the chunk, and disjoint boxes visit nothing
        let mut n = 0;
        let _ = l.for_in_box(&data, (-10, -10, -10), (100, 100, 100), |_, _| {
            n += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(n, 64);
        let mut n = 0;
        let _ = l.for_in_box(&data, (20, 0, 0), (30, 1, 1), |_, _| {
            n += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(n, 0);
    }

    #[test]
    fn box_visit_can_stop_early() {
        let l = ChunkLayout::new((1, 1, 1), (1, 1, 1));
        let mut data = l.create_data(|_, _, _| 0u32);
        let mut n = 0;
        let flow = l.for_in_box_mut(&mut data, (0, 0, 0), (3, 3, 3), |_, s| {
            *s += 1;
            n += 1;
            if n == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(data.iter().sum::<u32>(), 3);
    }

    #[test]
    fn create_data_passes_size_bits() {
        let l = ChunkLayout::new((1, 0, 1), (3, 2, 1));
        let data = l.create_data(|x, y, z| (x, y, z));
        assert_eq!(data.len(), 4);
        assert!(data.iter().all(|b| *b == (3, 2, 1)));
    }
}
