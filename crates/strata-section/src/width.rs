// Cell codecs. Each width decides how many bytes back a section and how a
// cell offset maps onto those bytes; Section itself never touches bit fields.

use crate::tag::TagScalar;

pub trait CellWidth: Copy + Default + Send + Sync + 'static {
    /// Bits per cell.
    const BITS: u32;
    /// Addressable cells per voxel (sub-fields sharing one voxel).
    const CELLS_PER_VOXEL: usize;
    /// Largest storable value.
    const MAX: u16 = ((1u32 << Self::BITS) - 1) as u16;

    /// Backing buffer length in bytes for `voxels` voxels.
    fn byte_len(voxels: usize) -> usize;
    fn load(buf: &[u8], offset: usize) -> u16;
    fn store(buf: &mut [u8], offset: usize, value: u16);
    /// Buffer of `voxels` voxels where every cell holds `value`.
    fn filled(voxels: usize, value: u16) -> Box<[u8]>;
    /// Persisted form of a uniform value.
    fn scalar(value: u16) -> TagScalar;
}

/// Two 4-bit sub-fields per voxel, one byte per voxel. Sub-field 0 is the low nibble.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Nibble2;

/// One 8-bit cell per voxel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Byte;

/// One 16-bit cell per voxel, little-endian in the buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Short;

impl CellWidth for Nibble2 {
    const BITS: u32 = 4;
    const CELLS_PER_VOXEL: usize = 2;

    #[inline]
    fn byte_len(voxels: usize) -> usize {
        voxels
    }

    #[inline]
    fn load(buf: &[u8], offset: usize) -> u16 {
        let b = buf[offset >> 1];
        u16::from((b >> ((offset & 1) << 2)) & 0x0F)
    }

    #[inline]
    fn store(buf: &mut [u8], offset: usize, value: u16) {
        let shift = (offset & 1) << 2;
        let b = &mut buf[offset >> 1];
        *b = (*b & !(0x0F << shift)) | (((value as u8) & 0x0F) << shift);
    }

    fn filled(voxels: usize, value: u16) -> Box<[u8]> {
        let v = (value as u8) & 0x0F;
        vec![v | (v << 4); voxels].into_boxed_slice()
    }
    #[inline]
    fn scalar(value: u16) -> TagScalar {
        TagScalar::Byte(value as u8)
    }
}

impl CellWidth for Byte {
    const BITS: u32 = 8;
    const CELLS_PER_VOXEL: usize = 1;

    #[inline]
    fn byte_len(voxels: usize) -> usize {
        voxels
    }

    #[inline]
    fn load(buf: &[u8], offset: usize) -> u16 {
        u16::from(buf[offset])
    }

    #[inline]
    fn store(buf: &mut [u8], offset: usize, value: u16) {
        buf[offset] = value as u8;
    }

    fn filled(voxels: usize, value: u16) -> Box<[u8]> {
        vec![value as u8; voxels].into_boxed_slice()
    }
    #[inline]
    fn scalar(value: u16) -> TagScalar {
        TagScalar::Byte(value as u8)
    }
}

impl CellWidth for Short {
    const BITS: u32 = 16;
    const CELLS_PER_VOXEL: usize = 1;

    #[inline]
    fn byte_len(voxels: usize) -> usize {
        voxels * 2
    }

    #[inline]
    fn load(buf: &[u8], offset: usize) -> u16 {
        let i = offset * 2;
        u16::from_le_bytes([buf[i], buf[i + 1]])
    }

    #[inline]
    fn store(buf: &mut [u8], offset: usize, value: u16) {
        let i = offset * 2;
        buf[i..i + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn filled(voxels: usize, value: u16) -> Box<[u8]> {
        let [lo, hi] = value.to_le_bytes();
        let mut v = Vec::with_capacity(voxels * 2);
        for _ in 0..voxels {
            v.push(lo);
            v.push(hi);
        }
        v.into_boxed_slice()
    }
    #[inline]
    fn scalar(value: u16) -> TagScalar {
        TagScalar::Short(value)
    }
}
