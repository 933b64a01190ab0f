use std::marker::PhantomData;

use crate::tag::SectionTag;
use crate::width::{Byte, CellWidth, Nibble2, Short};

/// Backing representation of a section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    /// Every cell holds this value; no buffer is allocated.
    Uniform(u16),
    /// Packed cells, layout defined by the section's `CellWidth`.
    Dense(Box<[u8]>),
}

/// A cuboid of `2^(x_bits + y_bits + z_bits)` voxels, each holding
/// `W::CELLS_PER_VOXEL` unsigned cells of `W::BITS` bits.
///
/// Sections start uniform. The first `set` that differs from the uniform value
/// materialises a dense buffer, and `compress` collapses a dense buffer whose
/// cells all agree back into the uniform representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section<W: CellWidth> {
    x_bits: u8,
    y_bits: u8,
    z_bits: u8,
    storage: Storage,
    changed: bool,
    _width: PhantomData<W>,
}

pub type NibbleSection = Section<Nibble2>;
pub type ByteSection = Section<Byte>;
pub type ShortSection = Section<Short>;

impl<W: CellWidth> Section<W> {
    pub fn new(x_bits: u8, y_bits: u8, z_bits: u8) -> Self {
        Self::with_default(x_bits, y_bits, z_bits, 0)
    }

    pub fn with_default(x_bits: u8, y_bits: u8, z_bits: u8, value: u16) -> Self {
        debug_assert!(
            u32::from(x_bits) + u32::from(y_bits) + u32::from(z_bits) < usize::BITS,
            "section bits overflow"
        );
        Self {
            x_bits,
            y_bits,
            z_bits,
            storage: Storage::Uniform(value & W::MAX),
            changed: false,
            _width: PhantomData,
        }
    }

    #[inline]
    pub fn bits(&self) -> (u8, u8, u8) {
        (self.x_bits, self.y_bits, self.z_bits)
    }

    /// Number of voxels.
    #[inline]
    pub fn volume(&self) -> usize {
        1usize << (self.x_bits + self.y_bits + self.z_bits)
    }

    /// Number of addressable cell offsets.
    #[inline]
    pub fn size(&self) -> usize {
        self.volume() * W::CELLS_PER_VOXEL
    }

    /// Length of the dense buffer in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        W::byte_len(self.volume())
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[inline]
    pub fn is_uniform(&self) -> bool {
        matches!(self.storage, Storage::Uniform(_))
    }

    /// Uniform value, or `None` while a dense buffer is present.
    #[inline]
    pub fn default_value(&self) -> Option<u16> {
        match self.storage {
            Storage::Uniform(v) => Some(v),
            Storage::Dense(_) => None,
        }
    }

    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.storage, Storage::Uniform(0))
    }

    /// Cell offset of `(x, y, z)` and sub-field `extra`.
    #[inline]
    pub fn offset(&self, x: usize, y: usize, z: usize, extra: usize) -> usize {
        debug_assert!(extra < W::CELLS_PER_VOXEL);
        let voxel = (((z << self.y_bits) | y) << self.x_bits) | x;
        voxel * W::CELLS_PER_VOXEL + extra
    }

    #[inline]
    pub fn get(&self, offset: usize) -> u16 {
        debug_assert!(offset < self.size(), "offset {offset} out of section");
        match &self.storage {
            Storage::Uniform(v) => *v,
            Storage::Dense(buf) => W::load(buf, offset),
        }
    }

    #[inline]
    pub fn get_at(&self, x: usize, y: usize, z: usize, extra: usize) -> u16 {
        self.get(self.offset(x, y, z, extra))
    }

    pub fn set(&mut self, offset: usize, value: u16) {
        debug_assert!(offset < self.size(), "offset {offset} out of section");
        let value = value & W::MAX;
        let volume = self.volume();
        match &mut self.storage {
            Storage::Uniform(v) if *v == value => return,
            Storage::Uniform(v) => {
                let mut buf = W::filled(volume, *v);
                W::store(&mut buf, offset, value);
                self.storage = Storage::Dense(buf);
            }
            Storage::Dense(buf) => W::store(buf, offset, value),
        }
        self.changed = true;
    }

    #[inline]
    pub fn set_at(&mut self, x: usize, y: usize, z: usize, extra: usize, value: u16) {
        let offset = self.offset(x, y, z, extra);
        self.set(offset, value);
    }

    /// Reset every cell to `value`, dropping any dense buffer.
    pub fn fill(&mut self, value: u16) {
        self.storage = Storage::Uniform(value & W::MAX);
        self.changed = false;
    }

    /// Collapse a dense buffer whose cells all agree.
    ///
    /// Returns `false` without touching anything when nothing was written since
    /// the last call. Otherwise returns whether the section is now uniform.
    pub fn compress(&mut self) -> bool {
        if !self.changed {
            return false;
        }
        self.changed = false;
        let collapsed = match &self.storage {
            Storage::Uniform(_) => return true,
            Storage::Dense(buf) => {
                let first = W::load(buf, 0);
                (1..self.size())
                    .all(|o| W::load(buf, o) == first)
                    .then_some(first)
            }
        };
        match collapsed {
            Some(v) => {
                self.storage = Storage::Uniform(v);
                true
            }
            None => false,
        }
    }

    pub fn write(&self) -> SectionTag {
        match &self.storage {
            Storage::Uniform(v) => SectionTag::uniform(W::scalar(*v)),
            Storage::Dense(buf) => SectionTag::dense(buf.to_vec()),
        }
    }

    /// Restore from a persisted record. Malformed records reset the section to
    /// the empty representation.
    pub fn read(&mut self, tag: &SectionTag) {
        let expect = self.byte_len();
        match (tag.array(), tag.default_value()) {
            (Some(bytes), _) if bytes.len() == expect => {
                self.storage = Storage::Dense(bytes.to_vec().into_boxed_slice());
                self.changed = true;
                return;
            }
            (Some(bytes), _) => {
                log::warn!(
                    "section array has {} bytes, expected {}; ignoring it",
                    bytes.len(),
                    expect
                );
            }
            (None, _) => {}
        }
        let value = match tag.default_value() {
            Some(v) if v > W::MAX => {
                log::warn!("section default {} exceeds {}-bit cells; ignoring it", v, W::BITS);
                0
            }
            Some(v) => v,
            None => 0,
        };
        self.storage = Storage::Uniform(value);
        self.changed = false;
    }

    pub fn from_tag(x_bits: u8, y_bits: u8, z_bits: u8, tag: &SectionTag) -> Self {
        let mut s = Self::new(x_bits, y_bits, z_bits);
        s.read(tag);
        s
    }
}
