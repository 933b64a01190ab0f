//! Bit-packed voxel sections with a uniform-value fast path.
#![forbid(unsafe_code)]

mod section;
mod tag;
mod width;

pub use section::{ByteSection, NibbleSection, Section, ShortSection, Storage};
pub use tag::{SectionTag, TagScalar};
pub use width::{Byte, CellWidth, Nibble2, Short};
