use serde::{Deserialize, Serialize};

// Compact voxel representation used at runtime
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub data: BlockData,
}

pub type BlockId = u16;
pub type BlockData = u8;

impl Block {
    pub const AIR: Block = Block { id: 0, data: 0 };

    #[inline]
    pub const fn new(id: BlockId, data: BlockData) -> Self {
        Self { id, data }
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self.id == 0
    }
}

impl From<BlockId> for Block {
    fn from(id: BlockId) -> Self {
        Self { id, data: 0 }
    }
}
