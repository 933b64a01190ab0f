use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use super::config::{BlockDef, BlocksConfig};
use super::types::{Block, BlockData, BlockId};

pub const MAX_LIGHT: u8 = 15;

/// Lighting-facing properties of one block id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    pub solid: bool,
    pub transparent: bool,
    pub light_trough: i32,
    pub light_emit: u8,
    pub emit_by_data: Vec<u8>,
}

impl BlockType {
    pub fn air() -> Self {
        Self {
            id: 0,
            name: "air".into(),
            solid: false,
            transparent: true,
            light_trough: 0,
            light_emit: 0,
            emit_by_data: Vec::new(),
        }
    }

    fn from_def(id: BlockId, def: BlockDef) -> Self {
        let solid = def.solid.unwrap_or(true);
        let transparent = def.transparent.unwrap_or(!solid);
        // Opaque solids swallow all light unless told otherwise.
        let default_trough = if solid && !transparent { -i32::from(MAX_LIGHT) } else { 0 };
        Self {
            id,
            name: def.name,
            solid,
            transparent,
            light_trough: def.light_trough.unwrap_or(default_trough),
            light_emit: def.light_emit.unwrap_or(0).min(MAX_LIGHT),
            emit_by_data: def
                .emit_by_data
                .unwrap_or_default()
                .into_iter()
                .map(|v| v.min(MAX_LIGHT))
                .collect(),
        }
    }

    #[inline]
    pub fn light_trough(&self, _data: BlockData) -> i32 {
        self.light_trough
    }

    #[inline]
    pub fn light_emit(&self, data: BlockData) -> u8 {
        self.emit_by_data
            .get(data as usize)
            .copied()
            .unwrap_or(self.light_emit)
    }

    #[inline]
    pub fn is_solid(&self, _data: BlockData) -> bool {
        self.solid
    }

    #[inline]
    pub fn is_transparent(&self, _data: BlockData) -> bool {
        self.transparent
    }

    /// Solid and not transparent: attenuates sun light falling down a column.
    #[inline]
    pub fn occludes_sky(&self, data: BlockData) -> bool {
        self.is_solid(data) && !self.is_transparent(data)
    }
}

#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    pub unknown_block_id: Option<BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Registry holding only air at id 0.
    pub fn new() -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("air".to_string(), 0);
        Self {
            blocks: vec![BlockType::air()],
            by_name,
            unknown_block_id: None,
        }
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    /// Type for a stored block; ids without a definition fall back to the unknown block, then air.
    #[inline]
    pub fn resolve(&self, block: Block) -> &BlockType {
        self.get(block.id)
            .or_else(|| self.unknown_block_id.and_then(|id| self.get(id)))
            .unwrap_or(&self.blocks[0])
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn block_by_name(&self, name: &str) -> Option<Block> {
        self.id_by_name(name).map(Block::from)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::new();
        // Ids not named by any definition stay air-like placeholders.
        let mut defined = vec![false; 1];
        for def in cfg.blocks.into_iter() {
            let id = match def.id {
                Some(id) => id,
                None => reg.blocks.len() as u16,
            };
            if reg.blocks.len() <= id as usize {
                let placeholder = BlockType {
                    id,
                    name: String::new(),
                    ..BlockType::air()
                };
                reg.blocks.resize(id as usize + 1, placeholder);
                defined.resize(id as usize + 1, false);
            }
            if defined[id as usize] {
                return Err(format!("duplicate block id {} ({})", id, def.name).into());
            }
            if id == 0 && def.solid.unwrap_or(true) {
                log::warn!("block id 0 ({}) is solid; id 0 is treated as empty space", def.name);
            }
            defined[id as usize] = true;
            let ty = BlockType::from_def(id, def);
            reg.by_name.insert(ty.name.clone(), id);
            reg.blocks[id as usize] = ty;
        }
        if let Some(name) = cfg.unknown_block {
            reg.unknown_block_id = reg.id_by_name(&name);
            if reg.unknown_block_id.is_none() {
                log::warn!("unknown_block '{}' is not defined; falling back to air", name);
            }
        }
        Ok(reg)
    }
}
