use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use strata_blocks::BlockRegistry;
use strata_blocks::config::{BlockDef, BlocksConfig};
use strata_chunk::ChunkLayout;
use strata_lighting::LightingConfig;

/// Built-in configuration used when no file is given.
pub const DEFAULT_CONFIG: &str = include_str!("../strata.toml");

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub layout: ChunkLayout,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    #[serde(default)]
    pub unknown_block: Option<String>,
}

impl StrataConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: StrataConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        let l = &self.layout;
        let axis = |section: u8, size: u8| u32::from(section) + u32::from(size);
        let (bx, by, bz) = (
            axis(l.x_section_bits, l.x_size_bits),
            axis(l.y_section_bits, l.y_size_bits),
            axis(l.z_section_bits, l.z_size_bits),
        );
        // Chunk-local coordinates and section offsets must fit an i32 volume.
        if bx + by + bz > 30 {
            return Err(format!("chunk of 2^{bx} x 2^{by} x 2^{bz} voxels is too large").into());
        }
        if self.lighting.thread_name.is_empty() {
            return Err("lighting.thread_name must not be empty".into());
        }
        Ok(())
    }

    pub fn registry(&self) -> Result<BlockRegistry, Box<dyn Error>> {
        BlockRegistry::from_config(BlocksConfig {
            blocks: self.blocks.clone(),
            unknown_block: self.unknown_block.clone(),
        })
    }
}
