use serde::Deserialize;

// Top-level blocks config file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BlocksConfig {
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    // Optional name of a block to use as the fallback when a stored id has no
    // definition. If absent or not found, fallbacks resolve to id 0 (air).
    #[serde(default)]
    pub unknown_block: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u16>,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub transparent: Option<bool>,
    // Attenuation applied to light passing through the block; 0 is lossless, -15 blocks everything.
    #[serde(default)]
    pub light_trough: Option<i32>,
    #[serde(default)]
    pub light_emit: Option<u8>,
    // Per-data emission override, indexed by block data (e.g. a lamp that is off at 0, lit at 1).
    #[serde(default)]
    pub emit_by_data: Option<Vec<u8>>,
}
