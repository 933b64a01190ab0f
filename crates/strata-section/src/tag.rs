use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

/// Uniform value as persisted, typed by the section's cell width: one byte for
/// nibble and byte sections, two for short sections. Formats without integer
/// widths decode any value below 256 as `Byte`; compare through `get`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagScalar {
    Byte(u8),
    Short(u16),
}

impl TagScalar {
    #[inline]
    pub fn get(self) -> u16 {
        match self {
            TagScalar::Byte(v) => u16::from(v),
            TagScalar::Short(v) => v,
        }
    }
}

/// Persisted form of a section: a map holding either `Default` (uniform value)
/// or `Array` (the raw dense buffer).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTag {
    #[serde(rename = "Default", default, skip_serializing_if = "Option::is_none")]
    default: Option<TagScalar>,
    #[serde(rename = "Array", default, skip_serializing_if = "Option::is_none")]
    array: Option<ByteBuf>,
}

impl SectionTag {
    pub fn uniform(value: TagScalar) -> Self {
        Self {
            default: Some(value),
            array: None,
        }
    }

    pub fn dense(bytes: Vec<u8>) -> Self {
        Self {
            default: None,
            array: Some(ByteBuf::from(bytes)),
        }
    }

    #[inline]
    pub fn default_scalar(&self) -> Option<TagScalar> {
        self.default
    }

    /// Stored uniform value widened to `u16`.
    #[inline]
    pub fn default_value(&self) -> Option<u16> {
        self.default.map(TagScalar::get)
    }

    #[inline]
    pub fn array(&self) -> Option<&[u8]> {
        self.array.as_deref().map(Vec::as_slice)
    }

    #[inline]
    pub fn is_dense(&self) -> bool {
        self.array.is_some()
    }
}
