//! Decoding of the packed `NV097_SET_TEXTURE_FORMAT` word.

/// Where the sampler fetches border texels from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderSource {
    #[default]
    Texture,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Dimensionality {
    #[default]
    None = 0,
    One = 1,
    Two = 2,
    Three = 3,
}

impl From<u32> for Dimensionality {
    fn from(value: u32) -> Self {
        match value & 0x3 {
            1 => Dimensionality::One,
            2 => Dimensionality::Two,
            3 => Dimensionality::Three,
            _ => Dimensionality::None,
        }
    }
}

// NV_PGRAPH_TEXFMT0_CUBEMAPENABLE           0x00000004
// NV_PGRAPH_TEXFMT0_BORDER_SOURCE           0x00000008
// NV_PGRAPH_TEXFMT0_DIMENSIONALITY          0x000000C0
// NV_PGRAPH_TEXFMT0_COLOR                   0x00007F00
// NV_PGRAPH_TEXFMT0_MIPMAP_LEVELS           0x000F0000
// NV_PGRAPH_TEXFMT0_BASE_SIZE_U             0x00F00000
// NV_PGRAPH_TEXFMT0_BASE_SIZE_V             0x0F000000
// NV_PGRAPH_TEXFMT0_BASE_SIZE_P             0xF0000000
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureFormat {
    pub cubemap: bool,
    pub border_source: BorderSource,
    pub dimensionality: Dimensionality,
    /// Raw color format code, see [`crate::TextureColorFormat`].
    pub color_format: u8,
    pub mipmap_levels: u8,
    /// log2 of the base level extents
    pub base_size_u: u8,
    pub base_size_v: u8,
    pub base_size_p: u8,
}

impl TextureFormat {
    /// Splits a format word into its fields. Every word decodes; codes that
    /// have no table entry are rejected later, when the layout is resolved.
    pub fn from_word(word: u32) -> Self {
        Self {
            cubemap: (word >> 2) & 0x1 != 0,
            border_source: if (word >> 3) & 0x1 != 0 {
                BorderSource::Color
            } else {
                BorderSource::Texture
            },
            dimensionality: Dimensionality::from(word >> 6),
            color_format: ((word >> 8) & 0x7F) as u8,
            mipmap_levels: ((word >> 16) & 0xF) as u8,
            base_size_u: ((word >> 20) & 0xF) as u8,
            base_size_v: ((word >> 24) & 0xF) as u8,
            base_size_p: ((word >> 28) & 0xF) as u8,
        }
    }
}

impl From<u32> for TextureFormat {
    fn from(word: u32) -> Self {
        Self::from_word(word)
    }
}
