//! Color format codes for render surfaces and sampled textures.
//!
//! The two namespaces overlap numerically but not semantically: surface
//! format `0x0C` is A8R8G8B8 while texture format `0x0C` is DXT1. They are
//! kept as separate enums so a code can never be looked up in the wrong table.

use crate::error::FormatError;

/// In-memory byte order of a 32-bit pixel.
///
/// nv2a names packed formats from the most significant channel down and
/// stores them little-endian, so `A8R8G8B8` is `B, G, R, A` in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgra,
    Rgba,
    Argb,
    Abgr,
}

impl ChannelOrder {
    #[inline(always)]
    pub fn to_rgba(self, p: [u8; 4]) -> [u8; 4] {
        match self {
            ChannelOrder::Bgra => [p[2], p[1], p[0], p[3]],
            ChannelOrder::Rgba => p,
            ChannelOrder::Argb => [p[1], p[2], p[3], p[0]],
            ChannelOrder::Abgr => [p[3], p[2], p[1], p[0]],
        }
    }

    /// Reorders tightly packed 32-bit pixels into RGBA in place. Trailing
    /// bytes that do not form a whole pixel are left untouched.
    pub fn reorder_to_rgba(self, data: &mut [u8]) {
        if self == ChannelOrder::Rgba {
            return;
        }

        for chunk in data.chunks_exact_mut(4) {
            let rgba = self.to_rgba([chunk[0], chunk[1], chunk[2], chunk[3]]);
            chunk.copy_from_slice(&rgba);
        }
    }
}

/// Layout metadata for a single color format code.
///
/// `uses_pitch` and `swizzled` are independent: the table records what the
/// hardware permits, not a single resolved layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorFormatInfo {
    pub bits_per_pixel: u32,
    /// `None` for formats we cannot turn into RGBA8 yet.
    pub channel_order: Option<ChannelOrder>,
    pub uses_pitch: bool,
    pub swizzled: bool,
    pub compressed: bool,
}

impl ColorFormatInfo {
    const fn swizzled(bits_per_pixel: u32) -> Self {
        Self {
            bits_per_pixel,
            channel_order: None,
            uses_pitch: false,
            swizzled: true,
            compressed: false,
        }
    }

    const fn linear(bits_per_pixel: u32) -> Self {
        Self {
            bits_per_pixel,
            channel_order: None,
            uses_pitch: true,
            swizzled: false,
            compressed: false,
        }
    }

    const fn with_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = Some(order);
        self
    }

    const fn block_compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }

    /// Whether pixels in this format can be converted to RGBA8 as-is.
    pub fn is_renderable(&self) -> bool {
        self.channel_order.is_some() && !self.compressed && self.bits_per_pixel == 32
    }
}

#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SurfaceFormat {
    Y8 = 0x01,
    X1R5G5B5_Z1R5G5B5 = 0x02,
    X1R5G5B5_O1R5G5B5 = 0x03,
    A1R5G5B5 = 0x04,
    R5G6B5 = 0x05,
    Y16 = 0x06,
    X8R8G8B8_Z8R8G8B8 = 0x07,
    X8R8G8B8_O1Z7R8G8B8 = 0x08,
    X1A7R8G8B8_Z1A7R8G8B8 = 0x09,
    X1A7R8G8B8_O1A7R8G8B8 = 0x0A,
    X8R8G8B8_O8R8G8B8 = 0x0B,
    A8R8G8B8 = 0x0C,
}

impl SurfaceFormat {
    /// Surfaces are always addressed through their pitch; whether a given
    /// surface is tiled comes from its description, not from the format.
    pub fn info(&self) -> ColorFormatInfo {
        use ChannelOrder::*;
        use SurfaceFormat::*;

        match self {
            Y8 => ColorFormatInfo::linear(8),
            X1R5G5B5_Z1R5G5B5 | X1R5G5B5_O1R5G5B5 | A1R5G5B5 | R5G6B5 | Y16 => {
                ColorFormatInfo::linear(16)
            }
            X8R8G8B8_Z8R8G8B8
            | X8R8G8B8_O1Z7R8G8B8
            | X1A7R8G8B8_Z1A7R8G8B8
            | X1A7R8G8B8_O1A7R8G8B8
            | X8R8G8B8_O8R8G8B8
            | A8R8G8B8 => ColorFormatInfo::linear(32).with_order(Bgra),
        }
    }
}

impl TryFrom<u32> for SurfaceFormat {
    type Error = FormatError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        use SurfaceFormat::*;

        Ok(match value {
            0x01 => Y8,
            0x02 => X1R5G5B5_Z1R5G5B5,
            0x03 => X1R5G5B5_O1R5G5B5,
            0x04 => A1R5G5B5,
            0x05 => R5G6B5,
            0x06 => Y16,
            0x07 => X8R8G8B8_Z8R8G8B8,
            0x08 => X8R8G8B8_O1Z7R8G8B8,
            0x09 => X1A7R8G8B8_Z1A7R8G8B8,
            0x0A => X1A7R8G8B8_O1A7R8G8B8,
            0x0B => X8R8G8B8_O8R8G8B8,
            0x0C => A8R8G8B8,
            e => return Err(FormatError::UnknownSurfaceFormat(e)),
        })
    }
}

// NV097_SET_TEXTURE_FORMAT_COLOR_*
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TextureColorFormat {
    SZ_Y8 = 0x00,
    SZ_AY8 = 0x01,
    SZ_A1R5G5B5 = 0x02,
    SZ_X1R5G5B5 = 0x03,
    SZ_A4R4G4B4 = 0x04,
    SZ_R5G6B5 = 0x05,
    SZ_A8R8G8B8 = 0x06,
    SZ_X8R8G8B8 = 0x07,
    SZ_I8_A8R8G8B8 = 0x0B,
    L_DXT1_A1R5G5B5 = 0x0C,
    L_DXT23_A8R8G8B8 = 0x0E,
    L_DXT45_A8R8G8B8 = 0x0F,
    LU_IMAGE_A1R5G5B5 = 0x10,
    LU_IMAGE_R5G6B5 = 0x11,
    LU_IMAGE_A8R8G8B8 = 0x12,
    LU_IMAGE_Y8 = 0x13,
    LU_IMAGE_R8B8 = 0x16,
    LU_IMAGE_G8B8 = 0x17,
    SZ_A8 = 0x19,
    SZ_A8Y8 = 0x1A,
    LU_IMAGE_AY8 = 0x1B,
    LU_IMAGE_X1R5G5B5 = 0x1C,
    LU_IMAGE_A4R4G4B4 = 0x1D,
    LU_IMAGE_X8R8G8B8 = 0x1E,
    LU_IMAGE_A8 = 0x1F,
    LU_IMAGE_A8Y8 = 0x20,
    LC_IMAGE_CR8YB8CB8YA8 = 0x24,
    LC_IMAGE_YB8CR8YA8CB8 = 0x25,
    SZ_R6G5B5 = 0x27,
    SZ_G8B8 = 0x28,
    SZ_R8B8 = 0x29,
    SZ_DEPTH_Y16_FIXED = 0x2C,
    LU_IMAGE_DEPTH_X8_Y24_FIXED = 0x2E,
    LU_IMAGE_DEPTH_Y16_FIXED = 0x30,
    LU_IMAGE_DEPTH_Y16_FLOAT = 0x31,
    LU_IMAGE_Y16 = 0x35,
    SZ_A8B8G8R8 = 0x3A,
    SZ_B8G8R8A8 = 0x3B,
    SZ_R8G8B8A8 = 0x3C,
    LU_IMAGE_A8B8G8R8 = 0x3F,
    LU_IMAGE_B8G8R8A8 = 0x40,
    LU_IMAGE_R8G8B8A8 = 0x41,
}

impl TextureColorFormat {
    pub fn info(&self) -> ColorFormatInfo {
        use ChannelOrder::*;
        use TextureColorFormat::*;

        match self {
            SZ_Y8 | SZ_AY8 | SZ_A8 => ColorFormatInfo::swizzled(8),
            // Palette indices; the palette itself is not part of the dump
            SZ_I8_A8R8G8B8 => ColorFormatInfo::swizzled(8),
            SZ_A1R5G5B5 | SZ_X1R5G5B5 | SZ_A4R4G4B4 | SZ_R5G6B5 | SZ_A8Y8 | SZ_R6G5B5
            | SZ_G8B8 | SZ_R8B8 | SZ_DEPTH_Y16_FIXED => ColorFormatInfo::swizzled(16),
            SZ_A8R8G8B8 | SZ_X8R8G8B8 => ColorFormatInfo::swizzled(32).with_order(Bgra),
            SZ_A8B8G8R8 => ColorFormatInfo::swizzled(32).with_order(Rgba),
            SZ_B8G8R8A8 => ColorFormatInfo::swizzled(32).with_order(Argb),
            SZ_R8G8B8A8 => ColorFormatInfo::swizzled(32).with_order(Abgr),

            L_DXT1_A1R5G5B5 => ColorFormatInfo::linear(4).block_compressed(),
            L_DXT23_A8R8G8B8 | L_DXT45_A8R8G8B8 => ColorFormatInfo::linear(8).block_compressed(),

            LU_IMAGE_Y8 | LU_IMAGE_AY8 | LU_IMAGE_A8 => ColorFormatInfo::linear(8),
            LU_IMAGE_A1R5G5B5 | LU_IMAGE_R5G6B5 | LU_IMAGE_R8B8 | LU_IMAGE_G8B8
            | LU_IMAGE_X1R5G5B5 | LU_IMAGE_A4R4G4B4 | LU_IMAGE_A8Y8 | LU_IMAGE_DEPTH_Y16_FIXED
            | LU_IMAGE_DEPTH_Y16_FLOAT | LU_IMAGE_Y16 => ColorFormatInfo::linear(16),
            // 4:2:2 YUV, two pixels per 32-bit word
            LC_IMAGE_CR8YB8CB8YA8 | LC_IMAGE_YB8CR8YA8CB8 => ColorFormatInfo::linear(16),
            LU_IMAGE_A8R8G8B8 | LU_IMAGE_X8R8G8B8 | LU_IMAGE_DEPTH_X8_Y24_FIXED => {
                ColorFormatInfo::linear(32).with_order(Bgra)
            }
            LU_IMAGE_A8B8G8R8 => ColorFormatInfo::linear(32).with_order(Rgba),
            LU_IMAGE_B8G8R8A8 => ColorFormatInfo::linear(32).with_order(Argb),
            LU_IMAGE_R8G8B8A8 => ColorFormatInfo::linear(32).with_order(Abgr),
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.info().compressed
    }
}

impl TryFrom<u8> for TextureColorFormat {
    type Error = FormatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use TextureColorFormat::*;

        Ok(match value {
            0x00 => SZ_Y8,
            0x01 => SZ_AY8,
            0x02 => SZ_A1R5G5B5,
            0x03 => SZ_X1R5G5B5,
            0x04 => SZ_A4R4G4B4,
            0x05 => SZ_R5G6B5,
            0x06 => SZ_A8R8G8B8,
            0x07 => SZ_X8R8G8B8,
            0x0B => SZ_I8_A8R8G8B8,
            0x0C => L_DXT1_A1R5G5B5,
            0x0E => L_DXT23_A8R8G8B8,
            0x0F => L_DXT45_A8R8G8B8,
            0x10 => LU_IMAGE_A1R5G5B5,
            0x11 => LU_IMAGE_R5G6B5,
            0x12 => LU_IMAGE_A8R8G8B8,
            0x13 => LU_IMAGE_Y8,
            0x16 => LU_IMAGE_R8B8,
            0x17 => LU_IMAGE_G8B8,
            0x19 => SZ_A8,
            0x1A => SZ_A8Y8,
            0x1B => LU_IMAGE_AY8,
            0x1C => LU_IMAGE_X1R5G5B5,
            0x1D => LU_IMAGE_A4R4G4B4,
            0x1E => LU_IMAGE_X8R8G8B8,
            0x1F => LU_IMAGE_A8,
            0x20 => LU_IMAGE_A8Y8,
            0x24 => LC_IMAGE_CR8YB8CB8YA8,
            0x25 => LC_IMAGE_YB8CR8YA8CB8,
            0x27 => SZ_R6G5B5,
            0x28 => SZ_G8B8,
            0x29 => SZ_R8B8,
            0x2C => SZ_DEPTH_Y16_FIXED,
            0x2E => LU_IMAGE_DEPTH_X8_Y24_FIXED,
            0x30 => LU_IMAGE_DEPTH_Y16_FIXED,
            0x31 => LU_IMAGE_DEPTH_Y16_FLOAT,
            0x35 => LU_IMAGE_Y16,
            0x3A => SZ_A8B8G8R8,
            0x3B => SZ_B8G8R8A8,
            0x3C => SZ_R8G8B8A8,
            0x3F => LU_IMAGE_A8B8G8R8,
            0x40 => LU_IMAGE_B8G8R8A8,
            0x41 => LU_IMAGE_R8G8B8A8,
            e => return Err(FormatError::UnknownTextureFormat(e)),
        })
    }
}

/// Resolves a surface format code to layout info, or `None` when the code is
/// unknown or cannot be rendered to RGBA8.
pub fn lookup_surface(code: u32) -> Option<ColorFormatInfo> {
    SurfaceFormat::try_from(code)
        .ok()
        .map(|f| f.info())
        .filter(ColorFormatInfo::is_renderable)
}

/// Texture counterpart of [`lookup_surface`]. Block compressed and sub-32-bit
/// formats resolve to `None`.
pub fn lookup_texture(code: u8) -> Option<ColorFormatInfo> {
    TextureColorFormat::try_from(code)
        .ok()
        .map(|f| f.info())
        .filter(ColorFormatInfo::is_renderable)
}
