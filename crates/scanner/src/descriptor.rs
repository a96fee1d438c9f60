use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::DescriptorError;

lazy_static! {
    // '640 x 480 [pitch = 2560 (0xA00)], at 0x01308000, format 0x7, type: 0x21000001, swizzled: N'
    static ref SURFACE_DESCRIPTION_RE: Regex =
        Regex::new(r".*format (0x[0-9a-fA-F]+), type: (0x[0-9a-fA-F]+), swizzled: ([NY])").unwrap();
}

/// Render target entry. Only the fields needed for conversion are read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SurfaceEntry {
    pub description: String,
    pub width: u32,
    pub height: u32,
    pub pitch: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextureEntry {
    /// Packed `NV097_SET_TEXTURE_FORMAT` word
    pub format: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub pitch: u32,
}

/// Fields extracted from [`SurfaceEntry::description`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescription {
    pub format: u32,
    pub surface_type: u32,
    pub swizzled: bool,
}

impl SurfaceEntry {
    pub fn parse_description(&self) -> Result<SurfaceDescription, DescriptorError> {
        let malformed = || DescriptorError::MalformedDescription(self.description.clone());

        let captures = SURFACE_DESCRIPTION_RE
            .captures(&self.description)
            .ok_or_else(malformed)?;

        let parse_hex = |index: usize| {
            let literal = &captures[index];
            u32::from_str_radix(&literal[2..], 16).map_err(|_| malformed())
        };

        Ok(SurfaceDescription {
            format: parse_hex(1)?,
            surface_type: parse_hex(2)?,
            swizzled: &captures[3] == "Y",
        })
    }
}

#[derive(Deserialize)]
struct DescriptorDocument {
    surface: Option<SurfaceEntry>,
    texture: Option<TextureEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Surface(SurfaceEntry),
    Texture(TextureEntry),
    /// Valid document without a surface or texture entry
    Unrecognized,
}

impl Descriptor {
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        let document: DescriptorDocument = serde_json::from_str(text)?;

        Ok(match (document.surface, document.texture) {
            (Some(surface), _) => Descriptor::Surface(surface),
            (None, Some(texture)) => Descriptor::Texture(texture),
            (None, None) => Descriptor::Unrecognized,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DescriptorError::io(path, e))?;
        Self::parse(&text)
    }
}
