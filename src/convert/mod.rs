mod encode;

use std::fmt::Display;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use pngify_core::{
    ChannelOrder, ColorFormatInfo, Deswizzler, Dimensionality, Nv2aDeswizzler, SurfaceFormat,
    SwizzleError, TextureColorFormat, TextureFormat, lookup_surface, lookup_texture,
};
use pngify_scanner::{Descriptor, DescriptorError, SurfaceArtifact, SurfaceEntry, TextureEntry};

pub use encode::write_png;

/// No linear or tiled image can be larger than the 128 MiB of a devkit.
pub const MAX_IMAGE_BYTES: u64 = 128 << 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Convert artifacts even when their PNG already exists
    pub overwrite_existing: bool,
    /// Also write `<stem>-noalpha.png`
    pub output_no_alpha: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("bad descriptor: {0}")]
    DescriptorParse(#[source] DescriptorError),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("pitch {pitch} is smaller than a {row_bytes} byte row")]
    InvalidPitch { pitch: usize, row_bytes: usize },

    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("{height} rows of {row_stride} bytes exceed {MAX_IMAGE_BYTES} bytes")]
    ImageTooLarge { height: u32, row_stride: u64 },

    #[error("truncated dump: {0}")]
    TruncatedBuffer(#[source] SwizzleError),

    #[error("internal consistency fault: {0}")]
    InternalConsistency(#[source] SwizzleError),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ConvertError {
    /// Faults point at a bug or a broken environment rather than an odd capture.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            ConvertError::InternalConsistency(_)
                | ConvertError::Io { .. }
                | ConvertError::Encode { .. }
        )
    }
}

impl From<DescriptorError> for ConvertError {
    fn from(e: DescriptorError) -> Self {
        match e {
            DescriptorError::Io { path, source } => ConvertError::Io { path, source },
            e => ConvertError::DescriptorParse(e),
        }
    }
}

impl From<SwizzleError> for ConvertError {
    fn from(e: SwizzleError) -> Self {
        match e {
            SwizzleError::SourceTruncated { .. } | SwizzleError::DestinationTooSmall { .. } => {
                ConvertError::TruncatedBuffer(e)
            }
            SwizzleError::InconsistentMasks { .. } => ConvertError::InternalConsistency(e),
            SwizzleError::DimensionsTooLarge { .. } => {
                ConvertError::UnsupportedFormat(e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OutputExists,
    /// Descriptor has neither a surface nor a texture entry
    NoImageEntry,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::OutputExists => write!(f, "output already exists"),
            SkipReason::NoImageEntry => write!(f, "descriptor has no surface or texture entry"),
        }
    }
}

#[derive(Debug)]
pub enum ConversionOutcome {
    Encoded(PathBuf),
    Skipped(SkipReason),
    Failed(ConvertError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Linear { pitch: usize },
    Swizzled,
}

/// Everything needed to turn a dump into RGBA8 rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedImage {
    pub width: u32,
    pub height: u32,
    pub info: ColorFormatInfo,
    pub channel_order: ChannelOrder,
    pub layout: Layout,
}

impl ResolvedImage {
    /// Rejects geometry that cannot describe a real capture before any
    /// buffer is sized from it.
    fn new(
        width: u32,
        height: u32,
        info: ColorFormatInfo,
        layout: Layout,
    ) -> Result<Self, ConvertError> {
        let channel_order = info
            .channel_order
            .ok_or_else(|| ConvertError::UnsupportedFormat(format!("{info:?}")))?;

        if width == 0 || height == 0 {
            return Err(ConvertError::EmptyImage { width, height });
        }

        // u32 * u32 always fits in u64
        let row_bytes = width as u64 * info.bytes_per_pixel() as u64;
        let row_stride = match layout {
            Layout::Linear { pitch } => {
                if (pitch as u64) < row_bytes {
                    return Err(ConvertError::InvalidPitch {
                        pitch,
                        row_bytes: row_bytes as usize,
                    });
                }
                pitch as u64
            }
            Layout::Swizzled => row_bytes,
        };
        if row_stride.saturating_mul(height as u64) > MAX_IMAGE_BYTES {
            return Err(ConvertError::ImageTooLarge { height, row_stride });
        }

        Ok(Self {
            width,
            height,
            info,
            channel_order,
            layout,
        })
    }

    pub fn from_surface(surface: &SurfaceEntry) -> Result<Self, ConvertError> {
        let description = surface.parse_description()?;
        let info = lookup_surface(description.format).ok_or_else(|| {
            let name = SurfaceFormat::try_from(description.format)
                .map(|f| format!("{f:?}"))
                .unwrap_or_else(|_| "unknown".to_string());
            ConvertError::UnsupportedFormat(format!(
                "surface format 0x{:X} ({name})",
                description.format
            ))
        })?;

        let layout = if description.swizzled {
            Layout::Swizzled
        } else {
            Layout::Linear {
                pitch: surface.pitch as usize,
            }
        };

        Self::new(surface.width, surface.height, info, layout)
    }

    pub fn from_texture(texture: &TextureEntry) -> Result<Self, ConvertError> {
        let format = TextureFormat::from_word(texture.format);

        if format.cubemap {
            return Err(ConvertError::UnsupportedFormat("cubemap".to_string()));
        }
        if texture.depth != 1 || format.dimensionality == Dimensionality::Three {
            return Err(ConvertError::UnsupportedFormat(format!(
                "3D texture (depth {})",
                texture.depth
            )));
        }

        let info = lookup_texture(format.color_format).ok_or_else(|| {
            let name = TextureColorFormat::try_from(format.color_format)
                .map(|f| format!("{f:?}"))
                .unwrap_or_else(|_| "unknown".to_string());
            ConvertError::UnsupportedFormat(format!(
                "texture color format 0x{:02X} ({name})",
                format.color_format
            ))
        })?;

        if format.mipmap_levels > 1 {
            debug!(
                "Texture has {} mipmap levels, converting the base level only",
                format.mipmap_levels
            );
        }

        let layout = if info.swizzled {
            Layout::Swizzled
        } else {
            Layout::Linear {
                pitch: texture.pitch as usize,
            }
        };

        Self::new(texture.width, texture.height, info, layout)
    }

    /// Turns a raw dump into tightly packed RGBA8 rows.
    ///
    /// Short linear dumps are zero padded. Short tiled dumps are an error.
    pub fn linearize(&self, mut data: Vec<u8>) -> Result<Vec<u8>, ConvertError> {
        let width = self.width as usize;
        let height = self.height as usize;
        let row_bytes = width * self.info.bytes_per_pixel();

        let mut pixels = match self.layout {
            Layout::Linear { pitch } => {
                // Bounded by MAX_IMAGE_BYTES in `new`
                let expected = height * pitch;
                if data.len() < expected {
                    debug!(
                        "Dump is {} bytes short, padding with zeroes",
                        expected - data.len()
                    );
                    data.resize(expected, 0);
                }

                compact_rows(&data[..expected], pitch, row_bytes)
            }
            Layout::Swizzled => {
                Nv2aDeswizzler.deswizzle(&data, self.width, self.height, 1, self.info)?
            }
        };

        self.channel_order.reorder_to_rgba(&mut pixels);
        Ok(pixels)
    }
}

/// Drops the padding at the end of every row.
fn compact_rows(data: &[u8], pitch: usize, row_bytes: usize) -> Vec<u8> {
    if pitch == row_bytes {
        return data.to_vec();
    }

    data.chunks_exact(pitch)
        .flat_map(|row| &row[..row_bytes])
        .copied()
        .collect()
}

pub struct ArtifactConverter {
    options: ConvertOptions,
}

impl ArtifactConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Converts a single artifact. Never fails outright; every problem is
    /// reported through the returned outcome and logged.
    pub fn convert(&self, artifact: &SurfaceArtifact) -> ConversionOutcome {
        profiling::scope!("convert_artifact");

        let output_path = artifact.output_path();
        let outcome = if output_path.is_file() && !self.options.overwrite_existing {
            ConversionOutcome::Skipped(SkipReason::OutputExists)
        } else {
            match self.try_convert(artifact, &output_path) {
                Ok(true) => ConversionOutcome::Encoded(output_path),
                Ok(false) => ConversionOutcome::Skipped(SkipReason::NoImageEntry),
                Err(e) => ConversionOutcome::Failed(e),
            }
        };

        log_outcome(artifact, &outcome);
        outcome
    }

    fn try_convert(
        &self,
        artifact: &SurfaceArtifact,
        output_path: &Path,
    ) -> Result<bool, ConvertError> {
        let image = match artifact.load_descriptor()? {
            Descriptor::Surface(surface) => ResolvedImage::from_surface(&surface)?,
            Descriptor::Texture(texture) => ResolvedImage::from_texture(&texture)?,
            Descriptor::Unrecognized => return Ok(false),
        };

        let pixels = image.linearize(artifact.read_dump()?)?;

        let no_alpha_path = artifact.no_alpha_path();
        write_png(
            output_path,
            image.width,
            image.height,
            pixels,
            self.options.output_no_alpha.then_some(no_alpha_path.as_path()),
        )?;

        Ok(true)
    }
}

fn log_outcome(artifact: &SurfaceArtifact, outcome: &ConversionOutcome) {
    let stem = &artifact.stem;
    match outcome {
        ConversionOutcome::Encoded(path) => info!("{stem}: wrote {}", path.display()),
        ConversionOutcome::Skipped(reason @ SkipReason::OutputExists) => {
            debug!("{stem}: skipped, {reason}")
        }
        ConversionOutcome::Skipped(reason) => warn!("{stem}: skipped, {reason}"),
        ConversionOutcome::Failed(e) if e.is_fault() => error!("{stem}: {e}"),
        ConversionOutcome::Failed(e) => warn!("{stem}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(description: &str, width: u32, height: u32, pitch: u32) -> SurfaceEntry {
        SurfaceEntry {
            description: description.to_string(),
            width,
            height,
            pitch,
        }
    }

    fn texture(format: u32, width: u32, height: u32, depth: u32, pitch: u32) -> TextureEntry {
        TextureEntry {
            format,
            width,
            height,
            depth,
            pitch,
        }
    }

    #[test]
    fn linear_surface() {
        let image = ResolvedImage::from_surface(&surface(
            "4 x 4 [pitch = 16 (0x10)], at 0x0, format 0xC, type: 0x1, swizzled: N",
            4,
            4,
            16,
        ))
        .unwrap();
        assert_eq!(image.layout, Layout::Linear { pitch: 16 });
        assert_eq!(image.channel_order, ChannelOrder::Bgra);
    }

    #[test]
    fn swizzled_surface() {
        let image = ResolvedImage::from_surface(&surface(
            "format 0x7, type: 0x2, swizzled: Y",
            8,
            8,
            32,
        ))
        .unwrap();
        assert_eq!(image.layout, Layout::Swizzled);
    }

    #[test]
    fn sub_32_bit_surface() {
        assert!(matches!(
            ResolvedImage::from_surface(&surface("format 0x5, type: 0x1, swizzled: N", 4, 4, 8)),
            Err(ConvertError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ResolvedImage::from_surface(&surface("no format here", 4, 4, 8)),
            Err(ConvertError::DescriptorParse(DescriptorError::MalformedDescription(_)))
        ));
    }

    #[test]
    fn texture_layouts() {
        // SZ_A8R8G8B8
        let image = ResolvedImage::from_texture(&texture(0x0002_0629, 4, 4, 1, 16)).unwrap();
        assert_eq!(image.layout, Layout::Swizzled);
        assert_eq!(image.channel_order, ChannelOrder::Bgra);

        // LU_IMAGE_R8G8B8A8
        let image = ResolvedImage::from_texture(&texture(0x0001_4129, 4, 4, 1, 32)).unwrap();
        assert_eq!(image.layout, Layout::Linear { pitch: 32 });
        assert_eq!(image.channel_order, ChannelOrder::Abgr);
    }

    #[test]
    fn unsupported_textures() {
        for (word, depth) in [
            (0x0001_0C29, 1), // DXT1
            (0x0001_0529, 1), // SZ_R5G6B5
            (0x0001_7F29, 1), // no such format
            (0x0001_062D, 1), // cubemap
            (0x0001_06E9, 1), // 3D
            (0x0001_0629, 4), // depth > 1
        ] {
            assert!(
                matches!(
                    ResolvedImage::from_texture(&texture(word, 4, 4, depth, 16)),
                    Err(ConvertError::UnsupportedFormat(_))
                ),
                "0x{word:08X}"
            );
        }
    }

    #[test]
    fn truncated_linear_is_padded() {
        let image = ResolvedImage::from_surface(&surface(
            "format 0xC, type: 0x1, swizzled: N",
            4,
            4,
            16,
        ))
        .unwrap();

        let pixels = image.linearize(vec![0xFF; 32]).unwrap();
        assert_eq!(pixels.len(), 64);
        assert!(pixels[..32].iter().all(|&b| b == 0xFF));
        assert!(pixels[32..].iter().all(|&b| b == 0));
    }

    #[test]
    fn padded_rows_are_compacted() {
        let image = ResolvedImage::from_surface(&surface(
            "format 0xC, type: 0x1, swizzled: N",
            2,
            2,
            12,
        ))
        .unwrap();

        // BGRA pixels followed by 4 bytes of row padding
        let data = vec![
            1, 2, 3, 4, 5, 6, 7, 8, 0xEE, 0xEE, 0xEE, 0xEE, //
            9, 10, 11, 12, 13, 14, 15, 16, 0xEE, 0xEE, 0xEE, 0xEE,
        ];
        let pixels = image.linearize(data).unwrap();
        assert_eq!(
            pixels,
            [3, 2, 1, 4, 7, 6, 5, 8, 11, 10, 9, 12, 15, 14, 13, 16]
        );
    }

    #[test]
    fn pitch_smaller_than_row() {
        let result = ResolvedImage::from_surface(&surface(
            "format 0xC, type: 0x1, swizzled: N",
            4,
            4,
            8,
        ));
        assert!(matches!(
            result,
            Err(ConvertError::InvalidPitch {
                pitch: 8,
                row_bytes: 16
            })
        ));
        assert!(!result.unwrap_err().is_fault());
    }

    #[test]
    fn empty_images_are_rejected() {
        for (width, height) in [(0, 4), (4, 0), (0, 0)] {
            let result = ResolvedImage::from_surface(&surface(
                "format 0xC, type: 0x1, swizzled: N",
                width,
                height,
                16,
            ));
            let Err(e) = result else {
                panic!("{width}x{height} resolved");
            };
            assert!(matches!(e, ConvertError::EmptyImage { .. }));
            assert!(!e.is_fault());
        }

        assert!(matches!(
            ResolvedImage::from_texture(&texture(0x0002_0629, 0, 4, 1, 0)),
            Err(ConvertError::EmptyImage { .. })
        ));
    }

    #[test]
    fn oversized_geometry_is_rejected() {
        let huge = surface("format 0xC, type: 0x1, swizzled: N", 1, u32::MAX, u32::MAX);
        assert!(matches!(
            ResolvedImage::from_surface(&huge),
            Err(ConvertError::ImageTooLarge { .. })
        ));

        // 1e6 rows of 1e9 bytes does not overflow but could never be allocated
        let huge = surface(
            "format 0xC, type: 0x1, swizzled: N",
            4,
            1_000_000,
            1_000_000_000,
        );
        assert!(matches!(
            ResolvedImage::from_surface(&huge),
            Err(ConvertError::ImageTooLarge { .. })
        ));

        let huge = surface("format 0xC, type: 0x1, swizzled: Y", 65536, 65536, 0);
        assert!(matches!(
            ResolvedImage::from_surface(&huge),
            Err(ConvertError::ImageTooLarge { .. })
        ));

        // Exactly at the limit is still accepted
        let limit = surface("format 0xC, type: 0x1, swizzled: N", 4096, 8192, 16384);
        assert!(ResolvedImage::from_surface(&limit).is_ok());
    }

    #[test]
    fn truncated_tiled_fails() {
        let image = ResolvedImage::from_texture(&texture(0x0002_0629, 4, 4, 1, 16)).unwrap();
        assert!(matches!(
            image.linearize(vec![0; 32]),
            Err(ConvertError::TruncatedBuffer(SwizzleError::SourceTruncated { .. }))
        ));
    }

    #[test]
    fn swizzle_errors_map_to_taxonomy() {
        let e = ConvertError::from(SwizzleError::InconsistentMasks { x: 1, y: 1, z: 0 });
        assert!(matches!(e, ConvertError::InternalConsistency(_)));
        assert!(e.is_fault());

        let e = ConvertError::from(SwizzleError::DimensionsTooLarge {
            width: u32::MAX,
            height: u32::MAX,
            depth: u32::MAX,
        });
        assert!(matches!(e, ConvertError::UnsupportedFormat(_)));
        assert!(!e.is_fault());
    }
}
