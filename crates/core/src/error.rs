#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("surface format is out of range (0x{0:X})")]
    UnknownSurfaceFormat(u32),

    #[error("texture color format is out of range (0x{0:X})")]
    UnknownTextureFormat(u8),
}

/// Errors raised while deinterleaving a tiled buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwizzleError {
    /// The tiled source ended before every pixel was copied.
    #[error("source buffer truncated: pixel at 0x{offset:X} needs {needed} bytes, buffer has {actual}")]
    SourceTruncated {
        offset: usize,
        needed: usize,
        actual: usize,
    },

    #[error("destination buffer too small: pixel at 0x{offset:X} needs {needed} bytes, buffer has {actual}")]
    DestinationTooSmall {
        offset: usize,
        needed: usize,
        actual: usize,
    },

    /// The generated masks overlap or leave holes. This is a bug, never bad input.
    #[error("swizzle masks are not disjoint or not contiguous (x=0x{x:X}, y=0x{y:X}, z=0x{z:X})")]
    InconsistentMasks { x: u64, y: u64, z: u64 },

    #[error("dimensions {width}x{height}x{depth} need more address bits than are available")]
    DimensionsTooLarge { width: u32, height: u32, depth: u32 },
}
