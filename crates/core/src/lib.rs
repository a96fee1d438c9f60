pub mod color;
pub mod error;
pub mod format;
pub mod swizzle;

pub use color::{
    ChannelOrder, ColorFormatInfo, SurfaceFormat, TextureColorFormat, lookup_surface,
    lookup_texture,
};
pub use error::{FormatError, SwizzleError};
pub use format::{BorderSource, Dimensionality, TextureFormat};
pub use swizzle::{Deswizzler, Nv2aDeswizzler, SwizzleMasks, unswizzle_box, unswizzle_rect};
