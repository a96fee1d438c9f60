pub mod artifact;
pub mod descriptor;
pub mod error;
pub mod fixup;

pub use artifact::{SurfaceArtifact, discover_artifacts};
pub use descriptor::{Descriptor, SurfaceDescription, SurfaceEntry, TextureEntry};
pub use error::DescriptorError;
pub use fixup::{repair_descriptor, repair_directory};
