pub mod batch;
pub mod convert;

pub use batch::{BatchReport, Processor};
pub use convert::{ArtifactConverter, ConversionOutcome, ConvertError, ConvertOptions};
