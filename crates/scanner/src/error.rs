use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("descriptor is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The surface description line does not carry format, type and swizzle fields.
    #[error("unrecognized surface description '{0}'")]
    MalformedDescription(String),

    #[error("descriptor is still invalid after repair: {0}")]
    Repair(#[source] serde_json::Error),
}

impl DescriptorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
