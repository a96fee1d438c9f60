use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashSet;

use crate::descriptor::Descriptor;
use crate::error::DescriptorError;

/// A raw dump and the descriptor written next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceArtifact {
    /// File name without the extension, shared by the dump and descriptor
    pub stem: String,
    pub dump_path: PathBuf,
    pub descriptor_path: PathBuf,
}

impl SurfaceArtifact {
    pub fn output_path(&self) -> PathBuf {
        self.dump_path.with_extension("png")
    }

    pub fn no_alpha_path(&self) -> PathBuf {
        self.dump_path
            .with_file_name(format!("{}-noalpha.png", self.stem))
    }

    pub fn load_descriptor(&self) -> Result<Descriptor, DescriptorError> {
        Descriptor::load(&self.descriptor_path)
    }

    pub fn read_dump(&self) -> Result<Vec<u8>, DescriptorError> {
        std::fs::read(&self.dump_path).map_err(|e| DescriptorError::io(&self.dump_path, e))
    }
}

/// Finds every `<stem>.bin` in `dir` that has a `<stem>.txt` beside it,
/// sorted by file name.
pub fn discover_artifacts(dir: impl AsRef<Path>) -> Result<Vec<SurfaceArtifact>, DescriptorError> {
    let dir = dir.as_ref();

    let mut dumps = vec![];
    let mut descriptors = FxHashSet::default();
    for entry in std::fs::read_dir(dir).map_err(|e| DescriptorError::io(dir, e))? {
        let entry = entry.map_err(|e| DescriptorError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => dumps.push(stem.to_string()),
            Some("txt") => {
                descriptors.insert(stem.to_string());
            }
            _ => {}
        }
    }

    let artifacts = dumps
        .into_iter()
        .filter(|stem| {
            let paired = descriptors.contains(stem);
            if !paired {
                debug!("{stem}.bin has no descriptor, ignoring");
            }
            paired
        })
        .sorted()
        .map(|stem| SurfaceArtifact {
            dump_path: dir.join(format!("{stem}.bin")),
            descriptor_path: dir.join(format!("{stem}.txt")),
            stem,
        })
        .collect_vec();

    Ok(artifacts)
}
