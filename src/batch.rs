use std::path::Path;

use anyhow::Context;
use log::info;
use pngify_scanner::discover_artifacts;
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

use crate::convert::{ArtifactConverter, ConversionOutcome, ConvertOptions};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub encoded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(mut self, outcome: &ConversionOutcome) -> Self {
        match outcome {
            ConversionOutcome::Encoded(_) => self.encoded += 1,
            ConversionOutcome::Skipped(_) => self.skipped += 1,
            ConversionOutcome::Failed(_) => self.failed += 1,
        }
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            encoded: self.encoded + other.encoded,
            skipped: self.skipped + other.skipped,
            failed: self.failed + other.failed,
        }
    }

    pub fn total(&self) -> usize {
        self.encoded + self.skipped + self.failed
    }
}

pub struct Processor {
    converter: ArtifactConverter,
}

impl Processor {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            converter: ArtifactConverter::new(options),
        }
    }

    /// Converts every artifact in `artifact_path`. Individual failures are
    /// counted in the report; only an unreadable directory is an error.
    pub fn process(&self, artifact_path: &Path) -> anyhow::Result<BatchReport> {
        anyhow::ensure!(
            artifact_path.is_dir(),
            "Artifact path must be a directory containing the output of an ntrc tracer frame ({})",
            artifact_path.display()
        );

        let artifacts = discover_artifacts(artifact_path)
            .with_context(|| format!("Failed to list artifacts in {}", artifact_path.display()))?;
        info!(
            "Converting {} artifact(s) in {}",
            artifacts.len(),
            artifact_path.display()
        );

        let report = artifacts
            .par_iter()
            .map(|artifact| self.converter.convert(artifact))
            .fold(BatchReport::default, |report, outcome| report.record(&outcome))
            .reduce(BatchReport::default, BatchReport::merge);

        info!(
            "Done: {} encoded, {} skipped, {} failed",
            report.encoded, report.skipped, report.failed
        );

        Ok(report)
    }
}
