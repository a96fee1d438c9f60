use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;
use pngify::{ConvertOptions, Processor};
use pngify_scanner::repair_directory;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing surface bin and txt files to process
    artifact_path: PathBuf,

    /// Overwrite existing PNG files
    #[arg(short, long)]
    force: bool,

    /// Produce a copy of any PNG files that include alpha with alpha stripped
    #[arg(short = 'N', long)]
    no_alpha: bool,

    /// Fix up descriptors written by older capture tools before converting
    #[arg(short = 'R', long)]
    repair: bool,

    /// Number of worker threads
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to set up worker threads")?;
    }

    let artifact_path = args
        .artifact_path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", args.artifact_path.display()))?;

    if args.repair {
        info!("Repairing descriptors");
        repair_directory(&artifact_path).context("Failed to repair descriptors")?;
    }

    Processor::new(ConvertOptions {
        overwrite_existing: args.force,
        output_no_alpha: args.no_alpha,
    })
    .process(&artifact_path)?;

    Ok(())
}
