//! Fills gaps in one matrix from another over the same heroes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use hero_edge_data::{load_matrix, save_matrix};

/// Arguments for the merge-matrix command.
#[derive(Args, Debug, Clone)]
pub struct MergeMatrixArgs {
    /// Matrix whose present cells are kept
    #[arg(long)]
    pub primary: PathBuf,

    /// Matrix supplying absent cells and missing hero win rates
    #[arg(long)]
    pub fallback: PathBuf,

    /// Output matrix JSON
    #[arg(long)]
    pub output: PathBuf,
}

pub fn run_merge_matrix(args: &MergeMatrixArgs) -> Result<()> {
    let mut primary = load_matrix(&args.primary)?;
    let fallback = load_matrix(&args.fallback)?;

    let stats = primary.fill_missing_from(&fallback).with_context(|| {
        format!(
            "Cannot merge {} into {}",
            args.fallback.display(),
            args.primary.display()
        )
    })?;
    save_matrix(&primary, &args.output)?;

    info!(
        cells_filled = stats.cells_filled,
        heroes_filled = stats.heroes_filled,
        "Hybrid matrix written to {}",
        args.output.display()
    );
    println!(
        "Filled {} cells and {} hero win rates -> {}",
        stats.cells_filled,
        stats.heroes_filled,
        args.output.display()
    );
    Ok(())
}
