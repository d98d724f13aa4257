//! Builds a matchup matrix from a match corpus.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use tracing::{info, warn};

use hero_edge_core::{ConfigLoader, HeroIndex, MatchupMatrix, MatrixBuilder, SkipCounters};
use hero_edge_data::{load_hero_list, save_matrix, CorpusReader};

use super::{register_aliases, DEFAULT_CONFIG};

/// Arguments for the build-matrix command.
#[derive(Args, Debug, Clone)]
pub struct BuildMatrixArgs {
    /// Hero list: a JSON array of names, or an existing matrix file
    #[arg(long)]
    pub heroes: PathBuf,

    /// Match corpus CSV
    #[arg(long)]
    pub matches: PathBuf,

    /// Output matrix JSON
    #[arg(long)]
    pub output: PathBuf,

    /// Config file (for hero aliases)
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Matrix plus the row accounting of the corpus it was built from.
#[derive(Debug)]
pub struct MatrixBuild {
    pub matrix: MatchupMatrix,
    pub skips: SkipCounters,
    pub rows_read: u64,
    /// Matches folded into the matrix.
    pub ingested: u64,
}

impl MatrixBuild {
    /// Every corpus row is either ingested or tallied as a skip.
    #[must_use]
    pub fn is_accounted(&self) -> bool {
        self.ingested + self.skips.total_skipped() + self.skips.filtered == self.rows_read
    }
}

/// Streams the corpus through a [`MatrixBuilder`].
///
/// # Errors
/// Returns error if the hero list or corpus cannot be read.
pub fn build_matrix(index: &HeroIndex, matches: &Path) -> Result<MatrixBuild> {
    let mut reader = CorpusReader::open(matches)?;
    let mut parse_skips = SkipCounters::new();
    let mut builder = MatrixBuilder::new(index);
    reader.for_each_record(&mut parse_skips, |record| {
        // unresolved heroes are tallied by the builder
        let _ = builder.ingest(&record);
    })?;
    let ingested = builder.ingested();
    let (matrix, mut skips) = builder.finish();
    skips.merge(&parse_skips);
    Ok(MatrixBuild {
        matrix,
        skips,
        rows_read: reader.rows_read(),
        ingested,
    })
}

pub fn run_build_matrix(args: &BuildMatrixArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config)?;
    let heroes = load_hero_list(&args.heroes)?;
    if heroes.is_empty() {
        bail!("Hero list is empty: {}", args.heroes.display());
    }
    let mut index = HeroIndex::build(&heroes);
    register_aliases(&mut index, &config.hero_aliases);

    let build = build_matrix(&index, &args.matches)?;
    if !build.is_accounted() {
        warn!(
            rows_read = build.rows_read,
            ingested = build.ingested,
            skipped = build.skips.total_skipped(),
            "Corpus row counts do not add up"
        );
    }
    let MatrixBuild {
        matrix,
        skips,
        rows_read,
        ingested,
    } = build;
    save_matrix(&matrix, &args.output)?;

    info!(
        rows_read,
        ingested,
        heroes = matrix.hero_count(),
        cells = matrix.populated_cells(),
        %skips,
        "Matrix written to {}",
        args.output.display()
    );
    if !skips.unresolved_names.is_empty() {
        warn!(
            names = ?skips.unresolved_names,
            "Unresolved hero names; add them to hero_aliases to include these matches"
        );
    }

    println!(
        "Built matrix: {} heroes, {} populated cells -> {}",
        matrix.hero_count(),
        matrix.populated_cells(),
        args.output.display()
    );
    println!("Skipped: {skips}");
    Ok(())
}
