//! CLI commands for the hero matchup backtester.

use std::collections::BTreeMap;

use tracing::warn;

use hero_edge_core::HeroIndex;

pub mod build_matrix;
pub mod championships;
pub mod merge_matrix;
pub mod simulate;

pub use build_matrix::{build_matrix, run_build_matrix, BuildMatrixArgs, MatrixBuild};
pub use championships::{run_championships, ChampionshipsArgs};
pub use merge_matrix::{run_merge_matrix, MergeMatrixArgs};
pub use simulate::{run_simulate, SimulateArgs};

/// Config file consulted when `--config` is not given; a missing file means defaults.
pub const DEFAULT_CONFIG: &str = hero_edge_core::config_loader::DEFAULT_CONFIG_PATH;

/// Registers configured alias spellings on the index.
pub(crate) fn register_aliases(index: &mut HeroIndex, aliases: &BTreeMap<String, String>) {
    let registered = aliases
        .iter()
        .filter(|(alias, canonical)| index.add_alias(alias, canonical))
        .count();
    if registered < aliases.len() {
        warn!(registered, configured = aliases.len(), "Some hero aliases were not registered");
    }
}
