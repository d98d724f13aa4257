//! Strategy sweep CLI command.
//!
//! Loads a matchup matrix and a match corpus, runs every strategy at every
//! threshold, and writes one summary row per run.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use tracing::{info, warn};

use hero_edge_backtest::{run_batch, BatchReport};
use hero_edge_core::{ConfigLoader, HeroIndex, SimulationConfig};
use hero_edge_data::{load_corpus, load_matrix, CsvStorage, MatchFilter};

use super::{register_aliases, DEFAULT_CONFIG};

/// Arguments for the simulate command.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Matchup matrix JSON
    #[arg(long)]
    pub matrix: PathBuf,

    /// Match corpus CSV
    #[arg(long)]
    pub matches: PathBuf,

    /// Summary CSV output
    #[arg(long)]
    pub output: PathBuf,

    /// Per-bet ledger CSV output
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Config file path
    #[arg(long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Starting bankroll (default: 1000)
    #[arg(long)]
    pub start_bank: Option<Decimal>,

    /// Per-bet cap, 0 for uncapped (default: 10000)
    #[arg(long)]
    pub max_bet: Option<Decimal>,

    /// Comma-separated delta thresholds
    #[arg(long, value_delimiter = ',')]
    pub thresholds: Option<Vec<f64>>,

    /// First match date included (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last match date included (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Only simulate this championship (repeatable)
    #[arg(long = "championship")]
    pub championships: Vec<String>,

    /// Exclude this championship (repeatable)
    #[arg(long = "exclude-championship")]
    pub exclude_championships: Vec<String>,

    /// Sweep worker threads (default: all cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Rows shown in the text report
    #[arg(long, default_value = "10")]
    pub top: usize,
}

impl SimulateArgs {
    /// Layers command-line overrides on top of the loaded config.
    ///
    /// # Errors
    /// Returns error if the combined config is invalid.
    pub fn resolve_config(&self, mut config: SimulationConfig) -> Result<SimulationConfig> {
        if let Some(bank) = self.start_bank {
            config.starting_bankroll = bank;
        }
        if let Some(cap) = self.max_bet {
            config.max_bet = cap;
        }
        if let Some(thresholds) = &self.thresholds {
            config.thresholds = thresholds.clone();
        }
        if self.from.is_some() {
            config.date_from = self.from;
        }
        if self.to.is_some() {
            config.date_to = self.to;
        }
        if !self.championships.is_empty() {
            config.championship_allow = self.championships.clone();
        }
        config
            .championship_deny
            .extend(self.exclude_championships.iter().cloned());
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        if self.ledger.is_some() {
            config.write_ledger = true;
        }
        config.validate()?;
        Ok(config)
    }

    fn ledger_path(&self) -> PathBuf {
        self.ledger.clone().unwrap_or_else(|| default_ledger_path(&self.output))
    }
}

/// `results.csv` -> `results_ledger.csv`, next to the summary.
fn default_ledger_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map_or_else(|| "results".to_string(), |s| s.to_string_lossy().into_owned());
    output.with_file_name(format!("{stem}_ledger.csv"))
}

/// Formats the sweep as a text report.
fn format_text_report(report: &BatchReport, config: &SimulationConfig, top: usize) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("===============================================================\n");
    output.push_str("                   STRATEGY SWEEP RESULTS                      \n");
    output.push_str("===============================================================\n");
    output.push_str(&format!("Starting Bankroll: ${}\n", config.starting_bankroll));
    match config.bet_cap() {
        Some(cap) => output.push_str(&format!("Max Bet:           ${cap}\n")),
        None => output.push_str("Max Bet:           uncapped\n"),
    }
    output.push_str(&format!(
        "Runs:              {} of {}{}\n",
        report.completed_runs(),
        report.planned_runs,
        if report.cancelled { " (cancelled)" } else { "" }
    ));
    output.push_str(&format!("Busted Runs:       {}\n", report.busted_runs));
    output.push_str(&format!("Matches Simulated: {}\n", report.simulated_matches));
    output.push('\n');

    output.push_str("DATA QUALITY\n");
    output.push_str("---------------------------------------------------------------\n");
    output.push_str(&format!("Malformed Records: {}\n", report.skips.malformed_record));
    output.push_str(&format!("Unresolved Heroes: {}\n", report.skips.unresolved_hero));
    output.push_str(&format!("Invalid Odds:      {}\n", report.skips.invalid_odds));
    output.push_str(&format!("Filtered Out:      {}\n", report.skips.filtered));
    if !report.skips.unresolved_names.is_empty() {
        let names: Vec<&str> = report.skips.unresolved_names.iter().map(String::as_str).collect();
        output.push_str(&format!("Unknown Names:     {}\n", names.join(", ")));
    }
    output.push('\n');

    if !report.strategy_errors.is_empty() {
        output.push_str("STRATEGY ERRORS\n");
        output.push_str("---------------------------------------------------------------\n");
        for failure in &report.strategy_errors {
            output.push_str(&format!("{}: {}\n", failure.label.group, failure.error));
        }
        output.push('\n');
    }

    output.push_str(&format!("TOP {top} BY FINAL BANKROLL\n"));
    output.push_str("---------------------------------------------------------------\n");
    output.push_str(&format!(
        "{:<10} {:<6} {:<9} {:>6} {:>5} {:>5} {:>10} {:>9}\n",
        "Strategy", "Heroes", "Odds", "Delta", "Bets", "Win%", "Final", "MaxDD"
    ));
    for row in report.best_by_final_bank(top) {
        output.push_str(&format!(
            "{:<10} {:<6} {:<9} {:>6} {:>5} {:>5} {:>10} {:>9}\n",
            row.strategy_group,
            row.hero_filter,
            row.odds_condition,
            row.delta_threshold,
            row.bets,
            row.win_pct,
            row.final_bank,
            row.max_drawdown
        ));
    }
    output.push_str("===============================================================\n");
    output
}

pub async fn run_simulate(args: SimulateArgs) -> Result<()> {
    let config = args.resolve_config(ConfigLoader::load_from(&args.config)?)?;

    let matrix = load_matrix(&args.matrix)?;
    let mut index = HeroIndex::build(matrix.heroes());
    register_aliases(&mut index, &config.hero_aliases);

    let (mut records, mut skips) = load_corpus(&args.matches)?;
    MatchFilter::from_config(&config).apply(&mut records, &mut skips);
    info!(
        records = records.len(),
        filtered = skips.filtered,
        "Corpus ready for simulation"
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, finishing runs in progress...");
            cancel_on_ctrl_c.store(true, Ordering::SeqCst);
        }
    });

    let sweep_config = config.clone();
    let report = tokio::task::spawn_blocking(move || {
        run_batch(&sweep_config, &matrix, &index, &records, skips, &cancel)
    })
    .await
    .context("Strategy sweep panicked")?;

    CsvStorage::write_rows(&args.output, &report.summaries)?;
    info!(rows = report.summaries.len(), "Summary written to {}", args.output.display());

    if config.write_ledger {
        let path = args.ledger_path();
        let rows: Vec<_> = report.ledger_rows().collect();
        CsvStorage::write_rows(&path, &rows)?;
        info!(rows = rows.len(), "Ledger written to {}", path.display());
    }
    if report.cancelled {
        warn!("Results are partial: the sweep was cancelled");
    }

    print!("{}", format_text_report(&report, &config, args.top));
    Ok(())
}
