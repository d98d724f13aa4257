//! Parallel execution of a strategy sweep.
//!
//! The matrix and the evaluated corpus are read-only and shared by
//! reference; each run owns its state. Runs execute on a rayon pool and
//! results are re-ordered by ordinal, so output never depends on the
//! worker count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use hero_edge_core::{
    AdvantageScorer, HeroIndex, MatchEvaluation, MatchRecord, MatchupMatrix, SimulationConfig,
    SkipCounters,
};

use crate::aggregator::{BatchReport, ResultAggregator};
use crate::simulator::{prepare_matches, BankrollSimulator, SimulationParams, SimulationResult};
use crate::strategy::{generate_strategies, strategies_from_labels, StrategyRun};

/// Runs many [`StrategyRun`]s over one corpus.
pub struct SweepRunner {
    params: SimulationParams,
    workers: Option<usize>,
}

impl SweepRunner {
    #[must_use]
    pub fn new(params: SimulationParams) -> Self {
        Self {
            params,
            workers: None,
        }
    }

    /// Limits the sweep to `workers` threads; `None` uses rayon's default.
    #[must_use]
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers.filter(|w| *w > 0);
        self
    }

    /// Executes every run not pre-empted by `cancel`.
    ///
    /// The flag is checked before each run starts; runs already in
    /// progress finish normally. Returns the finished results in ordinal
    /// order and whether any run was skipped.
    #[must_use]
    pub fn execute(
        &self,
        runs: &[StrategyRun],
        matches: &[MatchEvaluation],
        cancel: &AtomicBool,
    ) -> (Vec<SimulationResult>, bool) {
        let sweep = || {
            runs.par_iter()
                .map(|run| {
                    if cancel.load(Ordering::Relaxed) {
                        return None;
                    }
                    Some(BankrollSimulator::new(*run, &self.params).run(matches))
                })
                .collect::<Vec<_>>()
        };
        let outcomes = with_pool(self.workers, sweep);

        let skipped = outcomes.iter().filter(|o| o.is_none()).count();
        let results: Vec<SimulationResult> = outcomes.into_iter().flatten().collect();
        (results, skipped > 0)
    }
}

fn with_pool<T: Send>(workers: Option<usize>, action: impl FnOnce() -> T + Send) -> T {
    let Some(threads) = workers else {
        return action();
    };
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(err) => {
            warn!(error = %err, threads, "Failed to build sweep pool; using global pool");
            action()
        }
    }
}

/// Full pipeline from records to report: evaluate every match once, build
/// the strategy list, sweep it, and aggregate.
///
/// `skips` carries counts from earlier stages (parsing, filtering) and is
/// extended with evaluation skips.
#[must_use]
pub fn run_batch(
    config: &SimulationConfig,
    matrix: &MatchupMatrix,
    index: &HeroIndex,
    records: &[MatchRecord],
    mut skips: SkipCounters,
    cancel: &AtomicBool,
) -> BatchReport {
    let started = Instant::now();
    let scorer = AdvantageScorer::new(matrix, index);
    let matches = prepare_matches(records, &scorer, &mut skips);

    let (runs, strategy_errors) = match &config.strategies {
        Some(labels) => strategies_from_labels(labels, &config.thresholds),
        None => (generate_strategies(&config.thresholds), Vec::new()),
    };
    info!(
        runs = runs.len(),
        matches = matches.len(),
        thresholds = config.thresholds.len(),
        "Starting strategy sweep"
    );

    let runner = SweepRunner::new(SimulationParams::from(config)).with_workers(config.workers);
    let (results, cancelled) = runner.execute(&runs, &matches, cancel);

    let mut aggregator = ResultAggregator::with_capacity(results.len());
    for result in results {
        aggregator.push(result);
    }
    let mut report = aggregator.finish(skips, strategy_errors, runs.len(), cancelled);
    report.simulated_matches = matches.len();

    if cancelled {
        warn!(
            completed = report.completed_runs(),
            planned = report.planned_runs,
            "Sweep cancelled"
        );
    }
    info!(
        completed = report.completed_runs(),
        busted = report.busted_runs,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Strategy sweep finished"
    );
    report
}
