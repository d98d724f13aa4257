//! Per-strategy summaries and the batch report.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use hero_edge_core::SkipCounters;

use crate::simulator::{LedgerEntry, SimulationPhase, SimulationResult};
use crate::strategy::StrategyFailure;

/// Writes thresholds without a trailing `.0` (`5`, `12.5`).
///
/// # Errors
/// Propagates serializer errors.
pub fn serialize_threshold<S: Serializer>(threshold: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(threshold)
}

/// `round(wins / bets * 100)`, halves away from zero; 0 without bets.
#[must_use]
pub fn win_pct(wins: u64, bets: u64) -> u64 {
    if bets == 0 {
        return 0;
    }
    (200 * wins + bets) / (2 * bets)
}

/// One output row per strategy run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub strategy_group: &'static str,
    pub hero_filter: &'static str,
    pub odds_condition: &'static str,
    #[serde(serialize_with = "serialize_threshold")]
    pub delta_threshold: f64,
    pub bets: u64,
    pub wins: u64,
    pub win_pct: u64,
    pub final_bank: Decimal,
    pub max_drawdown: Decimal,
    pub max_stake: Decimal,
    pub max_step: u32,
}

impl StrategySummary {
    #[must_use]
    pub fn from_result(result: &SimulationResult) -> Self {
        let config = &result.run.config;
        let state = &result.state;
        Self {
            strategy_group: config.policy.label(),
            hero_filter: config.hero_filter.label(),
            odds_condition: config.odds_condition.label(),
            delta_threshold: result.run.threshold,
            bets: state.bets,
            wins: state.wins,
            win_pct: win_pct(state.wins, state.bets),
            final_bank: state.bankroll.max(Decimal::ZERO),
            max_drawdown: state.max_drawdown,
            max_stake: state.max_stake,
            max_step: if config.policy.is_fibonacci() {
                state.max_step
            } else {
                0
            },
        }
    }
}

/// Everything a sweep produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// In strategy generation order.
    pub summaries: Vec<StrategySummary>,
    /// Parallel to `summaries`; empty per run unless ledgers were requested.
    pub ledgers: Vec<Vec<LedgerEntry>>,
    pub skips: SkipCounters,
    pub strategy_errors: Vec<StrategyFailure>,
    /// Set when the sweep stopped before every run executed.
    pub cancelled: bool,
    pub planned_runs: usize,
    pub busted_runs: usize,
    /// Matches that reached the simulator.
    pub simulated_matches: usize,
}

impl BatchReport {
    #[must_use]
    pub fn completed_runs(&self) -> usize {
        self.summaries.len()
    }

    pub fn ledger_rows(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.ledgers.iter().flatten()
    }

    /// Top `n` rows by final bankroll, ties keeping generation order.
    #[must_use]
    pub fn best_by_final_bank(&self, n: usize) -> Vec<&StrategySummary> {
        let mut rows: Vec<&StrategySummary> = self.summaries.iter().collect();
        rows.sort_by(|a, b| b.final_bank.cmp(&a.final_bank));
        rows.truncate(n);
        rows
    }
}

/// Collects run results, which may arrive in any order, into a [`BatchReport`].
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<(usize, StrategySummary, Vec<LedgerEntry>)>,
    busted: usize,
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
            busted: 0,
        }
    }

    pub fn push(&mut self, result: SimulationResult) {
        if result.state.phase == SimulationPhase::Busted {
            self.busted += 1;
        }
        let summary = StrategySummary::from_result(&result);
        self.results.push((result.run.ordinal, summary, result.ledger));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Orders rows by run ordinal and attaches batch-level metadata.
    #[must_use]
    pub fn finish(
        mut self,
        skips: SkipCounters,
        strategy_errors: Vec<StrategyFailure>,
        planned_runs: usize,
        cancelled: bool,
    ) -> BatchReport {
        self.results.sort_by_key(|(ordinal, _, _)| *ordinal);
        let (summaries, ledgers) = self
            .results
            .into_iter()
            .map(|(_, summary, ledger)| (summary, ledger))
            .unzip();
        BatchReport {
            summaries,
            ledgers,
            skips,
            strategy_errors,
            cancelled,
            planned_runs,
            busted_runs: self.busted,
            simulated_matches: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulationState;
    use crate::strategy::{generate_strategies, StrategyRun};
    use rust_decimal_macros::dec;

    fn result(run: StrategyRun, bank: Decimal, bets: u64, wins: u64) -> SimulationResult {
        let mut state = SimulationState::new(dec!(1000));
        state.bankroll = bank;
        state.bets = bets;
        state.wins = wins;
        state.max_step = 7;
        state.phase = if bank.is_zero() {
            SimulationPhase::Busted
        } else {
            SimulationPhase::Completed
        };
        SimulationResult {
            run,
            state,
            ledger: Vec::new(),
        }
    }

    #[test]
    fn win_pct_rounds_half_away_from_zero() {
        assert_eq!(win_pct(2, 3), 67);
        assert_eq!(win_pct(1, 3), 33);
        assert_eq!(win_pct(1, 8), 13);
        assert_eq!(win_pct(1, 2), 50);
        assert_eq!(win_pct(0, 0), 0);
        assert_eq!(win_pct(5, 5), 100);
    }

    #[test]
    fn summary_zeroes_step_for_non_fibonacci() {
        let runs = generate_strategies(&[0.0]);
        let flat = StrategySummary::from_result(&result(runs[0], dec!(1200), 3, 2));
        assert_eq!(flat.strategy_group, "Flat100");
        assert_eq!(flat.max_step, 0);
        assert_eq!(flat.win_pct, 67);

        let fib = runs.iter().find(|r| r.config.policy.is_fibonacci()).unwrap();
        assert_eq!(StrategySummary::from_result(&result(*fib, dec!(900), 1, 0)).max_step, 7);
    }

    #[test]
    fn finish_restores_generation_order() {
        let runs = generate_strategies(&[5.0, 10.0]);
        let mut agg = ResultAggregator::with_capacity(3);
        agg.push(result(runs[2], dec!(0), 4, 0));
        agg.push(result(runs[0], dec!(1100), 2, 1));
        agg.push(result(runs[1], dec!(1300), 3, 2));

        let report = agg.finish(SkipCounters::new(), Vec::new(), runs.len(), true);
        let thresholds: Vec<f64> = report.summaries.iter().map(|s| s.delta_threshold).collect();
        assert_eq!(thresholds, vec![5.0, 10.0, 5.0]);
        assert_eq!(report.summaries[2].odds_condition, "favorite");
        assert_eq!(report.busted_runs, 1);
        assert!(report.cancelled);
        assert_eq!(report.completed_runs(), 3);
        assert_eq!(report.best_by_final_bank(1)[0].final_bank, dec!(1300));
    }
}
