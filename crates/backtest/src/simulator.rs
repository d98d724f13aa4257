//! Chronological bankroll simulation of one strategy at one threshold.
//!
//! # Lifecycle
//!
//! A [`BankrollSimulator`] starts [`SimulationPhase::Running`] and ends in
//! either [`SimulationPhase::Busted`] (bankroll reached zero) or
//! [`SimulationPhase::Completed`] (matches exhausted). Both terminal phases
//! produce the same [`SimulationResult`].
//!
//! # Numeric rules
//!
//! Stakes and payouts are floored to whole units before they touch the
//! bankroll, so every bankroll value is an integer.
//!
//! # Example
//!
//! ```ignore
//! let params = SimulationParams::new(dec!(1000)).with_bet_cap(Some(dec!(10000)));
//! let matches = prepare_matches(&records, &scorer, &mut skips);
//! let result = BankrollSimulator::new(run, &params).run(&matches);
//! ```

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use hero_edge_core::{
    AdvantageScorer, EvaluationError, HeroError, MatchEvaluation, MatchRecord, SimulationConfig,
    SkipCounters,
};

use crate::staking::{clip_stake, StakeSizer};
use crate::strategy::StrategyRun;

/// Parameters shared by every run of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub starting_bankroll: Decimal,
    /// Per-bet cap; `None` means uncapped.
    pub bet_cap: Option<Decimal>,
    /// Keep one [`LedgerEntry`] per placed bet.
    pub record_ledger: bool,
}

impl SimulationParams {
    /// Uncapped, no ledger.
    #[must_use]
    pub fn new(starting_bankroll: Decimal) -> Self {
        Self {
            starting_bankroll,
            bet_cap: None,
            record_ledger: false,
        }
    }

    #[must_use]
    pub fn with_bet_cap(mut self, cap: Option<Decimal>) -> Self {
        self.bet_cap = cap.filter(|c| *c > Decimal::ZERO);
        self
    }

    #[must_use]
    pub fn with_ledger(mut self, record: bool) -> Self {
        self.record_ledger = record;
        self
    }
}

impl From<&SimulationConfig> for SimulationParams {
    fn from(config: &SimulationConfig) -> Self {
        Self::new(config.starting_bankroll)
            .with_bet_cap(config.bet_cap())
            .with_ledger(config.write_ledger)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationPhase {
    Running,
    /// Bankroll hit zero; terminal.
    Busted,
    /// Every match was considered; terminal.
    Completed,
}

impl SimulationPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, SimulationPhase::Running)
    }
}

/// Mutable state of one run. Never shared between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub bankroll: Decimal,
    pub peak: Decimal,
    pub max_drawdown: Decimal,
    pub bets: u64,
    pub wins: u64,
    /// Fibonacci step counter; stays 0 for other policies.
    pub step: u32,
    pub max_stake: Decimal,
    /// Highest step a Fibonacci bet was placed at.
    pub max_step: u32,
    pub phase: SimulationPhase,
}

impl SimulationState {
    #[must_use]
    pub fn new(starting_bankroll: Decimal) -> Self {
        Self {
            bankroll: starting_bankroll,
            peak: starting_bankroll,
            max_drawdown: Decimal::ZERO,
            bets: 0,
            wins: 0,
            step: 0,
            max_stake: Decimal::ZERO,
            max_step: 0,
            phase: SimulationPhase::Running,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetOutcome {
    Win,
    Loss,
}

/// One placed bet, for auditing a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub strategy_group: &'static str,
    pub hero_filter: &'static str,
    pub odds_condition: &'static str,
    #[serde(serialize_with = "crate::aggregator::serialize_threshold")]
    pub delta_threshold: f64,
    pub match_id: u64,
    pub date: NaiveDateTime,
    pub championship: Option<String>,
    pub team1: String,
    pub team2: String,
    pub delta: f64,
    pub favored_team: String,
    pub favored_odds: Decimal,
    pub opponent_odds: Decimal,
    pub stake: Decimal,
    pub outcome: BetOutcome,
    pub payout: Decimal,
    pub bank_before: Decimal,
    pub bank_after: Decimal,
}

/// Terminal output of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub run: StrategyRun,
    pub state: SimulationState,
    pub ledger: Vec<LedgerEntry>,
}

/// Evaluates every record once for the whole sweep and orders them for replay.
///
/// Records that cannot be evaluated are counted in `skips` and dropped.
#[must_use]
pub fn prepare_matches(
    records: &[MatchRecord],
    scorer: &AdvantageScorer<'_>,
    skips: &mut SkipCounters,
) -> Vec<MatchEvaluation> {
    let mut matches = Vec::with_capacity(records.len());
    for record in records {
        match scorer.evaluate(record) {
            Ok(eval) => matches.push(eval),
            Err(err) => {
                debug!(match_id = record.match_id, error = %err, "Match excluded from simulation");
                match err {
                    EvaluationError::Hero(HeroError::UnresolvedHero { name }) => {
                        skips.record_unresolved(&name);
                    }
                    other => skips.record(other.reason()),
                }
            }
        }
    }
    matches.sort_by_key(MatchEvaluation::sort_key);
    matches
}

/// Replays matches for one [`StrategyRun`].
pub struct BankrollSimulator {
    run: StrategyRun,
    bet_cap: Option<Decimal>,
    sizer: StakeSizer,
    state: SimulationState,
    ledger: Option<Vec<LedgerEntry>>,
}

impl BankrollSimulator {
    #[must_use]
    pub fn new(run: StrategyRun, params: &SimulationParams) -> Self {
        Self {
            run,
            bet_cap: params.bet_cap,
            sizer: StakeSizer::new(run.config.policy, params.starting_bankroll),
            state: SimulationState::new(params.starting_bankroll),
            ledger: params.record_ledger.then(Vec::new),
        }
    }

    #[must_use]
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Whether this run would bet on `eval`, ignoring stake size.
    #[must_use]
    pub fn is_eligible(&self, eval: &MatchEvaluation) -> bool {
        let config = &self.run.config;
        eval.delta_favored.is_some()
            && eval.abs_delta() >= self.run.threshold
            && config.hero_filter.passes(eval)
            && config.odds_condition.passes(eval)
    }

    /// Applies one match. Returns the bet outcome, or `None` when no bet
    /// was placed (ineligible match, zero stake, or run already terminal).
    pub fn process(&mut self, eval: &MatchEvaluation) -> Option<BetOutcome> {
        if self.state.phase.is_terminal() || !self.is_eligible(eval) {
            return None;
        }
        let favored = eval.delta_favored?;
        let (favored_odds, opponent_odds) = (eval.favored_odds()?, eval.opponent_odds()?);

        let raw = self.sizer.raw_stake(self.state.bankroll, self.state.step);
        let stake = clip_stake(raw, self.state.bankroll, self.bet_cap);
        if stake <= Decimal::ZERO {
            return None;
        }

        let is_fib = self.run.config.policy.is_fibonacci();
        let step_before = self.state.step;
        let bank_before = self.state.bankroll;
        let state = &mut self.state;

        state.bankroll -= stake;
        state.bets += 1;
        let (outcome, payout) = if eval.favored_won() {
            // Saturates instead of overflowing on absurd odds or bankrolls.
            let payout = stake
                .checked_mul(favored_odds)
                .map_or(Decimal::MAX, |p| p.floor());
            state.wins += 1;
            state.bankroll = state.bankroll.checked_add(payout).unwrap_or(Decimal::MAX);
            if is_fib {
                state.step = state.step.saturating_sub(2);
            }
            (BetOutcome::Win, payout)
        } else {
            if is_fib {
                state.step = state.step.saturating_add(1);
            }
            (BetOutcome::Loss, Decimal::ZERO)
        };

        state.peak = state.peak.max(state.bankroll);
        state.max_drawdown = state.max_drawdown.max(state.peak - state.bankroll);
        state.max_stake = state.max_stake.max(stake);
        if is_fib {
            state.max_step = state.max_step.max(step_before);
        }

        if state.bankroll <= Decimal::ZERO {
            state.bankroll = Decimal::ZERO;
            state.phase = SimulationPhase::Busted;
            debug!(
                strategy = %self.run.config,
                threshold = self.run.threshold,
                bets = state.bets,
                "Run busted"
            );
        }

        if let Some(ledger) = self.ledger.as_mut() {
            ledger.push(LedgerEntry {
                strategy_group: self.run.config.policy.label(),
                hero_filter: self.run.config.hero_filter.label(),
                odds_condition: self.run.config.odds_condition.label(),
                delta_threshold: self.run.threshold,
                match_id: eval.match_id,
                date: eval.timestamp,
                championship: eval.championship.clone(),
                team1: eval.team1.clone(),
                team2: eval.team2.clone(),
                delta: eval.delta,
                favored_team: eval.team(favored).to_string(),
                favored_odds,
                opponent_odds,
                stake,
                outcome,
                payout,
                bank_before,
                bank_after: self.state.bankroll,
            });
        }
        Some(outcome)
    }

    /// Marks the run finished and hands back its result.
    #[must_use]
    pub fn finish(mut self) -> SimulationResult {
        if self.state.phase == SimulationPhase::Running {
            self.state.phase = SimulationPhase::Completed;
        }
        SimulationResult {
            run: self.run,
            state: self.state,
            ledger: self.ledger.unwrap_or_default(),
        }
    }

    /// Replays `matches` (already in chronological order) to a terminal phase.
    #[must_use]
    pub fn run(mut self, matches: &[MatchEvaluation]) -> SimulationResult {
        for eval in matches {
            if self.state.phase.is_terminal() {
                break;
            }
            self.process(eval);
        }
        self.finish()
    }
}
