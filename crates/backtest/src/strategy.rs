//! Strategy enumeration.
//!
//! A strategy is one staking policy combined with one hero filter and one
//! odds condition. Every strategy is swept across a list of delta
//! thresholds, and the resulting [`StrategyRun`]s carry an ordinal that
//! fixes their position in every output table.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hero_edge_core::{MatchEvaluation, StrategyLabel};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("unknown staking policy '{0}'")]
    UnknownStakingPolicy(String),
    #[error("unknown hero filter '{0}'")]
    UnknownFilterVariant(String),
    #[error("unknown odds condition '{0}'")]
    UnknownOddsCondition(String),
}

/// How much to stake on each bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StakingPolicy {
    /// Flat $100.
    Flat100,
    /// 5% of the current bankroll.
    Pct5,
    /// 5% of the starting bankroll, computed once.
    FixedPct5,
    /// Fibonacci progression, unit 1.
    Fib1,
    /// Fibonacci progression, unit 5.
    Fib5,
}

impl StakingPolicy {
    pub const ALL: [StakingPolicy; 5] = [
        StakingPolicy::Flat100,
        StakingPolicy::Pct5,
        StakingPolicy::FixedPct5,
        StakingPolicy::Fib1,
        StakingPolicy::Fib5,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            StakingPolicy::Flat100 => "Flat100",
            StakingPolicy::Pct5 => "Pct5",
            StakingPolicy::FixedPct5 => "FixedPct5",
            StakingPolicy::Fib1 => "Fib1",
            StakingPolicy::Fib5 => "Fib5",
        }
    }

    /// Unit multiplier for Fibonacci policies, `None` otherwise.
    #[must_use]
    pub fn fibonacci_unit(self) -> Option<Decimal> {
        match self {
            StakingPolicy::Fib1 => Some(Decimal::ONE),
            StakingPolicy::Fib5 => Some(Decimal::new(5, 0)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_fibonacci(self) -> bool {
        self.fibonacci_unit().is_some()
    }
}

impl fmt::Display for StakingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StakingPolicy {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StrategyError::UnknownStakingPolicy(s.to_string()))
    }
}

/// Hero-advantage eligibility filter (N+N-).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeroFilter {
    None,
    /// Favored side has >= 4 positive heroes, opponent >= 4 negative.
    FourPlusFourMinus,
    /// Same at 5.
    FivePlusFiveMinus,
}

impl HeroFilter {
    pub const ALL: [HeroFilter; 3] = [
        HeroFilter::None,
        HeroFilter::FourPlusFourMinus,
        HeroFilter::FivePlusFiveMinus,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            HeroFilter::None => "none",
            HeroFilter::FourPlusFourMinus => "4+4-",
            HeroFilter::FivePlusFiveMinus => "5+5-",
        }
    }

    #[must_use]
    pub fn min_count(self) -> Option<usize> {
        match self {
            HeroFilter::None => None,
            HeroFilter::FourPlusFourMinus => Some(4),
            HeroFilter::FivePlusFiveMinus => Some(5),
        }
    }

    /// Checks the favored side's positive heroes and the opponent's negative heroes.
    /// A match with no delta-favored side never passes a counting filter.
    #[must_use]
    pub fn passes(self, eval: &MatchEvaluation) -> bool {
        let Some(n) = self.min_count() else {
            return true;
        };
        let Some(favored) = eval.delta_favored else {
            return false;
        };
        eval.score(favored).positive_count >= n && eval.score(favored.other()).negative_count >= n
    }
}

impl fmt::Display for HeroFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HeroFilter {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StrategyError::UnknownFilterVariant(s.to_string()))
    }
}

/// Market odds predicate on the delta-favored side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OddsCondition {
    Any,
    /// Delta-favored side must be the market favorite.
    Favorite,
    /// Delta-favored side must be the market underdog.
    Underdog,
}

impl OddsCondition {
    pub const ALL: [OddsCondition; 3] = [
        OddsCondition::Any,
        OddsCondition::Favorite,
        OddsCondition::Underdog,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            OddsCondition::Any => "any",
            OddsCondition::Favorite => "favorite",
            OddsCondition::Underdog => "underdog",
        }
    }

    /// Equal odds have no market favorite, so they fail both restricted conditions.
    #[must_use]
    pub fn passes(self, eval: &MatchEvaluation) -> bool {
        match self {
            OddsCondition::Any => true,
            OddsCondition::Favorite => eval.favored_is_market_favorite(),
            OddsCondition::Underdog => eval.favored_is_market_underdog(),
        }
    }
}

impl fmt::Display for OddsCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OddsCondition {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StrategyError::UnknownOddsCondition(s.to_string()))
    }
}

/// One betting strategy, independent of threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub policy: StakingPolicy,
    pub hero_filter: HeroFilter,
    pub odds_condition: OddsCondition,
}

impl StrategyConfig {
    #[must_use]
    pub fn new(policy: StakingPolicy, hero_filter: HeroFilter, odds_condition: OddsCondition) -> Self {
        Self {
            policy,
            hero_filter,
            odds_condition,
        }
    }

    /// Builds a strategy from its textual labels.
    ///
    /// # Errors
    /// Returns the first [`StrategyError`] among the three labels.
    pub fn from_label(label: &StrategyLabel) -> Result<Self, StrategyError> {
        Ok(Self {
            policy: label.group.parse()?,
            hero_filter: label.hero_filter.parse()?,
            odds_condition: label.odds_condition.parse()?,
        })
    }

    /// Every policy × filter × condition, in generation order.
    #[must_use]
    pub fn enumerate() -> Vec<StrategyConfig> {
        StakingPolicy::ALL
            .into_iter()
            .flat_map(|policy| {
                HeroFilter::ALL.into_iter().flat_map(move |hero_filter| {
                    OddsCondition::ALL
                        .into_iter()
                        .map(move |odds_condition| StrategyConfig::new(policy, hero_filter, odds_condition))
                })
            })
            .collect()
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.policy, self.hero_filter, self.odds_condition)
    }
}

/// One simulation to execute: a strategy at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    /// Position in generation order; output rows are sorted by it.
    pub ordinal: usize,
    pub config: StrategyConfig,
    pub threshold: f64,
}

/// A label that could not be turned into a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyFailure {
    pub label: StrategyLabel,
    pub error: String,
}

fn sorted_thresholds(thresholds: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = thresholds.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted
}

fn expand(configs: &[StrategyConfig], thresholds: &[f64]) -> Vec<StrategyRun> {
    let thresholds = sorted_thresholds(thresholds);
    configs
        .iter()
        .flat_map(|config| thresholds.iter().map(move |&threshold| (*config, threshold)))
        .enumerate()
        .map(|(ordinal, (config, threshold))| StrategyRun {
            ordinal,
            config,
            threshold,
        })
        .collect()
}

/// The full sweep: every strategy, thresholds ascending within each.
#[must_use]
pub fn generate_strategies(thresholds: &[f64]) -> Vec<StrategyRun> {
    expand(&StrategyConfig::enumerate(), thresholds)
}

/// Sweep over an explicit list of labels, keeping label order.
///
/// Labels that fail to parse are returned separately and do not affect
/// the remaining strategies.
#[must_use]
pub fn strategies_from_labels(
    labels: &[StrategyLabel],
    thresholds: &[f64],
) -> (Vec<StrategyRun>, Vec<StrategyFailure>) {
    let mut configs = Vec::with_capacity(labels.len());
    let mut failures = Vec::new();
    for label in labels {
        match StrategyConfig::from_label(label) {
            Ok(config) => configs.push(config),
            Err(err) => {
                tracing::warn!(group = %label.group, error = %err, "Skipping invalid strategy");
                failures.push(StrategyFailure {
                    label: label.clone(),
                    error: err.to_string(),
                });
            }
        }
    }
    (expand(&configs, thresholds), failures)
}
