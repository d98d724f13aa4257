use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delta thresholds swept when none are configured.
pub const DEFAULT_THRESHOLDS: [f64; 14] = [
    5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 75.0, 100.0, 125.0, 150.0,
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("starting bankroll must be positive, got {0}")]
    NonPositiveBankroll(Decimal),
    #[error("delta threshold must be finite and >= 0, got {0}")]
    InvalidThreshold(f64),
    #[error("no delta thresholds configured")]
    NoThresholds,
    #[error("date range is inverted: {from} > {to}")]
    InvertedDateRange { from: NaiveDate, to: NaiveDate },
    #[error("worker count must be at least 1")]
    ZeroWorkers,
}

/// Labels of one strategy to run instead of the full enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyLabel {
    pub group: String,
    #[serde(default = "default_hero_filter")]
    pub hero_filter: String,
    #[serde(default = "default_odds_condition")]
    pub odds_condition: String,
}

fn default_hero_filter() -> String {
    "none".to_string()
}

fn default_odds_condition() -> String {
    "any".to_string()
}

/// Parameters of a backtest sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub starting_bankroll: Decimal,
    /// Per-bet cap; zero or negative means uncapped.
    pub max_bet: Decimal,
    pub thresholds: Vec<f64>,
    /// Inclusive lower date bound applied before simulation.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound applied before simulation.
    pub date_to: Option<NaiveDate>,
    /// When non-empty, only these championships are simulated.
    pub championship_allow: Vec<String>,
    pub championship_deny: Vec<String>,
    /// Extra spellings: alias -> canonical hero name.
    pub hero_aliases: BTreeMap<String, String>,
    pub write_ledger: bool,
    /// Sweep worker threads; `None` uses every available core.
    pub workers: Option<usize>,
    /// Explicit strategy list; `None` runs the full enumeration.
    pub strategies: Option<Vec<StrategyLabel>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            starting_bankroll: Decimal::ONE_THOUSAND,
            max_bet: Decimal::new(10_000, 0),
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            date_from: None,
            date_to: None,
            championship_allow: Vec::new(),
            championship_deny: Vec::new(),
            hero_aliases: BTreeMap::new(),
            write_ledger: false,
            workers: None,
            strategies: None,
        }
    }
}

impl SimulationConfig {
    /// Effective per-bet cap, `None` when uncapped.
    #[must_use]
    pub fn bet_cap(&self) -> Option<Decimal> {
        (self.max_bet > Decimal::ZERO).then_some(self.max_bet)
    }

    /// Checks invariants and canonicalizes the threshold list
    /// (ascending, duplicates removed).
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.starting_bankroll <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveBankroll(self.starting_bankroll));
        }
        if let Some(bad) = self
            .thresholds
            .iter()
            .copied()
            .find(|t| !t.is_finite() || *t < 0.0)
        {
            return Err(ConfigError::InvalidThreshold(bad));
        }
        if self.thresholds.is_empty() {
            return Err(ConfigError::NoThresholds);
        }
        self.thresholds.sort_by(f64::total_cmp);
        self.thresholds.dedup();

        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ConfigError::InvertedDateRange { from, to });
            }
        }
        if self.workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_reference_run() {
        let config = SimulationConfig::default();
        assert_eq!(config.starting_bankroll, dec!(1000));
        assert_eq!(config.bet_cap(), Some(dec!(10000)));
        assert_eq!(config.thresholds.first(), Some(&5.0));
        assert!(!config.write_ledger);
    }

    #[test]
    fn non_positive_cap_means_uncapped() {
        let config = SimulationConfig {
            max_bet: dec!(0),
            ..SimulationConfig::default()
        };
        assert_eq!(config.bet_cap(), None);
    }

    #[test]
    fn validate_sorts_and_dedups_thresholds() {
        let mut config = SimulationConfig {
            thresholds: vec![20.0, 5.0, 20.0, 0.0],
            ..SimulationConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.thresholds, vec![0.0, 5.0, 20.0]);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut negative = SimulationConfig {
            thresholds: vec![-1.0],
            ..SimulationConfig::default()
        };
        assert_eq!(negative.validate(), Err(ConfigError::InvalidThreshold(-1.0)));

        let mut broke = SimulationConfig {
            starting_bankroll: dec!(0),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            broke.validate(),
            Err(ConfigError::NonPositiveBankroll(_))
        ));

        let mut inverted = SimulationConfig {
            date_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvertedDateRange { .. })
        ));
    }

    #[test]
    fn strategy_label_defaults_filters() {
        let label: StrategyLabel = serde_json::from_str(r#"{"group":"Fib1"}"#).unwrap();
        assert_eq!(label.hero_filter, "none");
        assert_eq!(label.odds_condition, "any");
    }
}
