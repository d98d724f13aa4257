//! Error and skip taxonomy shared by every stage of the pipeline.
//!
//! Per-record problems are never fatal: they are classified as a
//! [`SkipReason`] and tallied in [`SkipCounters`] so that a batch run can
//! account for every input row it did not use.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single match record was excluded from matrix building or simulation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkipReason {
    /// Wrong hero count, unparsable field, or a winner that names neither team.
    #[error("malformed record")]
    MalformedRecord,
    /// At least one of the ten heroes is not in the hero index.
    #[error("unresolved hero")]
    UnresolvedHero,
    /// Missing, non-finite, or <= 1 decimal odds.
    #[error("invalid odds")]
    InvalidOdds,
}

impl SkipReason {
    /// Stable snake_case label used in logs and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SkipReason::MalformedRecord => "malformed_record",
            SkipReason::UnresolvedHero => "unresolved_hero",
            SkipReason::InvalidOdds => "invalid_odds",
        }
    }
}

/// Failure to resolve a hero name against the index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeroError {
    #[error("unresolved hero: '{name}'")]
    UnresolvedHero { name: String },
}

impl From<HeroError> for SkipReason {
    fn from(_: HeroError) -> Self {
        SkipReason::UnresolvedHero
    }
}

/// Structural problems in a matchup matrix (as opposed to per-record skips).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("matrix has {rows} rows but {heroes} heroes")]
    RowCount { rows: usize, heroes: usize },
    #[error("row {row} has {cols} cells but {heroes} heroes")]
    ColumnCount {
        row: usize,
        cols: usize,
        heroes: usize,
    },
    #[error("malformed cell at [{row}][{col}]: {detail}")]
    MalformedCell {
        row: usize,
        col: usize,
        detail: String,
    },
    #[error("per-hero array '{name}' has {len} entries but {heroes} heroes")]
    AggregateLength {
        name: String,
        len: usize,
        heroes: usize,
    },
    #[error("hero lists differ: cannot combine matrices over different heroes")]
    HeroListMismatch,
}

/// Per-category skip tallies for data-quality auditing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounters {
    pub malformed_record: u64,
    pub unresolved_hero: u64,
    pub invalid_odds: u64,
    /// Rows excluded by date-range or championship filters (not a data problem).
    pub filtered: u64,
    /// Distinct raw names that failed hero resolution.
    pub unresolved_names: BTreeSet<String>,
}

impl SkipCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MalformedRecord => self.malformed_record += 1,
            SkipReason::UnresolvedHero => self.unresolved_hero += 1,
            SkipReason::InvalidOdds => self.invalid_odds += 1,
        }
    }

    pub fn record_unresolved(&mut self, name: &str) {
        self.unresolved_hero += 1;
        self.unresolved_names.insert(name.to_string());
    }

    pub fn record_filtered(&mut self) {
        self.filtered += 1;
    }

    #[must_use]
    pub fn count(&self, reason: SkipReason) -> u64 {
        match reason {
            SkipReason::MalformedRecord => self.malformed_record,
            SkipReason::UnresolvedHero => self.unresolved_hero,
            SkipReason::InvalidOdds => self.invalid_odds,
        }
    }

    /// Total data-quality skips, excluding filtered rows.
    #[must_use]
    pub fn total_skipped(&self) -> u64 {
        self.malformed_record + self.unresolved_hero + self.invalid_odds
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.total_skipped() == 0
    }

    /// Folds another set of counters into this one.
    pub fn merge(&mut self, other: &SkipCounters) {
        self.malformed_record += other.malformed_record;
        self.unresolved_hero += other.unresolved_hero;
        self.invalid_odds += other.invalid_odds;
        self.filtered += other.filtered;
        self.unresolved_names
            .extend(other.unresolved_names.iter().cloned());
    }
}

impl fmt::Display for SkipCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed_record={} unresolved_hero={} invalid_odds={} filtered={}",
            self.malformed_record, self.unresolved_hero, self.invalid_odds, self.filtered
        )
    }
}
