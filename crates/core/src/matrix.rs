//! Pairwise hero matchup matrix and its single-pass builder.
//!
//! The builder keeps only integer counters resident (an N×N games grid, an
//! N×N wins grid and per-hero totals), so a corpus of any size can be
//! streamed through it. Integer counters make the result independent of the
//! order in which matches arrive.
//!
//! # Cell semantics
//!
//! `cell(i, j)` describes hero `i` playing *against* hero `j`:
//! `wins` counts games where `i`'s side beat `j`'s side. A cell with zero
//! games is absent rather than defaulted to an even matchup, so callers can
//! tell "no data" apart from "50%".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MatrixError, SkipCounters, SkipReason};
use crate::hero::{HeroId, HeroIndex};
use crate::matchup::{MatchRecord, Side, TEAM_SIZE};

/// Global win rate reported for a hero with no recorded games.
pub const NO_DATA_WIN_RATE: f64 = 50.0;

/// Below this global win rate a hero's figure is treated as missing when merging.
pub const MERGE_MIN_WIN_RATE: f64 = 1.0;

/// Fixed-point scale for secondary stat sums (micro-units).
const STAT_SCALE: f64 = 1_000_000.0;

/// Head-to-head record of one hero against another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupCell {
    pub games: u32,
    pub wins: u32,
    /// `wins / games * 100`.
    pub win_rate: f64,
    /// `win_rate - 50`.
    pub advantage: f64,
}

impl MatchupCell {
    /// Builds a cell from raw counts; `None` when there are no games.
    #[must_use]
    pub fn from_counts(games: u32, wins: u32) -> Option<Self> {
        if games == 0 {
            return None;
        }
        let win_rate = f64::from(wins) / f64::from(games) * 100.0;
        Some(Self {
            games,
            wins,
            win_rate,
            advantage: win_rate - 50.0,
        })
    }

    /// Rebuilds a cell from a stored win rate; wins are recovered by rounding.
    #[must_use]
    pub fn from_rates(games: u32, win_rate: f64, advantage: f64) -> Option<Self> {
        if games == 0 {
            return None;
        }
        let wins = (f64::from(games) * win_rate / 100.0).round().clamp(0.0, f64::from(games));
        Some(Self {
            games,
            wins: wins as u32,
            win_rate,
            advantage,
        })
    }
}

/// Per-hero totals across every valid match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeroAggregate {
    pub games: u64,
    pub wins: u64,
    /// Global win rate in percent, [`NO_DATA_WIN_RATE`] when `games == 0`.
    pub win_rate: f64,
}

impl HeroAggregate {
    #[must_use]
    pub fn from_counts(games: u64, wins: u64) -> Self {
        let win_rate = if games == 0 {
            NO_DATA_WIN_RATE
        } else {
            wins as f64 / games as f64 * 100.0
        };
        Self {
            games,
            wins,
            win_rate,
        }
    }
}

impl Default for HeroAggregate {
    fn default() -> Self {
        Self::from_counts(0, 0)
    }
}

/// Outcome of [`MatchupMatrix::fill_missing_from`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub cells_filled: usize,
    pub heroes_filled: usize,
}

/// Immutable N×N matchup grid plus per-hero aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupMatrix {
    heroes: Vec<String>,
    aggregates: Vec<HeroAggregate>,
    /// Row-major, `heroes.len()²` entries.
    cells: Vec<Option<MatchupCell>>,
    /// Named per-hero averages, parallel to `heroes`.
    secondary: BTreeMap<String, Vec<Option<f64>>>,
}

impl MatchupMatrix {
    /// Assembles a matrix from already-validated parts (e.g. a loaded file).
    ///
    /// # Errors
    /// Returns [`MatrixError`] if any array disagrees with the hero count.
    pub fn from_parts(
        heroes: Vec<String>,
        aggregates: Vec<HeroAggregate>,
        rows: Vec<Vec<Option<MatchupCell>>>,
        secondary: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Result<Self, MatrixError> {
        let n = heroes.len();
        if aggregates.len() != n {
            return Err(MatrixError::AggregateLength {
                name: "heroes_wr".to_string(),
                len: aggregates.len(),
                heroes: n,
            });
        }
        if rows.len() != n {
            return Err(MatrixError::RowCount {
                rows: rows.len(),
                heroes: n,
            });
        }
        for (name, values) in &secondary {
            if values.len() != n {
                return Err(MatrixError::AggregateLength {
                    name: name.clone(),
                    len: values.len(),
                    heroes: n,
                });
            }
        }

        let mut cells = Vec::with_capacity(n * n);
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(MatrixError::ColumnCount {
                    row: row_idx,
                    cols: row.len(),
                    heroes: n,
                });
            }
            cells.extend(row);
        }

        Ok(Self {
            heroes,
            aggregates,
            cells,
            secondary,
        })
    }

    #[must_use]
    pub fn hero_count(&self) -> usize {
        self.heroes.len()
    }

    #[must_use]
    pub fn heroes(&self) -> &[String] {
        &self.heroes
    }

    #[must_use]
    pub fn aggregates(&self) -> &[HeroAggregate] {
        &self.aggregates
    }

    #[must_use]
    pub fn aggregate(&self, hero: HeroId) -> Option<&HeroAggregate> {
        self.aggregates.get(hero.index())
    }

    /// Global win rate of `hero`; the no-data sentinel for unknown ids.
    #[must_use]
    pub fn win_rate(&self, hero: HeroId) -> f64 {
        self.aggregate(hero)
            .map_or(NO_DATA_WIN_RATE, |a| a.win_rate)
    }

    #[must_use]
    pub fn cell(&self, hero: HeroId, opponent: HeroId) -> Option<&MatchupCell> {
        let n = self.hero_count();
        if hero.index() >= n || opponent.index() >= n {
            return None;
        }
        self.cells[hero.index() * n + opponent.index()].as_ref()
    }

    /// Advantage of `hero` against `opponent`; absent cells contribute 0.
    #[must_use]
    pub fn advantage(&self, hero: HeroId, opponent: HeroId) -> f64 {
        self.cell(hero, opponent).map_or(0.0, |c| c.advantage)
    }

    /// One row of the grid, for serialization.
    #[must_use]
    pub fn row(&self, hero: HeroId) -> &[Option<MatchupCell>] {
        let n = self.hero_count();
        let start = hero.index() * n;
        &self.cells[start..start + n]
    }

    #[must_use]
    pub fn secondary(&self) -> &BTreeMap<String, Vec<Option<f64>>> {
        &self.secondary
    }

    /// Number of populated (non-absent) cells.
    #[must_use]
    pub fn populated_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// True when `games[i][j] == games[j][i]` for every pair.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let n = self.hero_count();
        (0..n).all(|i| {
            (i + 1..n).all(|j| {
                let a = self.cells[i * n + j].map_or(0, |c| c.games);
                let b = self.cells[j * n + i].map_or(0, |c| c.games);
                a == b
            })
        })
    }

    /// Fills gaps in this matrix from `fallback` over the same hero list.
    ///
    /// Absent cells take the fallback's cell; a hero whose global win rate
    /// is below [`MERGE_MIN_WIN_RATE`], or who has no games where the
    /// fallback has some, takes the fallback's aggregate. Present cells are
    /// never overwritten.
    ///
    /// # Errors
    /// Returns [`MatrixError::HeroListMismatch`] if the hero lists differ.
    pub fn fill_missing_from(&mut self, fallback: &MatchupMatrix) -> Result<MergeStats, MatrixError> {
        if self.heroes != fallback.heroes {
            return Err(MatrixError::HeroListMismatch);
        }

        let mut stats = MergeStats::default();
        for (own, other) in self.aggregates.iter_mut().zip(&fallback.aggregates) {
            let missing = own.win_rate < MERGE_MIN_WIN_RATE || (own.games == 0 && other.games > 0);
            if missing && own != other {
                *own = *other;
                stats.heroes_filled += 1;
            }
        }
        for (own, other) in self.cells.iter_mut().zip(&fallback.cells) {
            if own.is_none() && other.is_some() {
                *own = *other;
                stats.cells_filled += 1;
            }
        }

        debug!(
            cells = stats.cells_filled,
            heroes = stats.heroes_filled,
            "Merged fallback matrix"
        );
        Ok(stats)
    }
}

/// Streaming accumulator producing a [`MatchupMatrix`].
pub struct MatrixBuilder<'a> {
    index: &'a HeroIndex,
    games: Vec<u32>,
    wins: Vec<u32>,
    hero_games: Vec<u64>,
    hero_wins: Vec<u64>,
    /// metric -> per-hero (fixed-point sum, observations)
    stats: BTreeMap<String, Vec<(i128, u64)>>,
    ingested: u64,
    skips: SkipCounters,
}

impl<'a> MatrixBuilder<'a> {
    #[must_use]
    pub fn new(index: &'a HeroIndex) -> Self {
        let n = index.len();
        Self {
            index,
            games: vec![0; n * n],
            wins: vec![0; n * n],
            hero_games: vec![0; n],
            hero_wins: vec![0; n],
            stats: BTreeMap::new(),
            ingested: 0,
            skips: SkipCounters::new(),
        }
    }

    /// Folds one match into the counters.
    ///
    /// All ten heroes must resolve; otherwise nothing is counted for this
    /// match and the skip is tallied.
    ///
    /// # Errors
    /// Returns [`SkipReason::UnresolvedHero`] when any hero is unknown.
    pub fn ingest(&mut self, record: &MatchRecord) -> Result<(), SkipReason> {
        let (winners, losers) = match self.resolve(record) {
            Ok(sides) => sides,
            Err(name) => {
                debug!(match_id = record.match_id, hero = %name, "Skipping match with unresolved hero");
                self.skips.record_unresolved(&name);
                return Err(SkipReason::UnresolvedHero);
            }
        };

        let n = self.index.len();
        for &h in &winners {
            for &o in &losers {
                let (h, o) = (h.index(), o.index());
                self.games[h * n + o] += 1;
                self.games[o * n + h] += 1;
                self.wins[h * n + o] += 1;
            }
        }
        for &h in &winners {
            self.hero_games[h.index()] += 1;
            self.hero_wins[h.index()] += 1;
        }
        for &o in &losers {
            self.hero_games[o.index()] += 1;
        }

        self.ingested += 1;
        Ok(())
    }

    /// Adds one observation of a secondary per-hero metric (e.g. gold per minute).
    /// Non-finite values and unknown ids are ignored.
    pub fn observe_stat(&mut self, hero: HeroId, metric: &str, value: f64) {
        let n = self.index.len();
        if hero.index() >= n || !value.is_finite() {
            return;
        }
        let slots = self
            .stats
            .entry(metric.to_string())
            .or_insert_with(|| vec![(0, 0); n]);
        let slot = &mut slots[hero.index()];
        slot.0 += (value * STAT_SCALE).round() as i128;
        slot.1 += 1;
    }

    /// Ingests every record from `records`, tallying skips.
    pub fn ingest_all<I, R>(&mut self, records: I)
    where
        I: IntoIterator<Item = R>,
        R: std::borrow::Borrow<MatchRecord>,
    {
        for record in records {
            let _ = self.ingest(record.borrow());
        }
    }

    #[must_use]
    pub fn ingested(&self) -> u64 {
        self.ingested
    }

    #[must_use]
    pub fn skips(&self) -> &SkipCounters {
        &self.skips
    }

    /// Finalizes the counters into an immutable matrix.
    #[must_use]
    pub fn finish(self) -> (MatchupMatrix, SkipCounters) {
        let n = self.index.len();
        let cells = self
            .games
            .iter()
            .zip(&self.wins)
            .map(|(&g, &w)| MatchupCell::from_counts(g, w))
            .collect();
        let aggregates = self
            .hero_games
            .iter()
            .zip(&self.hero_wins)
            .map(|(&g, &w)| HeroAggregate::from_counts(g, w))
            .collect();
        let secondary = self
            .stats
            .into_iter()
            .map(|(metric, slots)| {
                let averages = slots
                    .into_iter()
                    .map(|(sum, count)| {
                        (count > 0).then(|| sum as f64 / STAT_SCALE / count as f64)
                    })
                    .collect();
                (metric, averages)
            })
            .collect();

        let matrix = MatchupMatrix {
            heroes: self.index.names(),
            aggregates,
            cells,
            secondary,
        };

        info!(
            heroes = n,
            matches = self.ingested,
            populated_cells = matrix.populated_cells(),
            skipped = self.skips.total_skipped(),
            "Matchup matrix built"
        );
        (matrix, self.skips)
    }

    /// Resolves (winning side, losing side) or returns the first unknown name.
    fn resolve(&self, record: &MatchRecord) -> Result<(Vec<HeroId>, Vec<HeroId>), String> {
        let resolve_side = |side: Side| -> Result<Vec<HeroId>, String> {
            let mut ids = Vec::with_capacity(TEAM_SIZE);
            for name in record.heroes(side) {
                ids.push(self.index.resolve(name).map_err(|_| name.clone())?);
            }
            Ok(ids)
        };
        let winners = resolve_side(record.winner)?;
        let losers = resolve_side(record.winner.other())?;
        Ok((winners, losers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchup::MatchDraft;
    use chrono::NaiveDate;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // ============================================================
    // Test Helpers
    // ============================================================

    const HEROES: [&str; 12] = [
        "Axe", "Lina", "Lion", "Sven", "Tiny", "Pudge", "Zeus", "Mirana", "Ursa", "Viper", "Slark",
        "Tusk",
    ];

    fn index() -> HeroIndex {
        HeroIndex::build(&HEROES)
    }

    fn record(id: u64, t1: [&str; 5], t2: [&str; 5], team1_wins: bool) -> MatchRecord {
        MatchRecord::try_from(MatchDraft {
            match_id: id,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            championship: None,
            team1: "A".to_string(),
            team2: "B".to_string(),
            team1_heroes: t1.iter().map(|s| (*s).to_string()).collect(),
            team2_heroes: t2.iter().map(|s| (*s).to_string()).collect(),
            winner: if team1_wins { "A" } else { "B" }.to_string(),
            team1_odds: None,
            team2_odds: None,
            series_id: 0,
            map_number: 0,
        })
        .unwrap()
    }

    fn corpus() -> Vec<MatchRecord> {
        vec![
            record(1, ["Axe", "Lina", "Lion", "Sven", "Tiny"], ["Pudge", "Zeus", "Mirana", "Ursa", "Viper"], true),
            record(2, ["Axe", "Zeus", "Lion", "Slark", "Tiny"], ["Pudge", "Lina", "Mirana", "Ursa", "Tusk"], false),
            record(3, ["Tusk", "Lina", "Viper", "Sven", "Axe"], ["Pudge", "Zeus", "Mirana", "Slark", "Tiny"], true),
            record(4, ["Ursa", "Lion", "Zeus", "Mirana", "Pudge"], ["Axe", "Lina", "Sven", "Tiny", "Viper"], true),
        ]
    }

    fn id(name: &str) -> HeroId {
        index().resolve(name).unwrap()
    }

    // ============================================================
    // Counting
    // ============================================================

    #[test]
    fn single_match_updates_both_directions() {
        let index = index();
        let mut builder = MatrixBuilder::new(&index);
        builder
            .ingest(&record(1, ["Axe", "Lina", "Lion", "Sven", "Tiny"], ["Pudge", "Zeus", "Mirana", "Ursa", "Viper"], true))
            .unwrap();
        let (matrix, skips) = builder.finish();

        assert!(skips.is_clean());
        let axe_vs_pudge = matrix.cell(id("Axe"), id("Pudge")).unwrap();
        assert_eq!(axe_vs_pudge.games, 1);
        assert_eq!(axe_vs_pudge.wins, 1);
        assert!((axe_vs_pudge.advantage - 50.0).abs() < 1e-9);

        let pudge_vs_axe = matrix.cell(id("Pudge"), id("Axe")).unwrap();
        assert_eq!(pudge_vs_axe.games, 1);
        assert_eq!(pudge_vs_axe.wins, 0);
        assert!((pudge_vs_axe.advantage + 50.0).abs() < 1e-9);

        // teammates never face each other
        assert!(matrix.cell(id("Axe"), id("Lina")).is_none());
        assert_eq!(matrix.populated_cells(), 50);
    }

    #[test]
    fn hero_aggregates_use_sentinel_without_games() {
        let index = index();
        let mut builder = MatrixBuilder::new(&index);
        builder.ingest_all(&corpus()[..1]);
        let (matrix, _) = builder.finish();

        assert!((matrix.win_rate(id("Axe")) - 100.0).abs() < 1e-9);
        assert!((matrix.win_rate(id("Pudge")) - 0.0).abs() < 1e-9);
        let slark = matrix.aggregate(id("Slark")).unwrap();
        assert_eq!(slark.games, 0);
        assert!((slark.win_rate - NO_DATA_WIN_RATE).abs() < f64::EPSILON);
    }

    #[test]
    fn absent_cell_contributes_zero_advantage() {
        let index = index();
        let (matrix, _) = MatrixBuilder::new(&index).finish();
        assert!(matrix.cell(id("Axe"), id("Pudge")).is_none());
        assert!(matrix.advantage(id("Axe"), id("Pudge")).abs() < f64::EPSILON);
    }

    #[test]
    fn unresolved_hero_voids_whole_match() {
        let index = index();
        let mut builder = MatrixBuilder::new(&index);
        let bad = record(9, ["Axe", "Lina", "Lion", "Sven", "Techies"], ["Pudge", "Zeus", "Mirana", "Ursa", "Viper"], true);

        assert_eq!(builder.ingest(&bad), Err(SkipReason::UnresolvedHero));
        let (matrix, skips) = builder.finish();

        assert_eq!(matrix.populated_cells(), 0);
        assert_eq!(skips.unresolved_hero, 1);
        assert!(skips.unresolved_names.contains("Techies"));
        assert_eq!(matrix.aggregate(id("Axe")).unwrap().games, 0);
    }

    // ============================================================
    // Invariants
    // ============================================================

    #[test]
    fn games_are_symmetric() {
        let index = index();
        let mut builder = MatrixBuilder::new(&index);
        builder.ingest_all(corpus());
        let (matrix, _) = builder.finish();

        assert!(matrix.is_symmetric());
        for i in 0..HEROES.len() {
            for j in 0..HEROES.len() {
                let a = matrix.cell(HeroId(i), HeroId(j));
                let b = matrix.cell(HeroId(j), HeroId(i));
                assert_eq!(a.map(|c| c.games), b.map(|c| c.games));
                if let (Some(a), Some(b)) = (a, b) {
                    assert_eq!(a.wins + b.wins, a.games);
                }
            }
        }
    }

    #[test]
    fn rebuild_is_identical_regardless_of_order() {
        let index = index();
        let mut first = MatrixBuilder::new(&index);
        first.ingest_all(corpus());
        let (baseline, _) = first.finish();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..5 {
            let mut shuffled = corpus();
            shuffled.shuffle(&mut rng);
            let mut builder = MatrixBuilder::new(&index);
            builder.ingest_all(shuffled);
            let (matrix, _) = builder.finish();
            assert_eq!(matrix, baseline);
        }
    }

    #[test]
    fn secondary_stats_are_averaged_order_independently() {
        let index = index();
        let observations = [(0usize, 410.5), (0, 389.25), (0, 500.0), (3, 620.0)];

        let mut forward = MatrixBuilder::new(&index);
        for (hero, value) in observations {
            forward.observe_stat(HeroId(hero), "gpm", value);
        }
        let mut backward = MatrixBuilder::new(&index);
        for (hero, value) in observations.iter().rev() {
            backward.observe_stat(HeroId(*hero), "gpm", *value);
        }
        backward.observe_stat(HeroId(1), "gpm", f64::NAN);

        let (a, _) = forward.finish();
        let (b, _) = backward.finish();
        assert_eq!(a, b);

        let gpm = &a.secondary()["gpm"];
        assert!((gpm[0].unwrap() - 433.25).abs() < 1e-9);
        assert!((gpm[3].unwrap() - 620.0).abs() < 1e-9);
        assert!(gpm[1].is_none());
    }

    // ============================================================
    // Assembly and merge
    // ============================================================

    #[test]
    fn from_parts_rejects_ragged_rows() {
        let heroes = vec!["Axe".to_string(), "Lina".to_string()];
        let aggregates = vec![HeroAggregate::default(); 2];
        let rows = vec![vec![None, None], vec![None]];
        let err = MatchupMatrix::from_parts(heroes, aggregates, rows, BTreeMap::new()).unwrap_err();
        assert_eq!(
            err,
            MatrixError::ColumnCount {
                row: 1,
                cols: 1,
                heroes: 2
            }
        );
    }

    #[test]
    fn fill_missing_never_overwrites_present_cells() {
        let heroes = vec!["Axe".to_string(), "Lina".to_string()];
        let own_cell = MatchupCell::from_counts(10, 6);
        let other_cell = MatchupCell::from_counts(4, 1);
        let mut primary = MatchupMatrix::from_parts(
            heroes.clone(),
            vec![HeroAggregate::from_counts(10, 6), HeroAggregate::from_counts(0, 0)],
            vec![vec![None, own_cell], vec![None, None]],
            BTreeMap::new(),
        )
        .unwrap();
        let fallback = MatchupMatrix::from_parts(
            heroes,
            vec![HeroAggregate::from_counts(8, 2), HeroAggregate::from_counts(8, 6)],
            vec![vec![None, other_cell], vec![other_cell, None]],
            BTreeMap::new(),
        )
        .unwrap();

        let stats = primary.fill_missing_from(&fallback).unwrap();
        assert_eq!(stats.cells_filled, 1);
        assert_eq!(stats.heroes_filled, 1);
        assert_eq!(primary.cell(HeroId(0), HeroId(1)).copied(), own_cell);
        assert_eq!(primary.cell(HeroId(1), HeroId(0)).copied(), other_cell);
        assert!((primary.win_rate(HeroId(0)) - 60.0).abs() < 1e-9);
        assert!((primary.win_rate(HeroId(1)) - 75.0).abs() < 1e-9);
    }

    #[test]
    fn fill_missing_requires_same_heroes() {
        let mut a = MatchupMatrix::from_parts(
            vec!["Axe".to_string()],
            vec![HeroAggregate::default()],
            vec![vec![None]],
            BTreeMap::new(),
        )
        .unwrap();
        let b = MatchupMatrix::from_parts(
            vec!["Lina".to_string()],
            vec![HeroAggregate::default()],
            vec![vec![None]],
            BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(a.fill_missing_from(&b), Err(MatrixError::HeroListMismatch));
    }

    #[test]
    fn cell_from_rates_recovers_wins() {
        let cell = MatchupCell::from_rates(8, 62.5, 12.5).unwrap();
        assert_eq!(cell.wins, 5);
        assert!(MatchupCell::from_rates(0, 50.0, 0.0).is_none());
    }
}
