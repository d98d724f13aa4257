//! Team-vs-team advantage scoring.
//!
//! For each hero on a team, the per-hero advantage is the sum of its matrix
//! advantage against every opponent hero. A team's total is the sum over its
//! heroes of (global win rate + per-hero advantage). The delta between two
//! totals picks the *delta-favored* side.
//!
//! The delta-favored side and the *market favorite* (strictly lower odds)
//! are independent: [`MatchEvaluation`] carries both and never merges them.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{HeroError, SkipReason};
use crate::hero::{HeroId, HeroIndex};
use crate::matchup::{MarketOdds, MatchRecord, Side};
use crate::matrix::MatchupMatrix;

/// Score of one team against one opponent line-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub total: f64,
    /// Heroes whose summed advantage is strictly positive.
    pub positive_count: usize,
    /// Heroes whose summed advantage is strictly negative.
    pub negative_count: usize,
}

/// Read-only scorer over a shared matrix and hero index.
#[derive(Debug, Clone, Copy)]
pub struct AdvantageScorer<'a> {
    matrix: &'a MatchupMatrix,
    index: &'a HeroIndex,
}

impl<'a> AdvantageScorer<'a> {
    #[must_use]
    pub fn new(matrix: &'a MatchupMatrix, index: &'a HeroIndex) -> Self {
        Self { matrix, index }
    }

    /// Sum of `hero`'s advantage over every opponent with a present cell.
    #[must_use]
    pub fn hero_advantage(&self, hero: HeroId, opponents: &[HeroId]) -> f64 {
        opponents
            .iter()
            .map(|&opp| self.matrix.advantage(hero, opp))
            .sum()
    }

    /// Scores resolved hero ids.
    #[must_use]
    pub fn score_ids(&self, team: &[HeroId], opponents: &[HeroId]) -> TeamScore {
        let mut total = 0.0;
        let mut positive_count = 0;
        let mut negative_count = 0;
        for &hero in team {
            let adv = self.hero_advantage(hero, opponents);
            total += self.matrix.win_rate(hero) + adv;
            if adv > 0.0 {
                positive_count += 1;
            } else if adv < 0.0 {
                negative_count += 1;
            }
        }
        TeamScore {
            total,
            positive_count,
            negative_count,
        }
    }

    /// Scores a team given by hero names.
    ///
    /// # Errors
    /// Returns [`HeroError::UnresolvedHero`] if any hero on either side is
    /// unknown; no partial score is produced.
    pub fn score<S: AsRef<str>>(&self, team: &[S], opponents: &[S]) -> Result<TeamScore, HeroError> {
        let team = self.index.resolve_team(team)?;
        let opponents = self.index.resolve_team(opponents)?;
        Ok(self.score_ids(&team, &opponents))
    }

    /// `score(team1).total - score(team2).total`.
    ///
    /// # Errors
    /// Returns [`HeroError::UnresolvedHero`] if any hero is unknown.
    pub fn delta<S: AsRef<str>>(&self, team1: &[S], team2: &[S]) -> Result<f64, HeroError> {
        let t1 = self.index.resolve_team(team1)?;
        let t2 = self.index.resolve_team(team2)?;
        Ok(self.score_ids(&t1, &t2).total - self.score_ids(&t2, &t1).total)
    }

    /// Evaluates a whole match for simulation.
    ///
    /// # Errors
    /// [`SkipReason::UnresolvedHero`] for an unknown hero (whole match),
    /// [`SkipReason::InvalidOdds`] if either side's odds are missing or <= 1.
    pub fn evaluate(&self, record: &MatchRecord) -> Result<MatchEvaluation, EvaluationError> {
        let t1 = self.index.resolve_team(&record.team1_heroes)?;
        let t2 = self.index.resolve_team(&record.team2_heroes)?;
        let odds = record.market_odds()?;

        let team1_score = self.score_ids(&t1, &t2);
        let team2_score = self.score_ids(&t2, &t1);
        let delta = team1_score.total - team2_score.total;

        Ok(MatchEvaluation {
            match_id: record.match_id,
            timestamp: record.timestamp,
            series_id: record.series_id,
            map_number: record.map_number,
            championship: record.championship.clone(),
            team1: record.team1.clone(),
            team2: record.team2.clone(),
            winner: record.winner,
            odds,
            team1_score,
            team2_score,
            delta,
            delta_favored: delta_side(delta),
            market_favorite: odds.market_favorite(),
        })
    }
}

/// Why a record could not be evaluated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error(transparent)]
    Hero(#[from] HeroError),
    #[error(transparent)]
    Skip(#[from] SkipReason),
}

impl EvaluationError {
    #[must_use]
    pub fn reason(&self) -> SkipReason {
        match self {
            EvaluationError::Hero(_) => SkipReason::UnresolvedHero,
            EvaluationError::Skip(reason) => *reason,
        }
    }
}

fn delta_side(delta: f64) -> Option<Side> {
    if delta > 0.0 {
        Some(Side::Team1)
    } else if delta < 0.0 {
        Some(Side::Team2)
    } else {
        None
    }
}

/// Everything the simulator needs to know about one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvaluation {
    pub match_id: u64,
    pub timestamp: NaiveDateTime,
    pub series_id: u64,
    pub map_number: u32,
    pub championship: Option<String>,
    pub team1: String,
    pub team2: String,
    pub winner: Side,
    pub odds: MarketOdds,
    pub team1_score: TeamScore,
    pub team2_score: TeamScore,
    /// `team1_score.total - team2_score.total`.
    pub delta: f64,
    /// Side favored by hero advantage; `None` on an exact tie.
    pub delta_favored: Option<Side>,
    /// Side with strictly lower decimal odds; `None` on equal odds.
    pub market_favorite: Option<Side>,
}

impl MatchEvaluation {
    #[must_use]
    pub fn abs_delta(&self) -> f64 {
        self.delta.abs()
    }

    #[must_use]
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Team1 => &self.team1,
            Side::Team2 => &self.team2,
        }
    }

    #[must_use]
    pub fn score(&self, side: Side) -> &TeamScore {
        match side {
            Side::Team1 => &self.team1_score,
            Side::Team2 => &self.team2_score,
        }
    }

    /// Odds of the delta-favored side.
    #[must_use]
    pub fn favored_odds(&self) -> Option<Decimal> {
        self.delta_favored.map(|s| self.odds.for_side(s))
    }

    /// Odds of the side opposing the delta-favored one.
    #[must_use]
    pub fn opponent_odds(&self) -> Option<Decimal> {
        self.delta_favored.map(|s| self.odds.for_side(s.other()))
    }

    /// True when the delta-favored side is also the market favorite.
    #[must_use]
    pub fn favored_is_market_favorite(&self) -> bool {
        matches!((self.delta_favored, self.market_favorite), (Some(d), Some(m)) if d == m)
    }

    /// True when the delta-favored side is the market underdog.
    #[must_use]
    pub fn favored_is_market_underdog(&self) -> bool {
        matches!((self.delta_favored, self.market_favorite), (Some(d), Some(m)) if d != m)
    }

    #[must_use]
    pub fn favored_won(&self) -> bool {
        self.delta_favored == Some(self.winner)
    }

    /// Chronological replay key: (timestamp, series, map, match id).
    #[must_use]
    pub fn sort_key(&self) -> (NaiveDateTime, u64, u32, u64) {
        (self.timestamp, self.series_id, self.map_number, self.match_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchup::MatchDraft;
    use crate::matrix::{HeroAggregate, MatchupCell};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    // Four heroes: A, B vs C, D with hand-set cells.
    fn fixture() -> (MatchupMatrix, HeroIndex) {
        let heroes: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| (*s).to_string()).collect();
        let index = HeroIndex::build(&heroes);
        let cell = |games, wins| MatchupCell::from_counts(games, wins);
        // A beats C 60%, A vs D missing, B loses to C 40%, B vs D 50%
        let rows = vec![
            vec![None, None, cell(10, 6), None],
            vec![None, None, cell(10, 4), cell(10, 5)],
            vec![cell(10, 4), cell(10, 6), None, None],
            vec![None, cell(10, 5), None, None],
        ];
        let aggregates = vec![
            HeroAggregate::from_counts(100, 52),
            HeroAggregate::from_counts(100, 48),
            HeroAggregate::from_counts(100, 50),
            HeroAggregate::from_counts(0, 0),
        ];
        let matrix = MatchupMatrix::from_parts(heroes, aggregates, rows, BTreeMap::new()).unwrap();
        (matrix, index)
    }

    #[test]
    fn score_sums_win_rate_and_advantage() {
        let (matrix, index) = fixture();
        let scorer = AdvantageScorer::new(&matrix, &index);
        let score = scorer.score(&["A", "B"], &["C", "D"]).unwrap();

        // A: 52 + 10 + 0 ; B: 48 + (-10) + 0
        assert!((score.total - 100.0).abs() < 1e-9);
        assert_eq!(score.positive_count, 1);
        assert_eq!(score.negative_count, 1);
    }

    #[test]
    fn zero_advantage_counts_as_neither() {
        let (matrix, index) = fixture();
        let scorer = AdvantageScorer::new(&matrix, &index);
        let score = scorer.score(&["D"], &["B"]).unwrap();
        assert_eq!(score.positive_count, 0);
        assert_eq!(score.negative_count, 0);
        assert!((score.total - 50.0).abs() < 1e-9);
    }

    #[test]
    fn delta_is_antisymmetric() {
        let (matrix, index) = fixture();
        let scorer = AdvantageScorer::new(&matrix, &index);
        let d1 = scorer.delta(&["A", "B"], &["C", "D"]).unwrap();
        let d2 = scorer.delta(&["C", "D"], &["A", "B"]).unwrap();
        assert!((d1 + d2).abs() < 1e-9);
        // C: 50 + (-10) + 10 ; D: 50 + 0 + 0 → 100 ; A+B → 100
        assert!(d1.abs() < 1e-9);
    }

    #[test]
    fn unresolved_hero_fails_whole_score() {
        let (matrix, index) = fixture();
        let scorer = AdvantageScorer::new(&matrix, &index);
        assert!(matches!(
            scorer.delta(&["A", "Zed"], &["C", "D"]),
            Err(HeroError::UnresolvedHero { .. })
        ));
    }

    fn evaluation(delta_favored: Option<Side>, market_favorite: Option<Side>) -> MatchEvaluation {
        let score = TeamScore {
            total: 0.0,
            positive_count: 0,
            negative_count: 0,
        };
        MatchEvaluation {
            match_id: 1,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            series_id: 0,
            map_number: 1,
            championship: None,
            team1: "X".to_string(),
            team2: "Y".to_string(),
            winner: Side::Team1,
            odds: MarketOdds::new(dec!(1.5), dec!(2.6)).unwrap(),
            team1_score: score,
            team2_score: score,
            delta: 0.0,
            delta_favored,
            market_favorite,
        }
    }

    #[test]
    fn delta_favored_and_market_favorite_are_independent() {
        let e = evaluation(Some(Side::Team2), Some(Side::Team1));
        assert!(e.favored_is_market_underdog());
        assert!(!e.favored_is_market_favorite());
        assert_eq!(e.favored_odds(), Some(dec!(2.6)));
        assert_eq!(e.opponent_odds(), Some(dec!(1.5)));
        assert!(!e.favored_won());

        let aligned = evaluation(Some(Side::Team1), Some(Side::Team1));
        assert!(aligned.favored_is_market_favorite());
        assert!(aligned.favored_won());
    }

    #[test]
    fn even_odds_are_neither_favorite_nor_underdog() {
        let e = evaluation(Some(Side::Team1), None);
        assert!(!e.favored_is_market_favorite());
        assert!(!e.favored_is_market_underdog());
    }

    #[test]
    fn evaluate_reports_skip_reasons() {
        let (matrix, _) = fixture();
        let names: Vec<String> = (0..10).map(|i| format!("H{i}")).collect();
        let index = HeroIndex::build(&names);
        let scorer = AdvantageScorer::new(&matrix, &index);
        let draft = |odds: Option<Decimal>, last: &str| MatchDraft {
            match_id: 3,
            team1: "X".to_string(),
            team2: "Y".to_string(),
            team1_heroes: names[..5].to_vec(),
            team2_heroes: names[5..9].iter().cloned().chain([last.to_string()]).collect(),
            winner: "X".to_string(),
            team1_odds: odds,
            team2_odds: Some(dec!(2.0)),
            ..MatchDraft::default()
        };

        let bad_odds = MatchRecord::try_from(draft(Some(dec!(0.9)), "H9")).unwrap();
        assert_eq!(
            scorer.evaluate(&bad_odds).unwrap_err().reason(),
            SkipReason::InvalidOdds
        );

        let unknown = MatchRecord::try_from(draft(Some(dec!(1.9)), "Nobody")).unwrap();
        assert_eq!(
            scorer.evaluate(&unknown).unwrap_err().reason(),
            SkipReason::UnresolvedHero
        );
    }
}
