//! Typed match records.
//!
//! A [`MatchRecord`] is structurally valid by construction: exactly five
//! heroes per side, no hero picked twice, and a winner naming one of the two
//! teams. Odds are kept as parsed and validated separately via
//! [`MatchRecord::market_odds`], because a corpus used only for matrix
//! building does not need them.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SkipReason;
use crate::hero::normalize;

/// Heroes per team.
pub const TEAM_SIZE: usize = 5;

/// One of the two teams in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Team1,
    Team2,
}

impl Side {
    #[must_use]
    pub fn other(self) -> Side {
        match self {
            Side::Team1 => Side::Team2,
            Side::Team2 => Side::Team1,
        }
    }
}

/// Decimal odds for both sides, validated to be > 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOdds {
    pub team1: Decimal,
    pub team2: Decimal,
}

impl MarketOdds {
    /// # Errors
    /// Returns [`SkipReason::InvalidOdds`] unless both odds are strictly greater than 1.
    pub fn new(team1: Decimal, team2: Decimal) -> Result<Self, SkipReason> {
        if team1 <= Decimal::ONE || team2 <= Decimal::ONE {
            return Err(SkipReason::InvalidOdds);
        }
        Ok(Self { team1, team2 })
    }

    #[must_use]
    pub fn for_side(&self, side: Side) -> Decimal {
        match side {
            Side::Team1 => self.team1,
            Side::Team2 => self.team2,
        }
    }

    /// The side with strictly lower odds; `None` when the odds are equal.
    #[must_use]
    pub fn market_favorite(&self) -> Option<Side> {
        if self.team1 < self.team2 {
            Some(Side::Team1)
        } else if self.team2 < self.team1 {
            Some(Side::Team2)
        } else {
            None
        }
    }
}

/// Unvalidated match fields as they come off an input row.
#[derive(Debug, Clone, Default)]
pub struct MatchDraft {
    pub match_id: u64,
    pub timestamp: NaiveDateTime,
    pub championship: Option<String>,
    pub team1: String,
    pub team2: String,
    pub team1_heroes: Vec<String>,
    pub team2_heroes: Vec<String>,
    pub winner: String,
    pub team1_odds: Option<Decimal>,
    pub team2_odds: Option<Decimal>,
    pub series_id: u64,
    pub map_number: u32,
}

/// A structurally valid historical match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: u64,
    pub timestamp: NaiveDateTime,
    pub championship: Option<String>,
    pub team1: String,
    pub team2: String,
    pub team1_heroes: [String; TEAM_SIZE],
    pub team2_heroes: [String; TEAM_SIZE],
    pub winner: Side,
    pub team1_odds: Option<Decimal>,
    pub team2_odds: Option<Decimal>,
    pub series_id: u64,
    pub map_number: u32,
}

impl TryFrom<MatchDraft> for MatchRecord {
    type Error = SkipReason;

    fn try_from(draft: MatchDraft) -> Result<Self, Self::Error> {
        let team1 = draft.team1.trim().to_string();
        let team2 = draft.team2.trim().to_string();
        if team1.is_empty() || team2.is_empty() || team1 == team2 {
            return Err(SkipReason::MalformedRecord);
        }

        let winner = draft.winner.trim();
        let winner = if winner == team1 {
            Side::Team1
        } else if winner == team2 {
            Side::Team2
        } else {
            return Err(SkipReason::MalformedRecord);
        };

        let team1_heroes = into_team(draft.team1_heroes)?;
        let team2_heroes = into_team(draft.team2_heroes)?;

        let mut seen = HashSet::with_capacity(TEAM_SIZE * 2);
        for name in team1_heroes.iter().chain(team2_heroes.iter()) {
            if !seen.insert(normalize(name)) {
                return Err(SkipReason::MalformedRecord);
            }
        }

        Ok(Self {
            match_id: draft.match_id,
            timestamp: draft.timestamp,
            championship: draft
                .championship
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            team1,
            team2,
            team1_heroes,
            team2_heroes,
            winner,
            team1_odds: draft.team1_odds,
            team2_odds: draft.team2_odds,
            series_id: draft.series_id,
            map_number: draft.map_number,
        })
    }
}

fn into_team(names: Vec<String>) -> Result<[String; TEAM_SIZE], SkipReason> {
    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    names.try_into().map_err(|_| SkipReason::MalformedRecord)
}

impl MatchRecord {
    #[must_use]
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Team1 => &self.team1,
            Side::Team2 => &self.team2,
        }
    }

    #[must_use]
    pub fn heroes(&self, side: Side) -> &[String; TEAM_SIZE] {
        match side {
            Side::Team1 => &self.team1_heroes,
            Side::Team2 => &self.team2_heroes,
        }
    }

    #[must_use]
    pub fn winning_team(&self) -> &str {
        self.team(self.winner)
    }

    /// Validated odds for both sides.
    ///
    /// # Errors
    /// Returns [`SkipReason::InvalidOdds`] if either side is missing or <= 1.
    pub fn market_odds(&self) -> Result<MarketOdds, SkipReason> {
        match (self.team1_odds, self.team2_odds) {
            (Some(t1), Some(t2)) => MarketOdds::new(t1, t2),
            _ => Err(SkipReason::InvalidOdds),
        }
    }

    /// Chronological replay key: (timestamp, series, map, match id).
    #[must_use]
    pub fn sort_key(&self) -> (NaiveDateTime, u64, u32, u64) {
        (self.timestamp, self.series_id, self.map_number, self.match_id)
    }
}
