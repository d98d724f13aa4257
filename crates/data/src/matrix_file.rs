//! JSON persistence for [`MatchupMatrix`].
//!
//! ```json
//! {
//!   "heroes": ["Axe", "Lina"],
//!   "heroes_wr": ["52.10", "50.00"],
//!   "heroes_games": [120, 0],
//!   "secondary": { "gpm": [512.5, null] },
//!   "win_rates": [[null, ["4.1667", "54.1667", 24]], [["-4.1667", "45.8333", 24], null]],
//!   "update_time": "2024-06-01"
//! }
//! ```
//!
//! Numbers are accepted either as JSON numbers or as numeric strings.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use hero_edge_core::{
    HeroAggregate, HeroId, MatchupCell, MatchupMatrix, MatrixError, NO_DATA_WIN_RATE, TEAM_SIZE,
};

/// A number that may have been written as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => Some(*n),
            Numeric::Text(s) => s.trim().parse::<f64>().ok(),
        };
        value.filter(|v| v.is_finite())
    }
}

/// `[advantage, win_rate, games]` of one populated cell.
pub type CellTriple = (Numeric, Numeric, Numeric);

/// On-disk layout of a matchup matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixFile {
    pub heroes: Vec<String>,
    pub heroes_wr: Vec<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heroes_games: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secondary: BTreeMap<String, Vec<Option<f64>>>,
    pub win_rates: Vec<Vec<Option<CellTriple>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl MatrixFile {
    #[must_use]
    pub fn from_matrix(matrix: &MatchupMatrix) -> Self {
        let heroes_wr = matrix
            .aggregates()
            .iter()
            .map(|a| Numeric::Text(format!("{:.2}", a.win_rate)))
            .collect();
        let heroes_games = matrix.aggregates().iter().map(|a| a.games).collect();
        let win_rates = (0..matrix.hero_count())
            .map(|i| {
                matrix
                    .row(HeroId(i))
                    .iter()
                    .map(|cell| {
                        cell.map(|c| {
                            (
                                Numeric::Text(format!("{:.4}", c.advantage)),
                                Numeric::Text(format!("{:.4}", c.win_rate)),
                                Numeric::Number(f64::from(c.games)),
                            )
                        })
                    })
                    .collect()
            })
            .collect();

        Self {
            heroes: matrix.heroes().to_vec(),
            heroes_wr,
            heroes_games: Some(heroes_games),
            secondary: matrix.secondary().clone(),
            win_rates,
            update_time: Some(Utc::now().date_naive().format("%Y-%m-%d").to_string()),
        }
    }

    /// Validates the layout and rebuilds the in-memory matrix.
    ///
    /// Files without `heroes_games` get per-hero game counts from their
    /// rows: every match adds one game against each of five opponents.
    ///
    /// # Errors
    /// Returns [`MatrixError`] for ragged arrays or unparsable cells.
    pub fn into_matrix(self) -> Result<MatchupMatrix, MatrixError> {
        let n = self.heroes.len();
        if self.heroes_wr.len() != n {
            return Err(MatrixError::AggregateLength {
                name: "heroes_wr".to_string(),
                len: self.heroes_wr.len(),
                heroes: n,
            });
        }
        if let Some(games) = &self.heroes_games {
            if games.len() != n {
                return Err(MatrixError::AggregateLength {
                    name: "heroes_games".to_string(),
                    len: games.len(),
                    heroes: n,
                });
            }
        }

        let mut rows = Vec::with_capacity(self.win_rates.len());
        for (r, raw_row) in self.win_rates.into_iter().enumerate() {
            let row = raw_row
                .into_iter()
                .enumerate()
                .map(|(c, raw)| raw.map(|t| parse_cell(r, c, &t)).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        let mut aggregates = Vec::with_capacity(n);
        for (i, wr) in self.heroes_wr.iter().enumerate() {
            let win_rate = wr.value().ok_or_else(|| MatrixError::MalformedCell {
                row: i,
                col: 0,
                detail: format!("hero win rate {wr:?} is not a number"),
            })?;
            let games = match &self.heroes_games {
                Some(games) => games[i],
                None => rows.get(i).map_or(0, |row| {
                    row.iter().flatten().map(|c| u64::from(c.games)).sum::<u64>()
                        / TEAM_SIZE as u64
                }),
            };
            // heroes without games may be stored as "0.00"
            let win_rate = if games == 0 { NO_DATA_WIN_RATE } else { win_rate };
            let wins = (games as f64 * win_rate / 100.0).round().max(0.0) as u64;
            aggregates.push(HeroAggregate {
                games,
                wins: wins.min(games),
                win_rate,
            });
        }

        MatchupMatrix::from_parts(self.heroes, aggregates, rows, self.secondary)
    }
}

fn parse_cell(row: usize, col: usize, triple: &CellTriple) -> Result<MatchupCell, MatrixError> {
    let malformed = |detail: &str| MatrixError::MalformedCell {
        row,
        col,
        detail: detail.to_string(),
    };
    let advantage = triple.0.value().ok_or_else(|| malformed("advantage is not a number"))?;
    let win_rate = triple.1.value().ok_or_else(|| malformed("win rate is not a number"))?;
    let games = triple
        .2
        .value()
        .filter(|g| *g >= 0.0 && g.fract() == 0.0 && *g <= f64::from(u32::MAX))
        .ok_or_else(|| malformed("games is not a non-negative integer"))?;
    MatchupCell::from_rates(games as u32, win_rate, advantage)
        .ok_or_else(|| malformed("populated cell has zero games"))
}

/// Loads a matrix file.
///
/// # Errors
/// Returns an error if the file cannot be read or does not describe a valid matrix.
pub fn load_matrix(path: impl AsRef<Path>) -> Result<MatchupMatrix> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open matrix file: {}", path.display()))?;
    let raw: MatrixFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse matrix file: {}", path.display()))?;
    let matrix = raw
        .into_matrix()
        .with_context(|| format!("Invalid matrix file: {}", path.display()))?;
    info!(
        path = %path.display(),
        heroes = matrix.hero_count(),
        cells = matrix.populated_cells(),
        "Loaded matchup matrix"
    );
    Ok(matrix)
}

/// Writes a matrix file, replacing any existing one.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn save_matrix(matrix: &MatchupMatrix, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create matrix file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &MatrixFile::from_matrix(matrix))
        .with_context(|| format!("Failed to write matrix file: {}", path.display()))?;
    writer.flush()?;
    info!(
        path = %path.display(),
        heroes = matrix.hero_count(),
        cells = matrix.populated_cells(),
        "Saved matchup matrix"
    );
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HeroListSource {
    List(Vec<String>),
    Matrix { heroes: Vec<String> },
}

/// Reads the canonical hero list from a JSON array or from an existing matrix file.
///
/// # Errors
/// Returns an error if the file is unreadable or holds neither shape.
pub fn load_hero_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open hero list: {}", path.display()))?;
    let source: HeroListSource = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Hero list must be a JSON array of names: {}", path.display()))?;
    Ok(match source {
        HeroListSource::List(heroes) | HeroListSource::Matrix { heroes } => heroes,
    })
}
