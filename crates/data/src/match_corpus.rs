//! Match corpus CSV parsing.
//!
//! Expected columns (header names, extra columns ignored):
//! `date,championship,team1,team2,team1_heroes,team2_heroes,winner,team1_odds,team2_odds,series_id,map_number,match_id`
//!
//! Hero lists are pipe-delimited (`Axe|Lina|Lion|Sven|Tiny`) or a JSON array
//! string. Every row is either turned into a [`MatchRecord`] or counted under
//! a [`SkipReason`]; only I/O failures abort a read.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hero_edge_core::{MatchDraft, MatchRecord, SkipCounters, SkipReason};

/// One corpus row exactly as it appears in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMatchRow {
    #[serde(default)]
    pub date: String,
    #[serde(default, alias = "tournament")]
    pub championship: Option<String>,
    #[serde(default)]
    pub team1: String,
    #[serde(default)]
    pub team2: String,
    #[serde(default)]
    pub team1_heroes: String,
    #[serde(default)]
    pub team2_heroes: String,
    #[serde(default)]
    pub winner: String,
    #[serde(default)]
    pub team1_odds: Option<String>,
    #[serde(default)]
    pub team2_odds: Option<String>,
    #[serde(default)]
    pub series_id: Option<String>,
    #[serde(default)]
    pub map_number: Option<String>,
    #[serde(default, alias = "hawk_match_id")]
    pub match_id: Option<String>,
}

impl RawMatchRow {
    /// Validates the row into a typed record.
    ///
    /// # Errors
    /// [`SkipReason::MalformedRecord`] for unparsable dates/ids, wrong hero
    /// counts, or an unknown winner. Odds problems are not detected here;
    /// see [`MatchRecord::market_odds`].
    pub fn into_record(self) -> Result<MatchRecord, SkipReason> {
        let draft = MatchDraft {
            match_id: parse_id(self.match_id.as_deref())?,
            timestamp: parse_timestamp(&self.date)?,
            championship: self.championship,
            team1: self.team1,
            team2: self.team2,
            team1_heroes: split_heroes(&self.team1_heroes)?,
            team2_heroes: split_heroes(&self.team2_heroes)?,
            winner: self.winner,
            team1_odds: parse_odds(self.team1_odds.as_deref()),
            team2_odds: parse_odds(self.team2_odds.as_deref()),
            series_id: parse_id(self.series_id.as_deref())?,
            map_number: u32::try_from(parse_id(self.map_number.as_deref())?)
                .map_err(|_| SkipReason::MalformedRecord)?,
        };
        MatchRecord::try_from(draft)
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and RFC 3339.
///
/// # Errors
/// [`SkipReason::MalformedRecord`] if no format matches.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, SkipReason> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .ok_or(SkipReason::MalformedRecord);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .map_err(|_| SkipReason::MalformedRecord)
}

/// Blank means 0; anything else must be a non-negative integer.
fn parse_id(raw: Option<&str>) -> Result<u64, SkipReason> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(s) => s.parse().map_err(|_| SkipReason::MalformedRecord),
    }
}

/// Unparsable odds become `None` and are reported as invalid odds later.
fn parse_odds(raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Splits a pipe-delimited list or parses a JSON array of names.
///
/// # Errors
/// [`SkipReason::MalformedRecord`] for an unparsable JSON array.
pub fn split_heroes(raw: &str) -> Result<Vec<String>, SkipReason> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw).map_err(|_| SkipReason::MalformedRecord);
    }
    Ok(raw
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// Streaming reader over a corpus CSV.
pub struct CorpusReader<R: Read> {
    reader: csv::Reader<R>,
    rows_read: u64,
}

impl CorpusReader<File> {
    /// Opens a corpus file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open match corpus: {}", path.display()))?;
        Ok(Self {
            reader,
            rows_read: 0,
        })
    }
}

impl<R: Read> CorpusReader<R> {
    pub fn from_reader(inner: R) -> Self {
        Self {
            reader: csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(inner),
            rows_read: 0,
        }
    }

    #[must_use]
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Feeds every valid record to `sink`, tallying skips in `skips`.
    ///
    /// Only the current row is held in memory.
    ///
    /// # Errors
    /// Returns an error on I/O failure; bad rows are skipped, not fatal.
    pub fn for_each_record<F>(&mut self, skips: &mut SkipCounters, mut sink: F) -> Result<u64>
    where
        F: FnMut(MatchRecord),
    {
        let mut delivered = 0;
        for row in self.reader.deserialize::<RawMatchRow>() {
            self.rows_read += 1;
            let parsed = match row {
                Ok(raw) => raw.into_record(),
                Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(err).context("I/O error while reading match corpus");
                }
                Err(err) => {
                    debug!(row = self.rows_read, error = %err, "Unreadable corpus row");
                    Err(SkipReason::MalformedRecord)
                }
            };
            match parsed {
                Ok(record) => {
                    delivered += 1;
                    sink(record);
                }
                Err(reason) => {
                    debug!(row = self.rows_read, reason = reason.label(), "Skipping corpus row");
                    skips.record(reason);
                }
            }
        }
        Ok(delivered)
    }
}

/// Reads a whole corpus into memory.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<(Vec<MatchRecord>, SkipCounters)> {
    let path = path.as_ref();
    let mut reader = CorpusReader::open(path)?;
    let mut skips = SkipCounters::new();
    let mut records = Vec::new();
    reader.for_each_record(&mut skips, |r| records.push(r))?;

    info!(
        path = %path.display(),
        rows = reader.rows_read(),
        records = records.len(),
        "Loaded match corpus"
    );
    if !skips.is_clean() {
        warn!(%skips, "Corpus rows skipped");
    }
    Ok((records, skips))
}

/// Match count for one championship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChampionshipCount {
    pub championship: String,
    pub matches: u64,
}

/// Label used for records without a championship.
pub const UNKNOWN_CHAMPIONSHIP: &str = "Unknown";

/// Counts matches per championship, most frequent first (ties by name).
#[must_use]
pub fn championship_counts<'a, I>(records: I) -> Vec<ChampionshipCount>
where
    I: IntoIterator<Item = &'a MatchRecord>,
{
    let mut counts: HashMap<String, u64> = HashMap::new();
    for record in records {
        let name = record
            .championship
            .clone()
            .unwrap_or_else(|| UNKNOWN_CHAMPIONSHIP.to_string());
        *counts.entry(name).or_default() += 1;
    }
    let mut rows: Vec<ChampionshipCount> = counts
        .into_iter()
        .map(|(championship, matches)| ChampionshipCount {
            championship,
            matches,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.matches
            .cmp(&a.matches)
            .then_with(|| a.championship.cmp(&b.championship))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use hero_edge_core::Side;
    use rust_decimal_macros::dec;

    const HEADER: &str = "date,championship,team1,team2,team1_heroes,team2_heroes,winner,team1_odds,team2_odds,series_id,map_number,match_id\n";

    fn read(body: &str) -> (Vec<MatchRecord>, SkipCounters) {
        let data = format!("{HEADER}{body}");
        let mut reader = CorpusReader::from_reader(data.as_bytes());
        let mut skips = SkipCounters::new();
        let mut records = Vec::new();
        reader
            .for_each_record(&mut skips, |r| records.push(r))
            .unwrap();
        (records, skips)
    }

    #[test]
    fn parses_pipe_delimited_row() {
        let (records, skips) = read(
            "2024-02-10,TI,Spirit,Liquid,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,Liquid,1.85,1.95,100,2,555\n",
        );
        assert!(skips.is_clean());
        let r = &records[0];
        assert_eq!(r.match_id, 555);
        assert_eq!(r.series_id, 100);
        assert_eq!(r.map_number, 2);
        assert_eq!(r.winner, Side::Team2);
        assert_eq!(r.team1_odds, Some(dec!(1.85)));
        assert_eq!(r.championship.as_deref(), Some("TI"));
        assert_eq!(r.team2_heroes[4], "Viper");
    }

    #[test]
    fn parses_json_array_heroes() {
        let (records, skips) = read(
            "2024-02-10,,A,B,\"[\"\"Axe\"\",\"\"Lina\"\",\"\"Lion\"\",\"\"Sven\"\",\"\"Tiny\"\"]\",Pudge|Zeus|Mirana|Ursa|Viper,A,1.5,2.5,,,\n",
        );
        assert!(skips.is_clean());
        assert_eq!(records[0].team1_heroes[0], "Axe");
        assert_eq!(records[0].championship, None);
        assert_eq!(records[0].match_id, 0);
    }

    #[test]
    fn four_heroes_is_malformed_not_four_v_five() {
        let (records, skips) = read(
            "2024-02-10,TI,A,B,Axe|Lina|Lion|Sven,Pudge|Zeus|Mirana|Ursa|Viper,A,1.5,2.5,1,1,1\n",
        );
        assert!(records.is_empty());
        assert_eq!(skips.malformed_record, 1);
    }

    #[test]
    fn bad_date_and_winner_are_malformed() {
        let (records, skips) = read(concat!(
            "10/02/2024,TI,A,B,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,A,1.5,2.5,1,1,1\n",
            "2024-02-10,TI,A,B,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,C,1.5,2.5,1,1,2\n",
            "2024-02-10,TI,A,B,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,A,1.5,2.5,x,1,3\n",
        ));
        assert!(records.is_empty());
        assert_eq!(skips.malformed_record, 3);
    }

    #[test]
    fn ragged_row_is_malformed() {
        let (records, skips) = read("2024-02-10,TI,A\n");
        assert!(records.is_empty());
        assert_eq!(skips.malformed_record, 1);
    }

    #[test]
    fn unparsable_odds_survive_parsing_as_none() {
        let (records, skips) = read(
            "2024-02-10,TI,A,B,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,A,NaN,2.5,1,1,1\n",
        );
        assert!(skips.is_clean());
        assert_eq!(records[0].team1_odds, None);
        assert_eq!(records[0].market_odds(), Err(SkipReason::InvalidOdds));
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-01-05").is_ok());
        assert!(parse_timestamp("2024-01-05 13:45:00").is_ok());
        assert!(parse_timestamp("2024-01-05T13:45:00").is_ok());
        assert!(parse_timestamp("2024-01-05T13:45:00Z").is_ok());
        assert_eq!(parse_timestamp("yesterday"), Err(SkipReason::MalformedRecord));
    }

    #[test]
    fn championship_counts_sorted_by_frequency() {
        let (records, _) = read(concat!(
            "2024-02-10,B Cup,A,B,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,A,1.5,2.5,1,1,1\n",
            "2024-02-11,A Cup,A,B,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,A,1.5,2.5,1,1,2\n",
            "2024-02-12,B Cup,A,B,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,A,1.5,2.5,1,1,3\n",
            "2024-02-13,,A,B,Axe|Lina|Lion|Sven|Tiny,Pudge|Zeus|Mirana|Ursa|Viper,A,1.5,2.5,1,1,4\n",
        ));
        let counts = championship_counts(&records);
        assert_eq!(counts[0].championship, "B Cup");
        assert_eq!(counts[0].matches, 2);
        assert_eq!(counts[1].championship, "A Cup");
        assert_eq!(counts[2].championship, UNKNOWN_CHAMPIONSHIP);
    }
}
