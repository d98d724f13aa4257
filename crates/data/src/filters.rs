use std::collections::HashSet;

use chrono::NaiveDate;

use hero_edge_core::{MatchRecord, SimulationConfig, SkipCounters};

/// Pre-simulation corpus restriction by date range and championship.
///
/// Bounds are inclusive calendar dates. A non-empty allow list admits only
/// the named championships (records without one are excluded); the deny
/// list always wins.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    allow: HashSet<String>,
    deny: HashSet<String>,
}

impl MatchFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            date_from: config.date_from,
            date_to: config.date_to,
            allow: config.championship_allow.iter().cloned().collect(),
            deny: config.championship_deny.iter().cloned().collect(),
        }
    }

    #[must_use]
    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    #[must_use]
    pub fn allow(mut self, championship: impl Into<String>) -> Self {
        self.allow.insert(championship.into());
        self
    }

    #[must_use]
    pub fn deny(mut self, championship: impl Into<String>) -> Self {
        self.deny.insert(championship.into());
        self
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.date_from.is_none() && self.date_to.is_none() && self.allow.is_empty() && self.deny.is_empty()
    }

    #[must_use]
    pub fn matches(&self, record: &MatchRecord) -> bool {
        let date = record.timestamp.date();
        if self.date_from.is_some_and(|from| date < from) || self.date_to.is_some_and(|to| date > to) {
            return false;
        }
        match record.championship.as_deref() {
            Some(name) if self.deny.contains(name) => false,
            Some(name) => self.allow.is_empty() || self.allow.contains(name),
            None => self.allow.is_empty(),
        }
    }

    /// Drops non-matching records in place, counting each under `filtered`.
    pub fn apply(&self, records: &mut Vec<MatchRecord>, skips: &mut SkipCounters) {
        if self.is_noop() {
            return;
        }
        records.retain(|r| {
            let keep = self.matches(r);
            if !keep {
                skips.record_filtered();
            }
            keep
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hero_edge_core::MatchDraft;

    fn record(day: u32, championship: Option<&str>) -> MatchRecord {
        MatchRecord::try_from(MatchDraft {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(18, 30, 0)
                .unwrap(),
            championship: championship.map(str::to_string),
            team1: "A".into(),
            team2: "B".into(),
            team1_heroes: ["Axe", "Lina", "Lion", "Sven", "Tiny"].map(String::from).to_vec(),
            team2_heroes: ["Pudge", "Zeus", "Mirana", "Ursa", "Viper"].map(String::from).to_vec(),
            winner: "A".into(),
            ..MatchDraft::default()
        })
        .unwrap()
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let filter = MatchFilter::new().with_date_range(
            NaiveDate::from_ymd_opt(2024, 3, 5),
            NaiveDate::from_ymd_opt(2024, 3, 10),
        );
        assert!(!filter.matches(&record(4, None)));
        assert!(filter.matches(&record(5, None)));
        assert!(filter.matches(&record(10, None)));
        assert!(!filter.matches(&record(11, None)));
    }

    #[test]
    fn deny_beats_allow() {
        let filter = MatchFilter::new().allow("TI").allow("Major").deny("Major");
        assert!(filter.matches(&record(1, Some("TI"))));
        assert!(!filter.matches(&record(1, Some("Major"))));
        assert!(!filter.matches(&record(1, Some("Qualifier"))));
        assert!(!filter.matches(&record(1, None)));
    }

    #[test]
    fn apply_counts_filtered_records() {
        let mut records = vec![record(1, Some("TI")), record(2, Some("Qualifier")), record(3, None)];
        let mut skips = SkipCounters::new();
        MatchFilter::new().deny("Qualifier").apply(&mut records, &mut skips);
        assert_eq!(records.len(), 2);
        assert_eq!(skips.filtered, 1);
        assert_eq!(skips.total_skipped(), 0);
    }
}
