//! Data loading and persistence for the hero matchup backtester.
//!
//! This crate provides:
//! - Streaming match corpus CSV reader with skip accounting
//! - Matchup matrix JSON load/save
//! - Date and championship corpus filters
//! - CSV writer for result tables

pub mod csv_storage;
pub mod filters;
pub mod match_corpus;
pub mod matrix_file;

pub use csv_storage::CsvStorage;
pub use filters::MatchFilter;
pub use match_corpus::{
    championship_counts, load_corpus, ChampionshipCount, CorpusReader, RawMatchRow,
};
pub use matrix_file::{load_hero_list, load_matrix, save_matrix, MatrixFile};
