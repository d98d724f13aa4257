pub mod advantage;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod hero;
pub mod matchup;
pub mod matrix;

pub use advantage::{AdvantageScorer, EvaluationError, MatchEvaluation, TeamScore};
pub use config::{ConfigError, SimulationConfig, StrategyLabel, DEFAULT_THRESHOLDS};
pub use config_loader::ConfigLoader;
pub use error::{HeroError, MatrixError, SkipCounters, SkipReason};
pub use hero::{normalize, Hero, HeroId, HeroIndex};
pub use matchup::{MarketOdds, MatchDraft, MatchRecord, Side, TEAM_SIZE};
pub use matrix::{
    HeroAggregate, MatchupCell, MatchupMatrix, MatrixBuilder, MergeStats, NO_DATA_WIN_RATE,
};
