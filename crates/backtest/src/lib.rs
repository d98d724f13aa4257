pub mod aggregator;
pub mod simulator;
pub mod staking;
pub mod strategy;
pub mod sweep;

pub use aggregator::{win_pct, BatchReport, ResultAggregator, StrategySummary};
pub use simulator::{
    prepare_matches, BankrollSimulator, BetOutcome, LedgerEntry, SimulationParams,
    SimulationPhase, SimulationResult, SimulationState,
};
pub use staking::{clip_stake, FibonacciLadder, StakeSizer};
pub use strategy::{
    generate_strategies, strategies_from_labels, HeroFilter, OddsCondition, StakingPolicy,
    StrategyConfig, StrategyError, StrategyFailure, StrategyRun,
};
pub use sweep::{run_batch, SweepRunner};
