use std::path::Path;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::config::SimulationConfig;

/// Default location of the simulation config file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Environment variable prefix, e.g. `HERO_EDGE_STARTING_BANKROLL=2500`.
pub const ENV_PREFIX: &str = "HERO_EDGE_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering built-in defaults, `config/Config.toml`
    /// (if present) and `HERO_EDGE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load() -> Result<SimulationConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Same as [`ConfigLoader::load`] with an explicit TOML path.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<SimulationConfig> {
        let path = path.as_ref();
        let figment = Figment::from(Serialized::defaults(SimulationConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::extract(&figment)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    fn extract(figment: &Figment) -> Result<SimulationConfig> {
        let mut config: SimulationConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}
