//! Hero reference data and name canonicalisation.
//!
//! Hero names arrive from several sources with inconsistent spelling
//! ("Nature's Prophet", "natures-prophet", "NATURES PROPHET"). Every name is
//! reduced to a normalized key (lowercase ASCII alphanumerics only) before
//! lookup, and each hero's integer id is its position in the reference list.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::HeroError;

/// Stable integer identity of a hero: its position in the reference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeroId(pub usize);

impl HeroId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable hero reference entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub id: HeroId,
    pub name: String,
    pub key: String,
}

/// Reduces a free-text hero name to its lookup key.
///
/// # Examples
/// ```
/// use hero_edge_core::hero::normalize;
///
/// assert_eq!(normalize("Nature's Prophet"), "naturesprophet");
/// assert_eq!(normalize("  Anti-Mage "), "antimage");
/// ```
#[must_use]
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Lookup table from normalized hero keys to hero ids.
#[derive(Debug, Clone, Default)]
pub struct HeroIndex {
    heroes: Vec<Hero>,
    by_key: HashMap<String, HeroId>,
}

impl HeroIndex {
    /// Builds the index from the reference hero list.
    ///
    /// Ids follow list order. When two names normalize to the same key the
    /// first one wins, so ids stay stable if a later duplicate is appended.
    #[must_use]
    pub fn build<S: AsRef<str>>(names: &[S]) -> Self {
        let mut heroes = Vec::with_capacity(names.len());
        let mut by_key = HashMap::with_capacity(names.len());

        for (idx, raw) in names.iter().enumerate() {
            let name = raw.as_ref().trim().to_string();
            let key = normalize(&name);
            let id = HeroId(idx);
            if key.is_empty() {
                warn!(index = idx, "Hero name normalizes to an empty key");
            } else if by_key.contains_key(&key) {
                warn!(name = %name, "Duplicate hero key, keeping first occurrence");
            } else {
                by_key.insert(key.clone(), id);
            }
            heroes.push(Hero { id, name, key });
        }

        Self { heroes, by_key }
    }

    /// Registers `alias` as an additional spelling of `canonical`.
    ///
    /// Returns `false` if the canonical name is unknown or the alias key is
    /// already taken; an alias never shadows an existing key.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> bool {
        let alias_key = normalize(alias);
        if alias_key.is_empty() || self.by_key.contains_key(&alias_key) {
            return false;
        }
        match self.by_key.get(&normalize(canonical)).copied() {
            Some(id) => {
                self.by_key.insert(alias_key, id);
                true
            }
            None => {
                warn!(alias, canonical, "Alias target is not a known hero");
                false
            }
        }
    }

    /// Builder-style variant of [`HeroIndex::add_alias`].
    #[must_use]
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        self.add_alias(alias, canonical);
        self
    }

    /// Resolves a free-text hero name to its id.
    ///
    /// # Errors
    /// Returns [`HeroError::UnresolvedHero`] when the normalized key is absent.
    pub fn resolve(&self, name: &str) -> Result<HeroId, HeroError> {
        self.by_key
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| HeroError::UnresolvedHero {
                name: name.trim().to_string(),
            })
    }

    /// Resolves a whole team; the first unresolved name fails the lot.
    ///
    /// # Errors
    /// Returns [`HeroError::UnresolvedHero`] naming the first unknown hero.
    pub fn resolve_team<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<HeroId>, HeroError> {
        names.iter().map(|n| self.resolve(n.as_ref())).collect()
    }

    #[must_use]
    pub fn get(&self, id: HeroId) -> Option<&Hero> {
        self.heroes.get(id.index())
    }

    #[must_use]
    pub fn heroes(&self) -> &[Hero] {
        &self.heroes
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.heroes.iter().map(|h| h.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}
