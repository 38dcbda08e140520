//! Local game dataset used to synthesize fallback records.

use std::fs;
use std::path::Path;

use crate::models::GameSummary;

const BUNDLED: &str = include_str!("../../data/static_games.json");

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    games: Vec<GameSummary>,
}

impl StaticCatalog {
    pub fn new(games: Vec<GameSummary>) -> Self {
        Self { games }
    }

    /// The dataset shipped with the crate.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED).unwrap_or_default()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(Self::from_json(&raw)?)
    }

    pub fn find(&self, slug: &str) -> Option<&GameSummary> {
        self.games.iter().find(|g| g.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
