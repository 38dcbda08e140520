//! Game catalog records.

use serde::{Deserialize, Serialize};

use super::{clamp_rating, flexible_id, humanize_slug, non_empty};

/// One game tile as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub rating: f32,
}

/// Game as returned by the listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGame {
    #[serde(default, deserialize_with = "flexible_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    #[serde(default, alias = "thumbnail", alias = "cover")]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}

impl RawGame {
    /// Maps the wire shape onto a [`GameSummary`].
    ///
    /// Games without a slug cannot be linked to and are dropped.
    pub fn normalize(self, default_category: &str) -> Option<GameSummary> {
        let slug = non_empty(self.slug)?;
        Some(GameSummary {
            id: non_empty(self.id).unwrap_or_else(|| slug.clone()),
            name: non_empty(self.name).unwrap_or_else(|| humanize_slug(&slug)),
            image: non_empty(self.image).unwrap_or_default(),
            category: non_empty(self.category).unwrap_or_else(|| default_category.to_string()),
            rating: clamp_rating(self.rating.unwrap_or(0.0)),
            slug,
        })
    }
}

/// Listing payload: either a bare array or a paged object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCatalog {
    List(Vec<RawGame>),
    Page {
        #[serde(alias = "list", alias = "items")]
        games: Vec<RawGame>,
    },
}

impl RawCatalog {
    pub fn normalize(self, category: &str) -> Vec<GameSummary> {
        let games = match self {
            RawCatalog::List(games) => games,
            RawCatalog::Page { games } => games,
        };
        games
            .into_iter()
            .filter_map(|game| game.normalize(category))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fills_defaults() {
        let raw: RawGame = serde_json::from_str(r#"{"id": 42, "slug": "moto-x3m", "rating": 9}"#).unwrap();
        let game = raw.normalize("Racing").unwrap();

        assert_eq!(game.id, "42");
        assert_eq!(game.name, "Moto X3m");
        assert_eq!(game.category, "Racing");
        assert_eq!(game.rating, 5.0);
    }

    #[test]
    fn test_normalize_drops_games_without_slug() {
        let raw: RawGame = serde_json::from_str(r#"{"title": "Nameless"}"#).unwrap();
        assert!(raw.normalize("Action").is_none());
    }

    #[test]
    fn test_catalog_accepts_both_shapes() {
        let list: RawCatalog = serde_json::from_str(r#"[{"slug": "a"}, {"title": "no slug"}]"#).unwrap();
        assert_eq!(list.normalize("Action").len(), 1);

        let page: RawCatalog =
            serde_json::from_str(r#"{"list": [{"slug": "a", "thumbnail": "/a.png"}], "total": 1}"#).unwrap();
        let games = page.normalize("Action");
        assert_eq!(games[0].image, "/a.png");
    }
}
