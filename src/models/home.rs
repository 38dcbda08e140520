//! Home page payload.

use serde::{Deserialize, Serialize};

use super::{GameSummary, RawGame};

/// A titled row of games on the home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryListing {
    pub category: String,
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomePayload {
    pub featured: Vec<GameSummary>,
    pub sections: Vec<CategoryListing>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSection {
    #[serde(default, alias = "name")]
    pub category: String,
    #[serde(default)]
    pub games: Vec<RawGame>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHome {
    #[serde(default, alias = "recommended")]
    pub featured: Vec<RawGame>,
    #[serde(default, alias = "categories")]
    pub sections: Vec<RawSection>,
}

impl RawHome {
    /// Normalizes every game and drops sections left empty.
    pub fn normalize(self) -> HomePayload {
        HomePayload {
            featured: self
                .featured
                .into_iter()
                .filter_map(|game| game.normalize(""))
                .collect(),
            sections: self
                .sections
                .into_iter()
                .filter(|section| !section.category.trim().is_empty())
                .map(|section| {
                    let games = section
                        .games
                        .into_iter()
                        .filter_map(|game| game.normalize(&section.category))
                        .collect();
                    CategoryListing {
                        category: section.category,
                        games,
                    }
                })
                .filter(|listing| !listing.games.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_normalization() {
        let raw: RawHome = serde_json::from_str(
            r#"{
                "recommended": [{"slug": "a"}],
                "categories": [
                    {"name": "Action", "games": [{"slug": "b"}]},
                    {"name": "Empty", "games": [{"title": "no slug"}]},
                    {"name": "", "games": [{"slug": "c"}]}
                ]
            }"#,
        )
        .unwrap();
        let home = raw.normalize();

        assert_eq!(home.featured.len(), 1);
        assert_eq!(home.sections.len(), 1);
        assert_eq!(home.sections[0].games[0].category, "Action");
    }
}
