//! Game details records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{clamp_rating, humanize_slug, non_empty, GameSummary};

/// Player review shown on a game page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default, alias = "content")]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Everything a game page renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetails {
    pub slug: String,
    pub locale: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: String,
    pub embed_url: Option<String>,
    pub rating: f32,
    pub rating_count: u32,
    pub reviews: Vec<Review>,
    pub tags: Vec<String>,
}

impl GameDetails {
    /// Minimal page record built from a listing tile.
    ///
    /// Used when the details endpoint is down but the game is known locally.
    pub fn from_summary(summary: &GameSummary, locale: &str) -> Self {
        Self {
            slug: summary.slug.clone(),
            locale: locale.to_string(),
            name: summary.name.clone(),
            description: String::new(),
            image: summary.image.clone(),
            category: summary.category.clone(),
            embed_url: None,
            rating: summary.rating,
            rating_count: 0,
            reviews: Vec::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGameDetails {
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    #[serde(default, alias = "desc")]
    pub description: Option<String>,
    #[serde(default, alias = "thumbnail", alias = "cover")]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "game_url", alias = "iframe_url")]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub rating_count: Option<u32>,
    #[serde(default, alias = "comments")]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RawGameDetails {
    /// Maps the wire shape onto [`GameDetails`].
    ///
    /// A missing rating is derived from the reviews; review scores are
    /// clamped to 0..=5.
    pub fn normalize(self, slug: &str, locale: &str) -> GameDetails {
        let mut reviews = self.reviews;
        for review in &mut reviews {
            review.rating = review.rating.min(5);
        }

        let rating = match self.rating {
            Some(rating) => clamp_rating(rating),
            None if !reviews.is_empty() => {
                let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
                clamp_rating(total as f32 / reviews.len() as f32)
            }
            None => 0.0,
        };

        GameDetails {
            slug: slug.to_string(),
            locale: locale.to_string(),
            name: non_empty(self.name).unwrap_or_else(|| humanize_slug(slug)),
            description: non_empty(self.description).unwrap_or_default(),
            image: non_empty(self.image).unwrap_or_default(),
            category: non_empty(self.category).unwrap_or_default(),
            embed_url: non_empty(self.embed_url),
            rating,
            rating_count: self.rating_count.unwrap_or(reviews.len() as u32),
            reviews,
            tags: self.tags,
        }
    }
}
