//! Domain records served by the stores
//!
//! Each submodule defines the record handed to consumers and the loose wire
//! shape the backend returns, plus the normalization between the two.

pub mod catalog;
pub mod details;
pub mod home;
pub mod seo;
pub mod user;

use serde::{Deserialize, Deserializer};

// Re-export commonly used types
pub use catalog::{GameSummary, RawCatalog, RawGame};
pub use details::{GameDetails, RawGameDetails, Review};
pub use home::{CategoryListing, HomePayload, RawHome};
pub use seo::{CategorySeo, RawCategorySeo, RawSiteMeta, SiteMeta};
pub use user::{HistoryItem, PlayRecord, RawUserProfile, UserComment, UserProfile, UserStats};

/// Turns `"space-invaders"` into `"Space Invaders"`.
pub fn humanize_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clamps a rating to the 0..=5 scale, mapping NaN to 0.
pub fn clamp_rating(rating: f32) -> f32 {
    if rating.is_nan() {
        0.0
    } else {
        rating.clamp(0.0, 5.0)
    }
}

/// Returns the trimmed string, or `None` when empty.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts ids sent either as numbers or strings.
pub(crate) fn flexible_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
