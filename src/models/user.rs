//! User profile, browsing history and play records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GameSummary, RawGame};

/// Most history items kept per profile.
pub const MAX_HISTORY_ITEMS: usize = 50;

/// A committed "visited this game page" record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub image: String,
    pub category: String,
    pub visited_at: DateTime<Utc>,
    pub visit_duration_seconds: u64,
}

impl HistoryItem {
    /// Builds a history record for `game` visited at `visited_at`.
    pub fn for_game(game: &GameSummary, visited_at: DateTime<Utc>, duration_seconds: u64) -> Self {
        Self {
            id: game.id.clone(),
            slug: game.slug.clone(),
            name: game.name.clone(),
            image: game.image.clone(),
            category: game.category.clone(),
            visited_at,
            visit_duration_seconds: duration_seconds,
        }
    }
}

/// A committed play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub slug: String,
    pub duration_seconds: u64,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub games_played: u64,
    #[serde(default)]
    pub total_play_seconds: u64,
    #[serde(default)]
    pub favorites_count: u64,
    #[serde(default)]
    pub comments_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserComment {
    pub game_slug: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub stats: UserStats,
    pub history: Vec<HistoryItem>,
    pub favorites: Vec<GameSummary>,
    pub comments: Vec<UserComment>,
}

impl UserProfile {
    /// Empty profile used before the first backend response.
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: String::new(),
            stats: UserStats::default(),
            history: Vec::new(),
            favorites: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn is_favorite(&self, slug: &str) -> bool {
        self.favorites.iter().any(|g| g.slug == slug)
    }

    /// Adds or removes `game` from favorites. Returns true when it is now a favorite.
    pub fn toggle_favorite(&mut self, game: &GameSummary) -> bool {
        let now_favorite = if self.is_favorite(&game.slug) {
            self.favorites.retain(|g| g.slug != game.slug);
            false
        } else {
            self.favorites.insert(0, game.clone());
            true
        };
        self.stats.favorites_count = self.favorites.len() as u64;
        now_favorite
    }

    /// Records a visit, replacing any earlier visit of the same game.
    pub fn push_history(&mut self, item: HistoryItem) {
        self.history.retain(|h| h.slug != item.slug);
        self.history.insert(0, item);
        self.history.truncate(MAX_HISTORY_ITEMS);
    }

    pub fn record_play(&mut self, record: &PlayRecord) {
        self.stats.games_played += 1;
        self.stats.total_play_seconds += record.duration_seconds;
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserProfile {
    #[serde(default, alias = "nickname", alias = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub stats: UserStats,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    #[serde(default)]
    pub favorites: Vec<RawGame>,
    #[serde(default)]
    pub comments: Vec<UserComment>,
}

impl RawUserProfile {
    /// Newest history first, one item per game, capped; counters derived from lists.
    pub fn normalize(self, user_id: &str) -> UserProfile {
        let mut history = self.history;
        history.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        let mut seen = std::collections::HashSet::new();
        history.retain(|item| seen.insert(item.slug.clone()));
        history.truncate(MAX_HISTORY_ITEMS);

        let favorites: Vec<GameSummary> = self
            .favorites
            .into_iter()
            .filter_map(|game| game.normalize(""))
            .collect();

        let mut stats = self.stats;
        stats.favorites_count = favorites.len() as u64;
        stats.comments_count = stats.comments_count.max(self.comments.len() as u64);

        UserProfile {
            user_id: user_id.to_string(),
            display_name: self.display_name.unwrap_or_default(),
            stats,
            history,
            favorites,
            comments: self.comments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn game(slug: &str) -> GameSummary {
        GameSummary {
            id: slug.into(),
            slug: slug.into(),
            name: slug.into(),
            image: String::new(),
            category: "Action".into(),
            rating: 0.0,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_toggle_favorite() {
        let mut profile = UserProfile::empty("u1");
        assert!(profile.toggle_favorite(&game("a")));
        assert!(profile.is_favorite("a"));
        assert_eq!(profile.stats.favorites_count, 1);

        assert!(!profile.toggle_favorite(&game("a")));
        assert!(!profile.is_favorite("a"));
        assert_eq!(profile.stats.favorites_count, 0);
    }

    #[test]
    fn test_push_history_dedupes_and_caps() {
        let mut profile = UserProfile::empty("u1");
        for i in 0..60 {
            profile.push_history(HistoryItem::for_game(&game(&format!("g{i}")), at(i), 30));
        }
        profile.push_history(HistoryItem::for_game(&game("g59"), at(100), 45));

        assert_eq!(profile.history.len(), MAX_HISTORY_ITEMS);
        assert_eq!(profile.history[0].visit_duration_seconds, 45);
        assert_eq!(profile.history.iter().filter(|h| h.slug == "g59").count(), 1);
    }

    #[test]
    fn test_normalize_sorts_and_dedupes_history() {
        let raw = RawUserProfile {
            history: vec![
                HistoryItem::for_game(&game("a"), at(1), 10),
                HistoryItem::for_game(&game("b"), at(3), 10),
                HistoryItem::for_game(&game("a"), at(2), 20),
            ],
            favorites: vec![
                RawGame {
                    slug: Some("a".into()),
                    ..Default::default()
                },
                RawGame::default(),
            ],
            ..Default::default()
        };
        let profile = raw.normalize("u1");

        let slugs: Vec<&str> = profile.history.iter().map(|h| h.slug.as_str()).collect();
        assert_eq!(slugs, vec!["b", "a"]);
        assert_eq!(profile.history[1].visit_duration_seconds, 20);
        assert_eq!(profile.stats.favorites_count, 1);
    }

    #[test]
    fn test_record_play() {
        let mut profile = UserProfile::empty("u1");
        profile.record_play(&PlayRecord {
            slug: "a".into(),
            duration_seconds: 10,
            played_at: at(0),
        });
        assert_eq!(profile.stats.games_played, 1);
        assert_eq!(profile.stats.total_play_seconds, 10);
    }
}
