//! Category SEO and site-wide metadata records.

use serde::{Deserialize, Deserializer, Serialize};

use super::non_empty;

/// Metadata for a category landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySeo {
    pub category: String,
    pub page_title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub h1: String,
}

impl CategorySeo {
    /// Default metadata derived from the category name alone.
    pub fn templated(category: &str, site_name: &str) -> Self {
        Self {
            category: category.to_string(),
            page_title: format!("{category} Games - Play Free Online {category} Games | {site_name}"),
            description: format!(
                "Play the best free {category} games online at {site_name}. No downloads, instant play."
            ),
            keywords: vec![
                format!("{} games", category.to_lowercase()),
                format!("free {} games", category.to_lowercase()),
                "online games".to_string(),
            ],
            h1: format!("{category} Games"),
        }
    }
}

fn keyword_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keywords {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Option::<Keywords>::deserialize(deserializer)? {
        Some(Keywords::List(list)) => list,
        Some(Keywords::Csv(csv)) => csv.split(',').map(|k| k.trim().to_string()).collect(),
        None => Vec::new(),
    }
    .into_iter()
    .filter(|k| !k.is_empty())
    .collect())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCategorySeo {
    #[serde(default, alias = "title")]
    pub page_title: Option<String>,
    #[serde(default, alias = "meta_description")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "keyword_list")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub h1: Option<String>,
}

impl RawCategorySeo {
    /// Fills every missing field from the template.
    pub fn normalize(self, category: &str, site_name: &str) -> CategorySeo {
        let template = CategorySeo::templated(category, site_name);
        CategorySeo {
            category: category.to_string(),
            page_title: non_empty(self.page_title).unwrap_or(template.page_title),
            description: non_empty(self.description).unwrap_or(template.description),
            keywords: if self.keywords.is_empty() {
                template.keywords
            } else {
                self.keywords
            },
            h1: non_empty(self.h1).unwrap_or(template.h1),
        }
    }
}

/// Site-wide metadata (title, description, social image).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMeta {
    pub site_name: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSiteMeta {
    #[serde(default, alias = "name")]
    pub site_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "keyword_list")]
    pub keywords: Vec<String>,
    #[serde(default, alias = "image")]
    pub og_image: Option<String>,
    #[serde(default, alias = "url")]
    pub canonical_url: Option<String>,
}

impl RawSiteMeta {
    pub fn normalize(self, default_site_name: &str) -> SiteMeta {
        let site_name = non_empty(self.site_name).unwrap_or_else(|| default_site_name.to_string());
        SiteMeta {
            title: non_empty(self.title).unwrap_or_else(|| site_name.clone()),
            description: non_empty(self.description).unwrap_or_default(),
            keywords: self.keywords,
            og_image: non_empty(self.og_image),
            canonical_url: non_empty(self.canonical_url),
            site_name,
        }
    }
}
