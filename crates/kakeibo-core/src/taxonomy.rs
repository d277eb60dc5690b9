//! Category taxonomy and static shop-to-category rules
//!
//! Both tables are immutable for the lifetime of a run: constructed once
//! from config, validated up front, then only read. The resolver depends on
//! the taxonomy's ordering (option lists, default genres) and on the shop
//! map's insertion order (first-match-wins priority).

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::ResolvedCategory;

/// The universal fallback category id ("その他")
pub const OTHER_CATEGORY_ID: i64 = 199;

/// Finer classification level inside a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Coarse classification level imposed by the ledger system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Ordered; the first genre is the category's default
    pub genres: Vec<Genre>,
}

/// The full two-level classification taxonomy
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy, enforcing its invariants
    ///
    /// Category and genre ids must be globally unique, every category needs
    /// at least one genre (its default), and the fallback category
    /// [`OTHER_CATEGORY_ID`] must be present.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for category in &categories {
            if !seen.insert(category.id) {
                return Err(Error::Config(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
            if category.genres.is_empty() {
                return Err(Error::Config(format!(
                    "category {} ({}) has no genres",
                    category.id, category.name
                )));
            }
            for genre in &category.genres {
                if !seen.insert(genre.id) {
                    return Err(Error::Config(format!("duplicate genre id {}", genre.id)));
                }
            }
        }
        if !categories.iter().any(|c| c.id == OTHER_CATEGORY_ID) {
            return Err(Error::Config(format!(
                "fallback category {} is missing",
                OTHER_CATEGORY_ID
            )));
        }
        Ok(Self { categories })
    }

    /// All categories, in configured order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category by id
    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, category_id: i64) -> bool {
        self.category(category_id).is_some()
    }

    /// The default genre for a category (its first configured genre)
    pub fn default_genre(&self, category_id: i64) -> Option<i64> {
        self.category(category_id)
            .and_then(|c| c.genres.first())
            .map(|g| g.id)
    }

    /// The universal fallback pair ("その他" with its default genre)
    pub fn other(&self) -> ResolvedCategory {
        // The constructor guarantees the fallback category exists with a genre
        let genre_id = self.default_genre(OTHER_CATEGORY_ID).unwrap_or(0);
        ResolvedCategory {
            category_id: OTHER_CATEGORY_ID,
            genre_id,
        }
    }

    /// Every (genreId, "categoryName-genreName") pair, in configured order
    ///
    /// This is the closed option set enumerated in the classification prompt.
    pub fn genre_options(&self) -> Vec<(i64, String)> {
        self.categories
            .iter()
            .flat_map(|c| {
                c.genres
                    .iter()
                    .map(move |g| (g.id, format!("{}-{}", c.name, g.name)))
            })
            .collect()
    }
}

/// One static mapping rule: substring pattern to category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopRule {
    /// Literal substring matched against the shop name
    pub pattern: String,
    pub category_id: i64,
    /// Explicit genre; falls back to the category's default genre when unset
    #[serde(default)]
    pub genre_id: Option<i64>,
}

/// Ordered shop-to-category rules, tried before any gateway call
#[derive(Debug, Clone, Default)]
pub struct ShopCategoryMap {
    rules: Vec<ShopRule>,
}

impl ShopCategoryMap {
    pub fn new(rules: Vec<ShopRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ShopRule] {
        &self.rules
    }

    /// Reject rules that reference categories missing from the taxonomy
    ///
    /// Run at config load so a broken mapping is a visible configuration
    /// error rather than a silent default at resolve time.
    pub fn validate(&self, taxonomy: &Taxonomy) -> Result<()> {
        for rule in &self.rules {
            if !taxonomy.contains(rule.category_id) {
                return Err(Error::Config(format!(
                    "shop rule \"{}\" references unknown category {}",
                    rule.pattern, rule.category_id
                )));
            }
        }
        Ok(())
    }

    /// First-match-wins substring scan over the rules
    ///
    /// A rule whose category is not in the taxonomy is skipped (with a
    /// warning) so the scan can never hand out an invalid id.
    pub fn lookup(&self, taxonomy: &Taxonomy, shop: &str) -> Option<ResolvedCategory> {
        for rule in &self.rules {
            if !shop.contains(rule.pattern.as_str()) {
                continue;
            }
            if !taxonomy.contains(rule.category_id) {
                warn!(
                    pattern = %rule.pattern,
                    category_id = rule.category_id,
                    "shop rule references unknown category, skipping"
                );
                continue;
            }
            let genre_id = rule
                .genre_id
                .filter(|g| {
                    taxonomy
                        .category(rule.category_id)
                        .is_some_and(|c| c.genres.iter().any(|genre| genre.id == *g))
                })
                .or_else(|| taxonomy.default_genre(rule.category_id))?;
            return Some(ResolvedCategory {
                category_id: rule.category_id,
                genre_id,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_taxonomy() -> Taxonomy {
        Taxonomy::new(vec![
            Category {
                id: 101,
                name: "食費".into(),
                genres: vec![
                    Genre {
                        id: 10101,
                        name: "食料品".into(),
                    },
                    Genre {
                        id: 10102,
                        name: "外食".into(),
                    },
                ],
            },
            Category {
                id: 103,
                name: "交通".into(),
                genres: vec![Genre {
                    id: 10301,
                    name: "電車".into(),
                }],
            },
            Category {
                id: 111,
                name: "衣服・美容".into(),
                genres: vec![Genre {
                    id: 11101,
                    name: "衣服".into(),
                }],
            },
            Category {
                id: 199,
                name: "その他".into(),
                genres: vec![Genre {
                    id: 19901,
                    name: "未分類".into(),
                }],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_taxonomy_rejects_duplicate_ids() {
        let result = Taxonomy::new(vec![
            Category {
                id: 101,
                name: "a".into(),
                genres: vec![Genre {
                    id: 10101,
                    name: "g".into(),
                }],
            },
            Category {
                id: 101,
                name: "b".into(),
                genres: vec![Genre {
                    id: 10102,
                    name: "g".into(),
                }],
            },
        ]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_taxonomy_requires_fallback_category() {
        let result = Taxonomy::new(vec![Category {
            id: 101,
            name: "食費".into(),
            genres: vec![Genre {
                id: 10101,
                name: "食料品".into(),
            }],
        }]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_genre_is_first() {
        let taxonomy = sample_taxonomy();
        assert_eq!(taxonomy.default_genre(101), Some(10101));
        assert_eq!(taxonomy.default_genre(999), None);
    }

    #[test]
    fn test_other_pair() {
        let taxonomy = sample_taxonomy();
        assert_eq!(
            taxonomy.other(),
            ResolvedCategory {
                category_id: 199,
                genre_id: 19901
            }
        );
    }

    #[test]
    fn test_genre_options_order_and_format() {
        let taxonomy = sample_taxonomy();
        let options = taxonomy.genre_options();
        assert_eq!(options[0], (10101, "食費-食料品".to_string()));
        assert_eq!(options[1], (10102, "食費-外食".to_string()));
        assert_eq!(options.last().unwrap().1, "その他-未分類");
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let taxonomy = sample_taxonomy();
        let map = ShopCategoryMap::new(vec![
            ShopRule {
                pattern: "ユニクロ".into(),
                category_id: 111,
                genre_id: None,
            },
            ShopRule {
                pattern: "クロ".into(),
                category_id: 101,
                genre_id: None,
            },
        ]);
        // Both patterns are substrings; the earlier rule wins
        let hit = map.lookup(&taxonomy, "ユニクロ 渋谷店").unwrap();
        assert_eq!(hit.category_id, 111);
        assert_eq!(hit.genre_id, 11101);
    }

    #[test]
    fn test_lookup_explicit_genre() {
        let taxonomy = sample_taxonomy();
        let map = ShopCategoryMap::new(vec![ShopRule {
            pattern: "レストラン".into(),
            category_id: 101,
            genre_id: Some(10102),
        }]);
        let hit = map.lookup(&taxonomy, "レストラン花").unwrap();
        assert_eq!(hit.genre_id, 10102);
    }

    #[test]
    fn test_lookup_skips_invalid_rule() {
        let taxonomy = sample_taxonomy();
        // Hand-built map bypassing validate(): the scan must step over the
        // broken rule and keep scanning
        let map = ShopCategoryMap::new(vec![
            ShopRule {
                pattern: "ローソン".into(),
                category_id: 555,
                genre_id: None,
            },
            ShopRule {
                pattern: "ローソン".into(),
                category_id: 101,
                genre_id: None,
            },
        ]);
        let hit = map.lookup(&taxonomy, "ローソン新宿").unwrap();
        assert_eq!(hit.category_id, 101);
    }

    #[test]
    fn test_lookup_miss() {
        let taxonomy = sample_taxonomy();
        let map = ShopCategoryMap::new(vec![ShopRule {
            pattern: "ユニクロ".into(),
            category_id: 111,
            genre_id: None,
        }]);
        assert!(map.lookup(&taxonomy, "謎の店").is_none());
    }

    #[test]
    fn test_validate_rejects_unknown_category() {
        let taxonomy = sample_taxonomy();
        let map = ShopCategoryMap::new(vec![ShopRule {
            pattern: "x".into(),
            category_id: 555,
            genre_id: None,
        }]);
        assert!(matches!(map.validate(&taxonomy), Err(Error::Config(_))));
    }
}
