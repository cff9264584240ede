//! Keyword and category filtering over a catalog.
//!
//! Matching is case-insensitive substring search over `jp`, `en` and
//! `keywords`, with hiragana and katakana treated as equivalent on `jp`.
//! A multi-word query matches only entries that match every word.

use serde::{Deserialize, Serialize};

use crate::phrase::{ALL_CATEGORIES, Catalog, PhraseEntry};

const HIRAGANA_START: u32 = 0x3041;
const HIRAGANA_END: u32 = 0x3096;
const KATAKANA_OFFSET: u32 = 0x60;

/// How a search query composes with the active category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// A non-empty query searches every category.
    #[default]
    Global,
    /// A non-empty query only searches the active category.
    WithinCategory,
}

/// Viewport class of the client, which decides the initial page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Viewport {
    Narrow,
    #[default]
    Wide,
}

/// Map hiragana code points (U+3041..=U+3096) to their katakana equivalents.
///
/// Every other character is passed through unchanged.
pub fn to_katakana(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            let code = c as u32;
            if (HIRAGANA_START..=HIRAGANA_END).contains(&code) {
                char::from_u32(code + KATAKANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// A parsed search query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    words: Vec<String>,
    kana_words: Vec<String>,
}

impl SearchTerms {
    /// Lowercase, trim and split a raw query on whitespace.
    pub fn parse(query: &str) -> Self {
        let words: Vec<String> = query.to_lowercase().split_whitespace().map(str::to_string).collect();
        let kana_words = words.iter().map(|w| to_katakana(w)).collect();
        Self { words, kana_words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Whether every word matches the entry.
    pub fn matches(&self, entry: &PhraseEntry) -> bool {
        let jp = entry.jp.to_lowercase();
        let en = entry.en.to_lowercase();
        let keywords = entry.keywords.as_deref().map(str::to_lowercase);
        let kana_jp = to_katakana(&jp);

        self.words.iter().zip(&self.kana_words).all(|(word, kana_word)| {
            jp.contains(word.as_str())
                || en.contains(word.as_str())
                || keywords.as_deref().is_some_and(|k| k.contains(word.as_str()))
                || kana_jp.contains(kana_word.as_str())
        })
    }
}

fn in_category(entry: &PhraseEntry, category: &str) -> bool {
    category == ALL_CATEGORIES || entry.tag == category
}

impl Catalog {
    /// Filter the catalog by query and category.
    ///
    /// With an empty query the result is the catalog order restricted to the
    /// category. With a non-empty query the result is every match, sorted by
    /// English text; the category only applies under
    /// [`SearchScope::WithinCategory`].
    pub fn filter(&self, query: &str, category: &str, scope: SearchScope) -> Vec<&PhraseEntry> {
        let terms = SearchTerms::parse(query);

        if terms.is_empty() {
            return self.entries().iter().filter(|e| in_category(e, category)).collect();
        }

        let mut matches: Vec<&PhraseEntry> = self
            .entries()
            .iter()
            .filter(|e| scope == SearchScope::Global || in_category(e, category))
            .filter(|e| terms.matches(e))
            .collect();

        matches.sort_by_cached_key(|e| (e.en.to_lowercase(), e.en.clone()));
        matches
    }

    /// Suggestions for a query that matched nothing.
    ///
    /// Two sources, each capped at `per_source`: Japanese texts sharing the
    /// longest prefix with the query (kana-normalised), then keyword aliases
    /// containing any single query word. Duplicates are dropped.
    pub fn suggest(&self, query: &str, per_source: usize) -> Vec<String> {
        let terms = SearchTerms::parse(query);
        if terms.is_empty() || per_source == 0 {
            return Vec::new();
        }

        fn push(candidate: &str, suggestions: &mut Vec<String>) {
            if !suggestions.iter().any(|s| s == candidate) {
                suggestions.push(candidate.to_string());
            }
        }

        let mut suggestions: Vec<String> = Vec::new();

        let needle: Vec<char> = to_katakana(&terms.words().concat()).chars().collect();
        for len in (1..=needle.len()).rev() {
            let prefix: String = needle[..len].iter().collect();
            let hits: Vec<&str> = self
                .entries()
                .iter()
                .filter(|e| to_katakana(&e.jp.to_lowercase()).starts_with(&prefix))
                .map(|e| e.jp.as_str())
                .collect();
            if !hits.is_empty() {
                for jp in hits.into_iter().take(per_source) {
                    push(jp, &mut suggestions);
                }
                break;
            }
        }

        let before = suggestions.len();
        'entries: for entry in self.entries() {
            let Some(keywords) = entry.keywords.as_deref() else { continue };
            for alias in keywords.split([',', '、']).map(str::trim).filter(|a| !a.is_empty()) {
                let lower = alias.to_lowercase();
                if terms.words().iter().any(|w| lower.contains(w.as_str())) {
                    push(alias, &mut suggestions);
                    if suggestions.len() - before >= per_source {
                        break 'entries;
                    }
                }
            }
        }

        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::tests::{entry, featured};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scenario_catalog() -> Catalog {
        let lists = vec![
            ("hotel".to_string(), vec![entry("予約", "Reservation", "hotel")]),
            ("pay".to_string(), vec![featured("現金のみ", "Cash only", "pay")]),
        ];
        Catalog::from_categories(lists).unwrap()
    }

    fn sample_catalog() -> Catalog {
        let lists = vec![
            (
                "menu".to_string(),
                vec![
                    PhraseEntry { keywords: Some("water, みず, mizu".into()), ..entry("お水", "Water", "menu") },
                    entry("ラーメン", "Ramen", "menu"),
                    featured("おすすめ", "Recommended", "menu"),
                ],
            ),
            (
                "sign".to_string(),
                vec![entry("出口", "Exit", "sign"), entry("らーめん屋", "Ramen shop", "sign")],
            ),
            ("pay".to_string(), vec![featured("カードのみ", "Card only", "pay"), entry("現金", "Cash", "pay")]),
        ];
        Catalog::from_categories_with_rng(lists, &mut StdRng::seed_from_u64(1)).unwrap()
    }

    fn jps<'a>(entries: &[&'a PhraseEntry]) -> Vec<&'a str> {
        entries.iter().map(|e| e.jp.as_str()).collect()
    }

    #[test]
    fn test_to_katakana() {
        assert_eq!(to_katakana("らーめん"), "ラーメン");
        assert_eq!(to_katakana("ぁ"), "ァ");
        assert_eq!(to_katakana("ゖ"), "ヶ");
        assert_eq!(to_katakana("abc 漢字 カナ"), "abc 漢字 カナ");
    }

    #[test]
    fn test_to_katakana_covers_whole_hiragana_block() {
        for code in HIRAGANA_START..=HIRAGANA_END {
            let hiragana = char::from_u32(code).unwrap().to_string();
            let katakana = char::from_u32(code + KATAKANA_OFFSET).unwrap().to_string();
            assert_eq!(to_katakana(&hiragana), katakana);
        }
    }

    #[test]
    fn test_scenario_default_view_leads_with_featured() {
        let catalog = scenario_catalog();
        let result = catalog.filter("", ALL_CATEGORIES, SearchScope::Global);
        assert_eq!(result[0].en, "Cash only");
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_scenario_search_by_english() {
        let catalog = scenario_catalog();
        let result = catalog.filter("reservation", ALL_CATEGORIES, SearchScope::Global);
        assert_eq!(jps(&result), vec!["予約"]);
    }

    #[test]
    fn test_exact_text_finds_entry() {
        let catalog = sample_catalog();
        for e in catalog.entries() {
            assert!(catalog.filter(&e.jp, ALL_CATEGORIES, SearchScope::Global).contains(&e));
            assert!(catalog.filter(&e.en.to_uppercase(), ALL_CATEGORIES, SearchScope::Global).contains(&e));
        }
    }

    #[test]
    fn test_kana_equivalence_both_directions() {
        let catalog = sample_catalog();

        let katakana_query = catalog.filter("ラーメン", ALL_CATEGORIES, SearchScope::Global);
        assert_eq!(jps(&katakana_query), vec!["ラーメン", "らーめん屋"]);

        let hiragana_query = catalog.filter("らーめん", ALL_CATEGORIES, SearchScope::Global);
        assert_eq!(jps(&hiragana_query), vec!["ラーメン", "らーめん屋"]);
    }

    #[test]
    fn test_keywords_match() {
        let catalog = sample_catalog();
        let result = catalog.filter("mizu", ALL_CATEGORIES, SearchScope::Global);
        assert_eq!(jps(&result), vec!["お水"]);
    }

    #[test]
    fn test_every_word_must_match() {
        let catalog = sample_catalog();
        assert_eq!(jps(&catalog.filter("ramen shop", ALL_CATEGORIES, SearchScope::Global)), vec!["らーめん屋"]);
        assert!(catalog.filter("ramen water", ALL_CATEGORIES, SearchScope::Global).is_empty());
    }

    #[test]
    fn test_search_results_sorted_by_english() {
        let catalog = sample_catalog();
        let result = catalog.filter("only", ALL_CATEGORIES, SearchScope::Global);
        assert_eq!(jps(&result), vec!["カードのみ"]);

        let result = catalog.filter("a", ALL_CATEGORIES, SearchScope::Global);
        let ens: Vec<&str> = result.iter().map(|e| e.en.as_str()).collect();
        let mut sorted = ens.clone();
        sorted.sort_by_key(|s| s.to_lowercase());
        assert_eq!(ens, sorted);
    }

    #[test]
    fn test_category_exact_match_without_query() {
        let catalog = sample_catalog();
        for category in catalog.categories() {
            let result = catalog.filter("", category, SearchScope::Global);
            for e in catalog.entries() {
                assert_eq!(result.contains(&e), &e.tag == category);
            }
        }
    }

    #[test]
    fn test_global_scope_ignores_category() {
        let catalog = sample_catalog();
        let result = catalog.filter("ramen", "menu", SearchScope::Global);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_within_category_scope_combines_filters() {
        let catalog = sample_catalog();
        let result = catalog.filter("ramen", "sign", SearchScope::WithinCategory);
        assert_eq!(jps(&result), vec!["らーめん屋"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let catalog = sample_catalog();
        for query in ["", "ramen", "の"] {
            let first = catalog.filter(query, ALL_CATEGORIES, SearchScope::Global);
            let second = catalog.filter(query, ALL_CATEGORIES, SearchScope::Global);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_whitespace_only_query_is_default_view() {
        let catalog = sample_catalog();
        let result = catalog.filter("   ", ALL_CATEGORIES, SearchScope::Global);
        assert_eq!(result.len(), catalog.len());
        assert!(result[0].is_featured());
    }

    #[test]
    fn test_suggest_prefix_and_keywords() {
        let catalog = sample_catalog();

        let suggestions = catalog.suggest("ラーメンセット", 3);
        assert!(suggestions.contains(&"ラーメン".to_string()));
        assert!(suggestions.contains(&"らーめん屋".to_string()));

        let suggestions = catalog.suggest("mizu please", 3);
        assert_eq!(suggestions, vec!["mizu".to_string()]);
    }

    #[test]
    fn test_suggest_caps_and_dedups() {
        let catalog = sample_catalog();
        assert!(catalog.suggest("ラ", 1).len() <= 2);
        assert!(catalog.suggest("", 3).is_empty());
        assert!(catalog.suggest("ramen", 0).is_empty());
    }
}
