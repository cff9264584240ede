//! Phrase entries and the in-memory catalog.
//!
//! A catalog is assembled once per load from the category data files and is
//! never mutated afterwards; reloading builds a new one.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Pseudo-category selecting every entry.
pub const ALL_CATEGORIES: &str = "All";

/// One translatable phrase, as stored in `data/<category>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PhraseEntry {
    /// Japanese source text.
    pub jp: String,
    /// English translation.
    pub en: String,
    /// Optional usage note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Category key, one of the loaded category ids.
    pub tag: String,
    /// Free-text search aliases (synonyms, katakana/romaji hints).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Featured entries lead the unfiltered view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    /// Reviewed by a native speaker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl PhraseEntry {
    pub fn is_featured(&self) -> bool {
        self.featured.unwrap_or(false)
    }
}

/// The full phrase collection of one session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<PhraseEntry>,
    categories: Vec<String>,
}

impl Catalog {
    /// Build a catalog from per-category entry lists, shuffling with the thread RNG.
    ///
    /// # Errors
    ///
    /// Returns `Error::LoadFailed` if an entry has empty `jp`/`en` text or a
    /// tag that is not one of the given categories.
    pub fn from_categories(lists: Vec<(String, Vec<PhraseEntry>)>) -> Result<Self, Error> {
        Self::from_categories_with_rng(lists, &mut rand::thread_rng())
    }

    /// Build a catalog with an explicit RNG for the non-featured shuffle.
    ///
    /// The resulting order is every featured entry in load order, followed
    /// by a uniform permutation of the rest.
    pub fn from_categories_with_rng<R: Rng + ?Sized>(
        lists: Vec<(String, Vec<PhraseEntry>)>, rng: &mut R,
    ) -> Result<Self, Error> {
        let categories: Vec<String> = lists.iter().map(|(category, _)| category.clone()).collect();

        let mut featured = Vec::new();
        let mut rest = Vec::new();
        for (category, entries) in lists {
            for entry in entries {
                if entry.jp.trim().is_empty() || entry.en.trim().is_empty() {
                    return Err(Error::LoadFailed(format!("{category}: entry with empty jp or en text")));
                }
                if !categories.contains(&entry.tag) {
                    return Err(Error::LoadFailed(format!(
                        "{category}: entry {:?} has unknown tag {:?}",
                        entry.jp, entry.tag
                    )));
                }
                if entry.is_featured() { featured.push(entry) } else { rest.push(entry) }
            }
        }

        rest.shuffle(rng);
        featured.extend(rest);

        tracing::debug!(entries = featured.len(), categories = categories.len(), "catalog assembled");

        Ok(Self { entries: featured, categories })
    }

    /// Entries in display order (featured first, then shuffled).
    pub fn entries(&self) -> &[PhraseEntry] {
        &self.entries
    }

    /// Category ids in load order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `category` is "All" or one of the loaded ids.
    pub fn has_category(&self, category: &str) -> bool {
        category == ALL_CATEGORIES || self.categories.iter().any(|c| c == category)
    }

    /// Look up an entry by its Japanese text, the de-facto unique key.
    pub fn get(&self, jp: &str) -> Option<&PhraseEntry> {
        self.entries.iter().find(|e| e.jp == jp)
    }

    pub fn featured_count(&self) -> usize {
        self.entries.iter().take_while(|e| e.is_featured()).count()
    }

    /// Number of entries per category, in load order.
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        self.categories
            .iter()
            .map(|c| (c.clone(), self.entries.iter().filter(|e| &e.tag == c).count()))
            .collect()
    }
}
