//! Session state of one phrasebook client.
//!
//! [`AppState`] owns the catalog, the active category and query, the page
//! size counter and the selection set. Callers describe what happened as an
//! [`Action`] and read back a [`View`]; nothing else mutates the state.

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::config::AppConfig;
use crate::export::PrintPage;
use crate::phrase::{ALL_CATEGORIES, Catalog, PhraseEntry};
use crate::search::SearchScope;

/// User-visible messages.
pub mod messages {
    pub const LOADING: &str = "データを読み込み中...";
    pub const LOAD_FAILED: &str = "エラー: データを読み込めませんでした。";
    pub const NO_MATCH_IN_CATEGORY: &str = "該当するフレーズが見つかりません。";
    pub const TRY_ANOTHER_KEYWORD: &str = "別のキーワードをお試しください。";

    pub fn no_match_for(term: &str) -> String {
        format!("「{term}」に一致するフレーズが見つかりません。")
    }
}

/// Position in a monotonic sequence of issued requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues tickets and remembers the latest one, so results of superseded
/// requests can be discarded.
#[derive(Debug, Default, Clone)]
pub struct Sequence {
    latest: u64,
}

impl Sequence {
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        Ticket(self.latest)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}

/// Incremental page size of the unfiltered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    initial: usize,
    increment: usize,
    visible: usize,
}

impl Pager {
    pub fn new(initial: usize, increment: usize) -> Self {
        Self { initial, increment, visible: initial }
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn grow(&mut self) {
        self.visible = self.visible.saturating_add(self.increment);
    }

    pub fn reset(&mut self) {
        self.visible = self.initial;
    }
}

/// Cards checked for a batch export, keyed by Japanese text, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    items: Vec<PrintPage>,
}

impl SelectionSet {
    pub fn contains(&self, jp: &str) -> bool {
        self.items.iter().any(|p| p.jp == jp)
    }

    /// Add the entry if absent, remove it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, entry: &PhraseEntry) -> bool {
        if let Some(pos) = self.items.iter().position(|p| p.jp == entry.jp) {
            self.items.remove(pos);
            false
        } else {
            self.items.push(PrintPage::from(entry));
            true
        }
    }

    pub fn set(&mut self, entry: &PhraseEntry, selected: bool) {
        if selected != self.contains(&entry.jp) {
            self.toggle(entry);
        }
    }

    pub fn pages(&self) -> &[PrintPage] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop the given pages, leaving any checked since untouched.
    pub fn remove_pages(&mut self, pages: &[PrintPage]) {
        self.items.retain(|item| !pages.iter().any(|p| p.jp == item.jp));
    }
}

/// What a card offers. Every card offers every action; the list exists so
/// presentation code does not hard-code it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CardAction {
    Fullscreen,
    Copy,
    Print,
    SaveImage,
    Report,
    Select,
}

impl CardAction {
    pub const ALL: [CardAction; 6] = [
        CardAction::Fullscreen,
        CardAction::Copy,
        CardAction::Print,
        CardAction::SaveImage,
        CardAction::Report,
        CardAction::Select,
    ];
}

/// View model of one phrase card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Card {
    pub jp: String,
    pub en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub tag: String,
    pub featured: bool,
    pub selected: bool,
    pub actions: Vec<CardAction>,
}

impl Card {
    fn new(entry: &PhraseEntry, selected: bool) -> Self {
        Self {
            jp: entry.jp.clone(),
            en: entry.en.clone(),
            context: entry.context.clone(),
            tag: entry.tag.clone(),
            featured: entry.is_featured(),
            selected,
            actions: CardAction::ALL.to_vec(),
        }
    }
}

/// What the grid region shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Loading {
        message: String,
    },
    Error {
        message: String,
        detail: String,
    },
    Empty {
        message: String,
        hint: String,
        suggestions: Vec<String>,
    },
    Cards {
        category: String,
        query: String,
        cards: Vec<Card>,
        total: usize,
        has_more: bool,
        selected: usize,
    },
}

/// A state transition requested by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// New contents of the search box.
    Search { query: String },
    /// A category button was pressed.
    SelectCategory { category: String },
    /// "Show more" at the end of the grid.
    ShowMore,
    /// A card's checkbox was toggled.
    ToggleSelection { jp: String },
    /// A card's checkbox was set explicitly.
    SetSelection { jp: String, selected: bool },
    /// Leave batch-select mode, dropping the selection.
    ExitSelectMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Explicit application state of one client session.
#[derive(Debug, Clone)]
pub struct AppState {
    catalog: Option<Catalog>,
    status: LoadStatus,
    category: String,
    query: String,
    scope: SearchScope,
    pager: Pager,
    selection: SelectionSet,
    suggestion_limit: usize,
    loads: Sequence,
    queries: Sequence,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            catalog: None,
            status: LoadStatus::Loading,
            category: ALL_CATEGORIES.to_string(),
            query: String::new(),
            scope: config.search_scope,
            pager: Pager::new(config.initial_page_size(), config.page_increment),
            selection: SelectionSet::default(),
            suggestion_limit: config.suggestion_limit,
            loads: Sequence::default(),
            queries: Sequence::default(),
        }
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn is_searching(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Start a catalog load; only the result for the latest ticket is applied.
    pub fn begin_load(&mut self) -> Ticket {
        if self.catalog.is_none() {
            self.status = LoadStatus::Loading;
        }
        self.loads.issue()
    }

    /// Apply a finished load. A failure keeps the previous catalog and shows
    /// the error view until the next navigation action. Returns false if the
    /// ticket was superseded.
    pub fn finish_load(&mut self, ticket: Ticket, result: Result<Catalog, Error>) -> bool {
        if !self.loads.is_current(ticket) {
            tracing::debug!(?ticket, "discarding superseded catalog load");
            return false;
        }
        match result {
            Ok(catalog) => {
                if !catalog.has_category(&self.category) {
                    self.category = ALL_CATEGORIES.to_string();
                }
                self.selection.clear();
                self.pager.reset();
                self.catalog = Some(catalog);
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog load failed");
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
        true
    }

    /// Start a search pass for debounced input; see [`AppState::finish_query`].
    pub fn begin_query(&mut self) -> Ticket {
        self.queries.issue()
    }

    /// Apply a debounced search if no newer input arrived since `ticket`.
    pub fn finish_query(&mut self, ticket: Ticket, query: String) -> Result<bool, Error> {
        if !self.queries.is_current(ticket) {
            return Ok(false);
        }
        self.apply(Action::Search { query })?;
        Ok(true)
    }

    /// Apply a user action synchronously.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an unknown category or a selection before the
    /// catalog is loaded, `PhraseNotFound` for an unknown card.
    pub fn apply(&mut self, action: Action) -> Result<(), Error> {
        if matches!(action, Action::Search { .. } | Action::SelectCategory { .. } | Action::ShowMore) {
            self.dismiss_load_error();
        }
        match action {
            Action::Search { query } => {
                self.query = query;
                if self.is_searching() && self.scope == SearchScope::Global {
                    self.category = ALL_CATEGORIES.to_string();
                }
            }
            Action::SelectCategory { category } => {
                if let Some(catalog) = &self.catalog
                    && !catalog.has_category(&category)
                {
                    return Err(Error::InvalidInput(format!("unknown category: {category}")));
                }
                if category == self.category && !self.is_searching() {
                    return Ok(());
                }
                // switching category clears the search box and any pending pass
                self.queries.issue();
                self.category = category;
                self.query.clear();
                self.pager.reset();
            }
            Action::ShowMore => {
                if !self.is_searching() {
                    self.pager.grow();
                }
            }
            Action::ToggleSelection { jp } => {
                let entry = self.lookup(&jp)?;
                self.selection.toggle(&entry);
            }
            Action::SetSelection { jp, selected } => {
                let entry = self.lookup(&jp)?;
                self.selection.set(&entry, selected);
            }
            Action::ExitSelectMode => self.selection.clear(),
        }
        Ok(())
    }

    /// A failed reload is only reported once while an older catalog is held.
    fn dismiss_load_error(&mut self) {
        if matches!(self.status, LoadStatus::Failed(_)) && self.catalog.is_some() {
            self.status = LoadStatus::Ready;
        }
    }

    fn lookup(&self, jp: &str) -> Result<PhraseEntry, Error> {
        let catalog = self
            .catalog
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("catalog is not loaded".into()))?;
        catalog.get(jp).cloned().ok_or_else(|| Error::PhraseNotFound(jp.to_string()))
    }

    /// Uncheck the pages that were exported.
    pub fn selection_exported(&mut self, pages: &[PrintPage]) {
        self.selection.remove_pages(pages);
    }

    /// Render the grid region for the current state.
    pub fn render(&self) -> View {
        if let LoadStatus::Failed(detail) = &self.status {
            return View::Error { message: messages::LOAD_FAILED.to_string(), detail: detail.clone() };
        }
        let Some(catalog) = &self.catalog else {
            return View::Loading { message: messages::LOADING.to_string() };
        };

        let matches = catalog.filter(&self.query, &self.category, self.scope);

        if matches.is_empty() {
            let term = self.query.trim().to_lowercase();
            let (message, suggestions) = if self.is_searching() {
                (messages::no_match_for(&term), catalog.suggest(&term, self.suggestion_limit))
            } else {
                (messages::NO_MATCH_IN_CATEGORY.to_string(), Vec::new())
            };
            return View::Empty { message, hint: messages::TRY_ANOTHER_KEYWORD.to_string(), suggestions };
        }

        let total = matches.len();
        let shown = if self.is_searching() { total } else { total.min(self.pager.visible()) };
        let cards = matches
            .into_iter()
            .take(shown)
            .map(|e| Card::new(e, self.selection.contains(&e.jp)))
            .collect();

        View::Cards {
            category: self.category.clone(),
            query: self.query.clone(),
            cards,
            total,
            has_more: shown < total,
            selected: self.selection.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::tests::{entry, featured};

    fn config() -> AppConfig {
        AppConfig { page_size_wide: 2, page_increment: 2, ..Default::default() }
    }

    fn catalog() -> Catalog {
        Catalog::from_categories(vec![
            (
                "menu".to_string(),
                vec![entry("水", "Water", "menu"), entry("お茶", "Tea", "menu"), entry("ビール", "Beer", "menu")],
            ),
            ("pay".to_string(), vec![featured("現金のみ", "Cash only", "pay"), entry("領収書", "Receipt", "pay")]),
        ])
        .unwrap()
    }

    fn loaded_state() -> AppState {
        let mut state = AppState::new(&config());
        let ticket = state.begin_load();
        assert!(state.finish_load(ticket, Ok(catalog())));
        state
    }

    fn cards(view: &View) -> Vec<String> {
        match view {
            View::Cards { cards, .. } => cards.iter().map(|c| c.jp.clone()).collect(),
            other => panic!("expected cards, got {other:?}"),
        }
    }

    #[test]
    fn test_sequence_tickets() {
        let mut seq = Sequence::default();
        let first = seq.issue();
        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert!(first < second);
    }

    #[test]
    fn test_pager_grow_and_reset() {
        let mut pager = Pager::new(8, 4);
        pager.grow();
        pager.grow();
        assert_eq!(pager.visible(), 16);
        pager.reset();
        assert_eq!(pager.visible(), 8);
    }

    #[test]
    fn test_selection_keeps_check_order() {
        let mut selection = SelectionSet::default();
        assert!(selection.toggle(&entry("水", "Water", "menu")));
        assert!(selection.toggle(&entry("出口", "Exit", "sign")));
        assert!(!selection.toggle(&entry("水", "Water", "menu")));
        assert!(selection.toggle(&entry("水", "Water", "menu")));

        let jps: Vec<&str> = selection.pages().iter().map(|p| p.jp.as_str()).collect();
        assert_eq!(jps, vec!["出口", "水"]);

        selection.set(&entry("出口", "Exit", "sign"), true);
        assert_eq!(selection.len(), 2);
        selection.set(&entry("出口", "Exit", "sign"), false);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_loading_view_before_catalog() {
        let state = AppState::new(&config());
        assert!(matches!(state.render(), View::Loading { .. }));
    }

    #[test]
    fn test_default_view_is_paginated_and_featured_first() {
        let mut state = loaded_state();
        let view = state.render();
        assert_eq!(cards(&view)[0], "現金のみ");
        assert!(matches!(view, View::Cards { total: 5, has_more: true, .. }));
        assert_eq!(cards(&view).len(), 2);

        state.apply(Action::ShowMore).unwrap();
        assert_eq!(cards(&state.render()).len(), 4);
        state.apply(Action::ShowMore).unwrap();
        assert!(matches!(state.render(), View::Cards { has_more: false, .. }));
    }

    #[test]
    fn test_search_is_unpaginated_and_resets_category() {
        let mut state = loaded_state();
        state.apply(Action::SelectCategory { category: "pay".into() }).unwrap();
        state.apply(Action::Search { query: "e".into() }).unwrap();

        assert_eq!(state.category(), ALL_CATEGORIES);
        let view = state.render();
        assert_eq!(cards(&view), vec!["ビール", "領収書", "お茶", "水"]);
        assert!(matches!(view, View::Cards { has_more: false, .. }));
    }

    #[test]
    fn test_category_switch_clears_query_and_page() {
        let mut state = loaded_state();
        state.apply(Action::ShowMore).unwrap();
        state.apply(Action::Search { query: "tea".into() }).unwrap();
        state.apply(Action::SelectCategory { category: "menu".into() }).unwrap();

        assert_eq!(state.query(), "");
        assert_eq!(state.pager().visible(), 2);
        let view = state.render();
        assert!(matches!(view, View::Cards { total: 3, .. }));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut state = loaded_state();
        let result = state.apply(Action::SelectCategory { category: "drinks".into() });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(state.category(), ALL_CATEGORIES);
    }

    #[test]
    fn test_empty_result_with_suggestions() {
        let mut state = loaded_state();
        state.apply(Action::Search { query: "ビールください".into() }).unwrap();
        match state.render() {
            View::Empty { message, suggestions, .. } => {
                assert_eq!(message, "「ビールください」に一致するフレーズが見つかりません。");
                assert_eq!(suggestions, vec!["ビール".to_string()]);
            }
            other => panic!("expected empty view, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_load_keeps_previous_catalog() {
        let mut state = loaded_state();
        let ticket = state.begin_load();
        assert!(state.finish_load(ticket, Err(Error::LoadFailed("admin: status 404".into()))));

        assert!(matches!(state.render(), View::Error { .. }));
        assert_eq!(state.catalog().map(Catalog::len), Some(5));
    }

    #[test]
    fn test_search_after_failed_reload_shows_kept_catalog() {
        let mut state = loaded_state();
        let ticket = state.begin_load();
        assert!(state.finish_load(ticket, Err(Error::LoadFailed("x".into()))));

        state.apply(Action::Search { query: "water".into() }).unwrap();
        assert_eq!(cards(&state.render()), vec!["水".to_string()]);

        state.apply(Action::ToggleSelection { jp: "水".into() }).unwrap();
        assert!(matches!(state.render(), View::Cards { selected: 1, .. }));
    }

    #[test]
    fn test_failed_first_load_stays_in_error() {
        let mut state = AppState::new(&config());
        let ticket = state.begin_load();
        assert!(state.finish_load(ticket, Err(Error::LoadFailed("x".into()))));

        state.apply(Action::Search { query: "water".into() }).unwrap();
        assert!(matches!(state.render(), View::Error { .. }));
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut state = AppState::new(&config());
        let stale = state.begin_load();
        let fresh = state.begin_load();

        assert!(state.finish_load(fresh, Ok(catalog())));
        assert!(!state.finish_load(stale, Err(Error::LoadFailed("late".into()))));
        assert!(matches!(state.render(), View::Cards { .. }));
    }

    #[test]
    fn test_stale_query_is_discarded() {
        let mut state = loaded_state();
        let old = state.begin_query();
        let new = state.begin_query();
        assert!(!state.finish_query(old, "water".into()).unwrap());
        assert!(state.finish_query(new, "tea".into()).unwrap());
        assert_eq!(state.query(), "tea");
    }

    #[test]
    fn test_category_switch_invalidates_pending_query() {
        let mut state = loaded_state();
        let pending = state.begin_query();
        state.apply(Action::SelectCategory { category: "menu".into() }).unwrap();
        assert!(!state.finish_query(pending, "tea".into()).unwrap());
        assert_eq!(state.category(), "menu");
    }

    #[test]
    fn test_selection_flow() {
        let mut state = loaded_state();
        state.apply(Action::ToggleSelection { jp: "水".into() }).unwrap();
        state.apply(Action::SetSelection { jp: "お茶".into(), selected: true }).unwrap();
        assert_eq!(state.selection().len(), 2);

        let result = state.apply(Action::ToggleSelection { jp: "ワイン".into() });
        assert!(matches!(result, Err(Error::PhraseNotFound(_))));

        let exported = state.selection().pages().to_vec();
        state.apply(Action::ToggleSelection { jp: "ビール".into() }).unwrap();
        state.selection_exported(&exported);
        let left: Vec<&str> = state.selection().pages().iter().map(|p| p.jp.as_str()).collect();
        assert_eq!(left, vec!["ビール"]);
        state.apply(Action::ToggleSelection { jp: "ビール".into() }).unwrap();
        assert!(state.selection().is_empty());

        state.apply(Action::ToggleSelection { jp: "水".into() }).unwrap();
        state.apply(Action::ExitSelectMode).unwrap();
        assert!(state.selection().is_empty());
    }

    #[test]
    fn test_cards_expose_actions_and_selection() {
        let mut state = loaded_state();
        state.apply(Action::ToggleSelection { jp: "現金のみ".into() }).unwrap();
        match state.render() {
            View::Cards { cards, selected, .. } => {
                assert_eq!(selected, 1);
                assert!(cards[0].selected);
                assert_eq!(cards[0].actions.len(), CardAction::ALL.len());
            }
            other => panic!("expected cards, got {other:?}"),
        }
    }
}
