use super::package::PackageRecord;
use super::search::{filter, MatchResult};

/// State of the search box: the current value, the suggestions shown
/// while typing and the list the value filters down to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    value: String,
    suggestions: Vec<MatchResult>,
    filtered: Vec<PackageRecord>,
}

impl SearchState {
    pub fn new(catalog: &[PackageRecord]) -> Self {
        Self {
            filtered: catalog.to_vec(),
            ..Default::default()
        }
    }

    /// Apply `value` as the search.
    ///
    /// An empty value lists the whole catalog.
    pub fn on_search(&mut self, catalog: &[PackageRecord], value: &str) {
        self.value = value.to_string();
        self.filtered = if value.is_empty() {
            catalog.to_vec()
        } else {
            filter(catalog, value)
                .into_iter()
                .map(|result| result.record)
                .collect()
        };
    }

    pub fn fetch_suggestions(&mut self, catalog: &[PackageRecord], value: &str) {
        self.suggestions = filter(catalog, value);
    }

    pub fn clear_suggestions(&mut self) {
        self.suggestions.clear();
    }

    pub fn select_suggestion(&mut self, catalog: &[PackageRecord], label: &str) {
        self.on_search(catalog, label);
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn suggestions(&self) -> &[MatchResult] {
        &self.suggestions
    }

    pub fn filtered(&self) -> &[PackageRecord] {
        &self.filtered
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    use super::*;

    fn catalog() -> Vec<PackageRecord> {
        ["react", "react-dom", "redux", "lodash"]
            .into_iter()
            .map(|name| PackageRecord::new(name, Map::new()).unwrap())
            .collect()
    }

    fn labels(records: &[PackageRecord]) -> Vec<&str> {
        records.iter().map(PackageRecord::label).collect()
    }

    #[test]
    fn empty_search_lists_everything() {
        let catalog = catalog();
        let mut state = SearchState::new(&catalog);
        assert_eq!(state.filtered().len(), 4);

        state.on_search(&catalog, "red");
        assert_eq!(labels(state.filtered()), vec!["redux"]);

        state.on_search(&catalog, "");
        assert_eq!(state.value(), "");
        assert_eq!(state.filtered().len(), 4);
    }

    #[test]
    fn suggestions_follow_input() {
        let catalog = catalog();
        let mut state = SearchState::new(&catalog);

        state.fetch_suggestions(&catalog, "rea");
        let suggested: Vec<_> = state.suggestions().iter().map(MatchResult::label).collect();
        assert_eq!(suggested, vec!["react", "react-dom"]);

        state.clear_suggestions();
        assert!(state.suggestions().is_empty());
    }

    #[test]
    fn selecting_a_suggestion_searches_for_it() {
        let catalog = catalog();
        let mut state = SearchState::new(&catalog);

        state.select_suggestion(&catalog, "react-dom");
        assert_eq!(state.value(), "react-dom");
        assert_eq!(labels(state.filtered()), vec!["react-dom"]);
    }
}
