//! Text search options.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchOptions {
    IgnoreCase,
    MatchCompleteText,
    SearchFromCurrent,
    UpdateCurrentCellWhenFound,
    SearchFormulaText,
}

/// Resolved search flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchSettings {
    pub ignore_case: bool,
    pub match_complete: bool,
    pub search_from_current: bool,
    pub update_current: bool,
    pub search_formula: bool,
}

impl SearchSettings {
    pub fn of(options: &[SearchOptions]) -> Self {
        let mut settings = SearchSettings::default();
        for option in options {
            match option {
                SearchOptions::IgnoreCase => settings.ignore_case = true,
                SearchOptions::MatchCompleteText => settings.match_complete = true,
                SearchOptions::SearchFromCurrent => settings.search_from_current = true,
                SearchOptions::UpdateCurrentCellWhenFound => settings.update_current = true,
                SearchOptions::SearchFormulaText => settings.search_formula = true,
            }
        }
        settings
    }

    /// Whether `haystack` matches `needle` under these settings.
    pub fn matches(&self, haystack: &str, needle: &str) -> bool {
        match (self.ignore_case, self.match_complete) {
            (false, false) => haystack.contains(needle),
            (false, true) => haystack == needle,
            (true, false) => haystack.to_lowercase().contains(&needle.to_lowercase()),
            (true, true) => haystack.to_lowercase() == needle.to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_sets_flags() {
        let s = SearchSettings::of(&[SearchOptions::IgnoreCase, SearchOptions::SearchFormulaText]);
        assert!(s.ignore_case);
        assert!(s.search_formula);
        assert!(!s.match_complete);
        assert!(!s.update_current);
        assert!(!s.search_from_current);
    }

    #[test]
    fn test_matches() {
        let plain = SearchSettings::default();
        assert!(plain.matches("Hello World", "World"));
        assert!(!plain.matches("Hello World", "world"));

        let complete = SearchSettings::of(&[SearchOptions::MatchCompleteText]);
        assert!(!complete.matches("Hello World", "World"));
        assert!(complete.matches("World", "World"));

        let both = SearchSettings::of(&[SearchOptions::MatchCompleteText, SearchOptions::IgnoreCase]);
        assert!(both.matches("WORLD", "world"));
        assert!(!both.matches("WORLDS", "world"));
    }
}
