//! Category and status filtering for status reports.

use qbit_models::{StatusFilter, TorrentRecord};

/// Category keyword matching every torrent.
pub const ALL_CATEGORIES: &str = "all";

/// Maps user-facing category shorthands onto the client's category names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAliases {
    tv: String,
    movies: String,
}

impl CategoryAliases {
    /// Creates aliases for the given TV and movie categories.
    pub fn new(tv: impl Into<String>, movies: impl Into<String>) -> Self {
        Self {
            tv: tv.into(),
            movies: movies.into(),
        }
    }

    /// Resolve a requested category.
    ///
    /// `tv` and `movies` (case-insensitive) resolve to the configured client
    /// categories, `all` stays the wildcard, anything else is returned as-is.
    pub fn resolve(&self, requested: &str) -> String {
        let requested = requested.trim();
        match requested.to_ascii_lowercase().as_str() {
            "" | ALL_CATEGORIES => ALL_CATEGORIES.to_string(),
            "tv" => self.tv.clone(),
            "movies" | "movie" => self.movies.clone(),
            _ => requested.to_string(),
        }
    }
}

/// Filter records by category and status, then sort by progress descending.
///
/// `category` must already be resolved through [`CategoryAliases`]. The sort
/// is stable, so torrents with equal progress keep the client's order.
pub fn apply(records: Vec<TorrentRecord>, category: &str, status: StatusFilter) -> Vec<TorrentRecord> {
    let mut filtered: Vec<TorrentRecord> = records
        .into_iter()
        .filter(|r| category == ALL_CATEGORIES || r.category == category)
        .filter(|r| status.matches(r.state))
        .collect();

    filtered.sort_by(|a, b| b.progress.total_cmp(&a.progress));
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbit_models::LogicalState;

    fn record(name: &str, category: &str, progress: f64, state: LogicalState) -> TorrentRecord {
        TorrentRecord::new(name, category, progress, state)
    }

    fn names(records: &[TorrentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_progress_descending() {
        let records = vec![
            record("a", "tv", 10.0, LogicalState::Downloading),
            record("b", "tv", 90.0, LogicalState::Downloading),
            record("c", "tv", 50.0, LogicalState::Downloading),
        ];

        let result = apply(records, ALL_CATEGORIES, StatusFilter::All);
        assert_eq!(names(&result), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_progress() {
        let records = vec![
            record("first", "tv", 40.0, LogicalState::Downloading),
            record("top", "tv", 80.0, LogicalState::Downloading),
            record("second", "tv", 40.0, LogicalState::Stalled),
            record("third", "tv", 40.0, LogicalState::Queued),
        ];

        let result = apply(records, ALL_CATEGORIES, StatusFilter::All);
        assert_eq!(names(&result), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_category_exact_match() {
        let records = vec![
            record("show", "tv-sonarr", 10.0, LogicalState::Downloading),
            record("film", "radarr", 20.0, LogicalState::Downloading),
            record("show2", "TV-SONARR", 30.0, LogicalState::Downloading),
        ];

        let result = apply(records, "tv-sonarr", StatusFilter::All);
        assert_eq!(names(&result), vec!["show"]);
    }

    #[test]
    fn test_status_filters() {
        let records = vec![
            record("done", "x", 100.0, LogicalState::Completed),
            record("paused", "x", 20.0, LogicalState::Paused),
            record("active", "x", 60.0, LogicalState::Downloading),
        ];

        let completed = apply(records.clone(), ALL_CATEGORIES, StatusFilter::Completed);
        assert_eq!(names(&completed), vec!["done"]);

        let downloading = apply(records, ALL_CATEGORIES, StatusFilter::Downloading);
        assert_eq!(names(&downloading), vec!["active", "paused"]);
    }

    #[test]
    fn test_combined_filters() {
        let records = vec![
            record("show-done", "tv-sonarr", 100.0, LogicalState::Completed),
            record("show-dl", "tv-sonarr", 30.0, LogicalState::Downloading),
            record("film-dl", "radarr", 70.0, LogicalState::Downloading),
        ];

        let result = apply(records, "tv-sonarr", StatusFilter::Downloading);
        assert_eq!(names(&result), vec!["show-dl"]);
    }

    #[test]
    fn test_alias_resolution() {
        let aliases = CategoryAliases::new("tv-sonarr", "radarr");

        assert_eq!(aliases.resolve("tv"), "tv-sonarr");
        assert_eq!(aliases.resolve("TV"), "tv-sonarr");
        assert_eq!(aliases.resolve("movies"), "radarr");
        assert_eq!(aliases.resolve("movie"), "radarr");
        assert_eq!(aliases.resolve("All"), "all");
        assert_eq!(aliases.resolve(""), "all");
        assert_eq!(aliases.resolve("Books"), "Books");
    }

    #[test]
    fn test_empty_input() {
        assert!(apply(Vec::new(), ALL_CATEGORIES, StatusFilter::All).is_empty());
    }
}
