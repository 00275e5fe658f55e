use serde::Deserialize;

use crate::domain::entity::EntityType;
use crate::domain::review::{RATING_MAX, RATING_MIN};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Newest,
    TopRated,
    LowestRated,
    MostHelpful,
}

impl SortBy {
    // MostHelpful cannot be sorted at the store layer because helpful
    // counts are derived; the feed assembler re-sorts that page once the
    // batcher has produced them, so the store falls back to newest-first.
    pub fn order_clause(self) -> &'static str {
        match self {
            SortBy::Newest | SortBy::MostHelpful => "created_at DESC",
            SortBy::TopRated => "rating DESC, created_at DESC",
            SortBy::LowestRated => "rating ASC, created_at DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewFilters {
    pub search: String,
    pub entity_type: Option<EntityType>,
    pub min_rating: i16,
    pub sort: SortBy,
    pub page: i64,
    pub limit: i64,
}

impl Default for ReviewFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            entity_type: None,
            min_rating: RATING_MIN,
            sort: SortBy::Newest,
            page: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReviewFilters {
    // No caller can request an unbounded page.
    pub fn clamped(mut self) -> Self {
        self.page = self.page.max(0);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self.min_rating = self.min_rating.clamp(RATING_MIN, RATING_MAX);
        self
    }

    pub fn offset(&self) -> i64 {
        // page is caller-controlled and only bounded below, so the product
        // must not overflow; a saturated OFFSET just yields an empty page.
        self.page.saturating_mul(self.limit)
    }

    // The substring search term for the ILIKE pattern, or None when no
    // search filter applies. LIKE metacharacters are escaped so the term
    // always matches literally.
    pub fn search_term(&self) -> Option<String> {
        let term = self.search.trim();
        if term.is_empty() {
            return None;
        }
        Some(
            term.replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_per_sort_mode() {
        assert_eq!(SortBy::Newest.order_clause(), "created_at DESC");
        assert_eq!(SortBy::TopRated.order_clause(), "rating DESC, created_at DESC");
        assert_eq!(SortBy::LowestRated.order_clause(), "rating ASC, created_at DESC");
        assert_eq!(SortBy::MostHelpful.order_clause(), "created_at DESC");
    }

    #[test]
    fn test_clamped_bounds() {
        let filters = ReviewFilters {
            page: -3,
            limit: 5000,
            min_rating: 9,
            ..ReviewFilters::default()
        }
        .clamped();

        assert_eq!(filters.page, 0);
        assert_eq!(filters.limit, MAX_PAGE_SIZE);
        assert_eq!(filters.min_rating, RATING_MAX);
    }

    #[test]
    fn test_offset_is_page_times_limit() {
        let filters = ReviewFilters {
            page: 3,
            limit: 20,
            ..ReviewFilters::default()
        };
        assert_eq!(filters.offset(), 60);
    }

    #[test]
    fn test_search_term_ignores_whitespace() {
        let mut filters = ReviewFilters::default();
        assert_eq!(filters.search_term(), None);

        filters.search = "   ".to_string();
        assert_eq!(filters.search_term(), None);

        filters.search = " beach ".to_string();
        assert_eq!(filters.search_term().as_deref(), Some("beach"));
    }

    #[test]
    fn test_search_term_escapes_like_metacharacters() {
        let mut filters = ReviewFilters::default();

        filters.search = "100%".to_string();
        assert_eq!(filters.search_term().as_deref(), Some("100\\%"));

        filters.search = "a_c".to_string();
        assert_eq!(filters.search_term().as_deref(), Some("a\\_c"));

        filters.search = "back\\slash".to_string();
        assert_eq!(filters.search_term().as_deref(), Some("back\\\\slash"));
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let filters = ReviewFilters {
            page: i64::MAX,
            limit: 20,
            ..ReviewFilters::default()
        }
        .clamped();

        assert_eq!(filters.offset(), i64::MAX);
    }
}
