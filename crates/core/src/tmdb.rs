//! Transformation functions for TMDB list responses
//!
//! TMDB lists are served in fixed native pages of [`TMDB_PAGE_SIZE`]. The
//! shell fetches the native pages covering a requested `(offset, limit)` and
//! uses [`slice_from_pages`] to cut the exact window out of them.

use crate::entity::{Movie, Slice};
use crate::paging::window;
use serde::Deserialize;

/// Native page size of TMDB list endpoints
pub const TMDB_PAGE_SIZE: usize = 20;

/// TMDB movie lists that can be used as partitions
pub const TMDB_LISTS: [&str; 4] = ["top_rated", "popular", "now_playing", "upcoming"];

/// One native page of a TMDB movie list
#[derive(Debug, Deserialize, Clone)]
pub struct TmdbListResponse {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub results: Vec<Option<Movie>>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
}

impl TmdbListResponse {
    /// Movies on this page, skipping null entries
    pub fn movies(self) -> Vec<Movie> {
        self.results.into_iter().flatten().collect()
    }
}

/// Whether `name` is a list this client knows how to request
pub fn is_known_list(name: &str) -> bool {
    TMDB_LISTS.contains(&name)
}

/// Cut `[offset, offset + limit)` out of consecutive native pages.
///
/// `pages` holds the movies of native pages `first_page, first_page + 1, ...`
/// concatenated in order.
pub fn slice_from_pages(
    offset: usize,
    limit: usize,
    first_page: usize,
    pages: Vec<Movie>,
    total: usize,
) -> Slice<Movie> {
    let offset_within = offset.saturating_sub((first_page.max(1) - 1) * TMDB_PAGE_SIZE);
    Slice {
        items: window(&pages, offset_within, limit),
        total,
    }
}

/// Full image URL for a poster path, if there is one
pub fn poster_url(image_base: &str, poster_path: Option<&str>) -> Option<String> {
    poster_path.map(|path| {
        format!(
            "{}/{}",
            image_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movies(range: std::ops::Range<u64>) -> Vec<Movie> {
        range
            .map(|id| Movie {
                id,
                title: None,
                overview: None,
                poster_path: None,
                release_date: None,
                vote_average: Some(7.0),
                vote_count: Some(1),
                extra: Default::default(),
            })
            .collect()
    }

    #[test]
    fn test_parse_list_response() {
        let json = r#"{
            "page": 1,
            "results": [
                {"id": 278, "title": "The Shawshank Redemption", "vote_average": 8.7, "vote_count": 26000, "adult": false},
                null
            ],
            "total_pages": 500,
            "total_results": 10000
        }"#;
        let response: TmdbListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_pages, Some(500));
        assert_eq!(response.total_results, Some(10000));

        let movies = response.movies();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, 278);
        assert_eq!(movies[0].extra.get("adult").unwrap(), false);
    }

    #[test]
    fn test_parse_empty_response() {
        let response: TmdbListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.movies().is_empty());
    }

    #[test]
    fn test_slice_from_aligned_page() {
        let slice = slice_from_pages(20, 20, 2, movies(20..40), 100);
        assert_eq!(slice.items.len(), 20);
        assert_eq!(slice.items[0].id, 20);
        assert_eq!(slice.total, 100);
    }

    #[test]
    fn test_slice_spanning_two_pages() {
        // offset 130 lives on native pages 7 and 8 (indices 120..160)
        let slice = slice_from_pages(130, 20, 7, movies(120..160), 1000);
        let ids: Vec<u64> = slice.items.iter().map(|m| m.id).collect();
        assert_eq!(ids, (130..150).collect::<Vec<_>>());
    }

    #[test]
    fn test_slice_short_last_page() {
        let slice = slice_from_pages(40, 20, 3, movies(40..45), 45);
        assert_eq!(slice.items.len(), 5);
    }

    #[test]
    fn test_known_lists() {
        assert!(is_known_list("top_rated"));
        assert!(!is_known_list("genre:pop"));
    }

    #[test]
    fn test_poster_url() {
        assert_eq!(
            poster_url("https://image.tmdb.org/t/p/w500/", Some("/abc.jpg")),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg".to_string())
        );
        assert_eq!(poster_url("https://x", None), None);
    }
}
