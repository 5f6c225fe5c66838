//! TMDB movie lists
//!
//! TMDB serves each list in fixed native pages of 20 movies. A search for an
//! arbitrary `(offset, limit)` is answered by fetching every native page the
//! window touches, memoizing each page on its own, and cutting the window out
//! of their concatenation.

use super::describe_failure;
use crate::catalog::{CacheStats, SearchProvider, SliceCache, SliceKey};
use crate::config::{CacheSettings, TmdbConfig};
use crate::prelude::*;
use async_trait::async_trait;
use marquee_core::entity::{Movie, Slice};
use marquee_core::paging::native_page_span;
use marquee_core::partition::partition_key;
use marquee_core::tmdb::{
    is_known_list, slice_from_pages, TmdbListResponse, TMDB_LISTS, TMDB_PAGE_SIZE,
};

/// TMDB refuses list pages past this one.
pub const TMDB_MAX_PAGE: usize = 500;

pub struct TmdbProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    pages: SliceCache<Movie>,
}

impl std::fmt::Debug for TmdbProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl TmdbProvider {
    pub fn new(client: reqwest::Client, config: &TmdbConfig, cache: CacheSettings) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            pages: SliceCache::new(cache),
        }
    }

    /// Last native page worth requesting, once the list total is known
    async fn last_page(&self, key: &str) -> Option<usize> {
        self.pages
            .known_total(key)
            .await
            .map(|total| total.div_ceil(TMDB_PAGE_SIZE).min(TMDB_MAX_PAGE))
    }

    async fn native_page(&self, list: &str, language: &str, page: usize) -> CatalogResult<Slice<Movie>> {
        let key = partition_key(language, list);
        let cache_key = SliceKey::new(&key, (page - 1) * TMDB_PAGE_SIZE, TMDB_PAGE_SIZE);

        if let Some(slice) = self.pages.get(&cache_key).await {
            return Ok(slice);
        }

        log::debug!("tmdb fetch: {list} page={page} language={language}");
        let url = f!("{}/movie/{list}", self.base_url);
        let page_str = page.to_string();
        let query_params = [
            ("api_key", self.api_key.as_str()),
            ("language", language),
            ("page", page_str.as_str()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&query_params)
            .send()
            .await
            .map_err(|e| Error::Upstream(f!("Failed to send request to TMDB: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(
                describe_failure(response, "TMDB request failed").await,
            ));
        }

        let body: TmdbListResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(f!("Failed to parse TMDB response: {e}")))?;

        let total = body.total_results.unwrap_or(0) as usize;
        let slice = Slice {
            items: body.movies(),
            total,
        };

        self.pages.insert(cache_key, slice.clone()).await;
        self.pages.record_total(&key, total).await;

        Ok(slice)
    }
}

#[async_trait]
impl SearchProvider for TmdbProvider {
    type Entity = Movie;

    fn name(&self) -> &str {
        "tmdb"
    }

    /// `query` names the list and `market` carries the response language.
    async fn search(
        &self,
        query: &str,
        market: &str,
        offset: usize,
        limit: usize,
    ) -> CatalogResult<Slice<Movie>> {
        if !is_known_list(query) {
            return Err(Error::Validation(f!(
                "Unknown TMDB list '{query}', expected one of: {}",
                TMDB_LISTS.join(", ")
            )));
        }

        let key = partition_key(market, query);
        let Some((first, last)) = native_page_span(offset, limit, TMDB_PAGE_SIZE) else {
            let total = self.pages.known_total(&key).await.unwrap_or(0);
            return Ok(Slice::empty(total));
        };

        let mut movies = Vec::new();
        let mut total = self.pages.known_total(&key).await;

        for page in first..=last {
            if let Some(last_page) = self.last_page(&key).await {
                if page > last_page {
                    break;
                }
            }

            let slice = self.native_page(query, market, page).await?;
            let short = slice.items.len() < TMDB_PAGE_SIZE;
            total = Some(slice.total);
            movies.extend(slice.items);
            if short {
                break;
            }
        }

        let reachable = TMDB_MAX_PAGE * TMDB_PAGE_SIZE;
        let total = total.unwrap_or(0).min(reachable);
        Ok(slice_from_pages(offset, limit, first, movies, total))
    }

    async fn clear_cache(&self) {
        self.pages.clear().await;
    }

    async fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.pages.stats().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::{serve, Recorded};
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const LIST_TOTAL: u64 = 45;

    fn config(base: &str) -> TmdbConfig {
        TmdbConfig {
            api_key: "key".into(),
            base_url: base.to_string(),
            language: "es-MX".into(),
            image_base: TmdbConfig::DEFAULT_IMAGE_BASE.into(),
            partitions: vec!["top_rated".into()],
        }
    }

    /// A 45-movie list, ids 1..=45, 20 per page
    async fn list(
        State(recorded): State<Recorded>,
        Path(list): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let page: u64 = params["page"].parse().unwrap();
        recorded.push(f!("{list} page={page} language={}", params["language"]));

        let first = (page - 1) * 20 + 1;
        let last = (page * 20).min(LIST_TOTAL);
        let results: Vec<Value> = (first..=last)
            .map(|id| json!({"id": id, "title": f!("Movie {id}"), "vote_average": 7.5, "vote_count": id}))
            .collect();

        Json(json!({
            "page": page,
            "results": results,
            "total_pages": 3,
            "total_results": LIST_TOTAL
        }))
    }

    async fn provider() -> (TmdbProvider, Recorded) {
        let recorded = Recorded::default();
        let app = Router::new()
            .route("/movie/{list}", get(list))
            .with_state(recorded.clone());
        let base = serve(app).await;
        let provider = TmdbProvider::new(reqwest::Client::new(), &config(&base), CacheSettings::default());
        (provider, recorded)
    }

    fn ids(slice: &Slice<Movie>) -> Vec<u64> {
        slice.items.iter().map(|m| m.id).collect()
    }

    #[tokio::test]
    async fn test_window_across_native_pages() {
        let (provider, recorded) = provider().await;

        let slice = provider.search("top_rated", "es-MX", 15, 10).await.unwrap();

        assert_eq!(ids(&slice), (16..=25).collect::<Vec<_>>());
        assert_eq!(slice.total, 45);
        assert_eq!(
            recorded.entries(),
            vec!["top_rated page=1 language=es-MX", "top_rated page=2 language=es-MX"]
        );
    }

    #[tokio::test]
    async fn test_native_pages_are_memoized() {
        let (provider, recorded) = provider().await;

        provider.search("top_rated", "es-MX", 0, 20).await.unwrap();
        let slice = provider.search("top_rated", "es-MX", 10, 5).await.unwrap();

        assert_eq!(ids(&slice), vec![11, 12, 13, 14, 15]);
        assert_eq!(recorded.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_pages_past_total_are_skipped() {
        let (provider, recorded) = provider().await;

        provider.search("top_rated", "es-MX", 0, 20).await.unwrap();
        let slice = provider.search("top_rated", "es-MX", 40, 60).await.unwrap();

        assert_eq!(ids(&slice), vec![41, 42, 43, 44, 45]);
        // page 4 and beyond are never requested
        assert_eq!(
            recorded.entries(),
            vec!["top_rated page=1 language=es-MX", "top_rated page=3 language=es-MX"]
        );
    }

    #[tokio::test]
    async fn test_cleared_pages_are_fetched_again() {
        let (provider, recorded) = provider().await;

        provider.search("top_rated", "es-MX", 0, 20).await.unwrap();
        assert_eq!(provider.cache_stats().await.unwrap().slices, 1);

        provider.clear_cache().await;
        assert_eq!(provider.cache_stats().await.unwrap().slices, 0);

        provider.search("top_rated", "es-MX", 0, 20).await.unwrap();
        assert_eq!(recorded.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_languages_are_separate_partitions() {
        let (provider, recorded) = provider().await;

        provider.search("popular", "es-MX", 0, 20).await.unwrap();
        provider.search("popular", "en-US", 0, 20).await.unwrap();

        assert_eq!(recorded.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_list_is_rejected() {
        let (provider, recorded) = provider().await;

        let err = provider.search("favorites", "es-MX", 0, 20).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(recorded.entries().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key_is_upstream_error() {
        let app = Router::new().route(
            "/movie/{list}",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"status_code": 7, "status_message": "Invalid API key: You must be granted a valid key.", "success": false})),
                )
            }),
        );
        let base = serve(app).await;
        let provider = TmdbProvider::new(reqwest::Client::new(), &config(&base), CacheSettings::default());

        let err = provider.search("top_rated", "es-MX", 0, 20).await.unwrap_err();
        assert_eq!(
            err,
            Error::Upstream(
                "Invalid API key: You must be granted a valid key. (HTTP 401 Unauthorized)".into()
            )
        );
    }
}
