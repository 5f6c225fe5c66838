//! reqwest-backed catalog providers

use crate::catalog::{SliceCache, VirtualPager};
use crate::config::AppConfig;
use crate::prelude::*;
use std::sync::Arc;

pub mod spotify;
pub mod tmdb;

#[cfg(test)]
pub(crate) mod testing;

pub use spotify::SpotifyProvider;
pub use tmdb::TmdbProvider;

/// Pagers for both catalogs, each with its own cache
#[derive(Debug)]
pub struct Catalogs {
    pub movies: Arc<VirtualPager<TmdbProvider>>,
    pub artists: Arc<VirtualPager<SpotifyProvider>>,
}

impl Catalogs {
    pub fn from_config(config: &AppConfig) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(f!("Failed to build HTTP client: {e}")))?;

        let tmdb = TmdbProvider::new(client.clone(), &config.tmdb, config.cache);
        let spotify = SpotifyProvider::new(client, &config.spotify);

        Ok(Self {
            movies: Arc::new(VirtualPager::new(
                Arc::new(tmdb),
                Arc::new(SliceCache::new(config.cache)),
                config.tmdb.catalog(),
            )),
            artists: Arc::new(VirtualPager::new(
                Arc::new(spotify),
                Arc::new(SliceCache::new(config.cache)),
                config.spotify.catalog(),
            )),
        })
    }
}

/// Best-effort message out of an upstream error body.
///
/// Understands the Spotify API (`error.message`), the OAuth token endpoint
/// (`error_description` / `error`) and TMDB (`status_message`) shapes. Bodies
/// that are not JSON, or carry none of these, yield `fallback`.
pub fn error_message(body: &str, fallback: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback.to_string();
    };

    let candidates = [
        value.pointer("/error/message"),
        value.get("error_description"),
        value.get("status_message"),
        value.get("error"),
    ];

    let message = candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_string);
    message.unwrap_or_else(|| fallback.to_string())
}

/// Turn a non-success response into a message that names the status.
pub(crate) async fn describe_failure(response: reqwest::Response, fallback: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    f!("{} (HTTP {})", error_message(&body, fallback), status)
}
