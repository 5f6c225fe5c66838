//! Transformation functions for Spotify API responses

use crate::entity::{Artist, Slice};
use serde::Deserialize;
use std::time::Duration;

/// Largest `limit` accepted by the search endpoint
pub const SPOTIFY_MAX_LIMIT: usize = 50;

/// Subtracted from `expires_in` so a token is refreshed before it actually lapses
pub const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// Genre partitions searched when the caller asks for "all"
pub const DEFAULT_GENRE_PARTITIONS: [&str; 10] = [
    "genre:pop",
    "genre:rock",
    "genre:hip-hop",
    "genre:latin",
    "genre:reggaeton",
    "genre:electronic",
    "genre:r&b",
    "genre:indie",
    "genre:jazz",
    "genre:country",
];

/// Search response from `GET /v1/search?type=artist`
#[derive(Debug, Deserialize, Clone)]
pub struct SpotifySearchResponse {
    #[serde(default)]
    pub artists: Option<SpotifyArtistPage>,
}

/// Paging object holding artists
#[derive(Debug, Deserialize, Clone)]
pub struct SpotifyArtistPage {
    #[serde(default)]
    pub items: Vec<Option<Artist>>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Client-credentials token response from the accounts service
#[derive(Debug, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: u64,
}

/// Turn a search response into a slice. Missing pages read as empty.
pub fn transform_search_response(response: SpotifySearchResponse) -> Slice<Artist> {
    match response.artists {
        Some(page) => Slice {
            total: page.total.unwrap_or(0) as usize,
            items: page.items.into_iter().flatten().collect(),
        },
        None => Slice::empty(0),
    }
}

/// How long a freshly issued token may be used
pub fn token_lifetime(expires_in: u64) -> Duration {
    Duration::from_secs(expires_in).saturating_sub(TOKEN_SAFETY_MARGIN)
}
