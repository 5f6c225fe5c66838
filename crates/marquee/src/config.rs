use crate::prelude::*;
use marquee_core::partition::CatalogConfig;
use marquee_core::spotify::{DEFAULT_GENRE_PARTITIONS, SPOTIFY_MAX_LIMIT};
use marquee_core::tmdb::TMDB_PAGE_SIZE;
use std::time::Duration;

/// TMDB configuration from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub image_base: String,
    pub partitions: Vec<String>,
}

impl TmdbConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.themoviedb.org/3";
    pub const DEFAULT_IMAGE_BASE: &'static str = "https://image.tmdb.org/t/p/w500";
    pub const DEFAULT_LANGUAGE: &'static str = "es-MX";
    pub const DEFAULT_LIST: &'static str = "top_rated";

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> CatalogResult<Self> {
        let partitions = lookup("TMDB_PARTITIONS")
            .map(|v| parse_partition_list(&v))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| vec![Self::DEFAULT_LIST.to_string()]);

        Ok(Self {
            api_key: required(lookup, "TMDB_API_KEY")?,
            base_url: lookup("TMDB_BASE_URL").unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            language: lookup("TMDB_LANGUAGE").unwrap_or_else(|| Self::DEFAULT_LANGUAGE.to_string()),
            image_base: lookup("TMDB_IMAGE_BASE")
                .unwrap_or_else(|| Self::DEFAULT_IMAGE_BASE.to_string()),
            partitions,
        })
    }

    /// Settings consumed by the pager. The "market" slot carries the language.
    pub fn catalog(&self) -> CatalogConfig {
        CatalogConfig {
            provider_max_batch: TMDB_PAGE_SIZE,
            default_market: self.language.clone(),
            default_query: Self::DEFAULT_LIST.to_string(),
            configured_partitions: self.partitions.clone(),
        }
    }
}

/// Spotify configuration from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub market: String,
    pub default_query: String,
    pub partitions: Vec<String>,
    pub api_base: String,
    pub accounts_base: String,
}

impl SpotifyConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.spotify.com/v1";
    pub const DEFAULT_ACCOUNTS_BASE: &'static str = "https://accounts.spotify.com";
    pub const DEFAULT_MARKET: &'static str = "US";
    pub const DEFAULT_QUERY: &'static str = "genre:pop";

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> CatalogResult<Self> {
        let partitions = lookup("SPOTIFY_PARTITIONS")
            .map(|v| parse_partition_list(&v))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| {
                DEFAULT_GENRE_PARTITIONS
                    .iter()
                    .map(|g| g.to_string())
                    .collect()
            });

        Ok(Self {
            client_id: required(lookup, "SPOTIFY_CLIENT_ID")?,
            client_secret: required(lookup, "SPOTIFY_CLIENT_SECRET")?,
            market: lookup("SPOTIFY_MARKET").unwrap_or_else(|| Self::DEFAULT_MARKET.to_string()),
            default_query: lookup("SPOTIFY_DEFAULT_QUERY")
                .unwrap_or_else(|| Self::DEFAULT_QUERY.to_string()),
            partitions,
            api_base: lookup("SPOTIFY_API_BASE")
                .unwrap_or_else(|| Self::DEFAULT_API_BASE.to_string()),
            accounts_base: lookup("SPOTIFY_ACCOUNTS_BASE")
                .unwrap_or_else(|| Self::DEFAULT_ACCOUNTS_BASE.to_string()),
        })
    }

    pub fn catalog(&self) -> CatalogConfig {
        CatalogConfig {
            provider_max_batch: SPOTIFY_MAX_LIMIT,
            default_market: self.market.clone(),
            default_query: self.default_query.clone(),
            configured_partitions: self.partitions.clone(),
        }
    }
}

/// Bounds applied to the in-memory slice caches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheSettings {
    pub max_entries: usize,
    /// `None` keeps entries until they are evicted for space.
    pub ttl: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            ttl: Some(Duration::from_secs(3600)),
        }
    }
}

impl CacheSettings {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> CatalogResult<Self> {
        let defaults = Self::default();

        let max_entries = match lookup("MARQUEE_CACHE_ENTRIES") {
            Some(v) => v.trim().parse::<usize>().map_err(|_| {
                Error::Config(f!("MARQUEE_CACHE_ENTRIES must be a positive integer, got '{v}'"))
            })?,
            None => defaults.max_entries,
        };

        // 0 disables expiry
        let ttl = match lookup("MARQUEE_CACHE_TTL_SECS") {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(Error::Config(f!(
                        "MARQUEE_CACHE_TTL_SECS must be a number of seconds, got '{v}'"
                    )))
                }
            },
            None => defaults.ttl,
        };

        Ok(Self {
            max_entries: max_entries.max(1),
            ttl,
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub tmdb: TmdbConfig,
    pub spotify: SpotifyConfig,
    pub cache: CacheSettings,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> CatalogResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CatalogResult<Self> {
        Ok(Self {
            tmdb: TmdbConfig::from_lookup(&lookup)?,
            spotify: SpotifyConfig::from_lookup(&lookup)?,
            cache: CacheSettings::from_lookup(&lookup)?,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> CatalogResult<String> {
    lookup(name).ok_or_else(|| Error::Config(f!("{name} environment variable not set")))
}

/// Split a comma-separated partition list, dropping blank entries
pub fn parse_partition_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
