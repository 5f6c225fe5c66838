//! Catalog entities and the slice/page shapes they travel in.
//!
//! The aggregation layer only needs two things from an entity: an identity
//! key for deduplication and a comparator for ranking. Everything else in the
//! upstream payload is carried through untouched in the `extra` maps.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

/// An item returned by a catalog provider.
pub trait CatalogEntity: Clone + Debug + Send + Sync + 'static {
    /// Identity key used for deduplication across slices and partitions.
    type Id: Eq + Hash + Clone + Debug + Send + Sync;

    fn id(&self) -> &Self::Id;

    /// Ordering used by the ranker. `Ordering::Less` means `self` ranks first.
    fn rank_cmp(&self, other: &Self) -> Ordering;
}

/// Movie from the TMDB catalog
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Movie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Movie {
    /// Rating with missing or NaN values treated as zero.
    pub fn rating(&self) -> f64 {
        match self.vote_average {
            Some(v) if !v.is_nan() => v,
            _ => 0.0,
        }
    }

    pub fn votes(&self) -> u64 {
        self.vote_count.unwrap_or(0)
    }
}

impl CatalogEntity for Movie {
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .rating()
            .total_cmp(&self.rating())
            .then_with(|| other.votes().cmp(&self.votes()))
    }
}

/// Artist image reference
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ArtistImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Artist from the Spotify catalog
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Artist {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<ArtistImage>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Artist {
    pub fn popularity(&self) -> u32 {
        self.popularity.unwrap_or(0)
    }

    /// Follower count, when the payload carries one
    pub fn followers(&self) -> Option<u64> {
        self.extra
            .get("followers")
            .and_then(|f| f.get("total"))
            .and_then(|t| t.as_u64())
    }
}

impl CatalogEntity for Artist {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn rank_cmp(&self, other: &Self) -> Ordering {
        other.popularity().cmp(&self.popularity())
    }
}

/// Result of one upstream call for a given `(offset, limit)`.
///
/// `items.len() < limit` signals the end of the partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<E> {
    pub items: Vec<E>,
    pub total: usize,
}

impl<E> Slice<E> {
    pub fn empty(total: usize) -> Self {
        Self {
            items: Vec::new(),
            total,
        }
    }
}

/// A single virtual page as handed to the rendering layer
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<E> {
    pub items: Vec<E>,
    pub total_results: usize,
}

/// Top-N listing as handed to the rendering layer
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TopResult<E> {
    pub items: Vec<E>,
}
