//! Deduplication and ranking of merged result sets.

use crate::entity::CatalogEntity;
use std::collections::HashSet;

/// Remove entities whose id was already seen, keeping the first occurrence.
///
/// Relative order of the survivors is preserved.
pub fn dedup_by_id<E: CatalogEntity>(items: Vec<E>) -> Vec<E> {
    let mut seen: HashSet<E::Id> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.id().clone()))
        .collect()
}

/// Deduplicate by id, then stable-sort with the entity's ranking comparator.
///
/// Stability keeps pagination windows deterministic when the same cached data
/// is ranked twice, and makes `rank(rank(x)) == rank(x)`.
pub fn rank<E: CatalogEntity>(items: Vec<E>) -> Vec<E> {
    let mut unique = dedup_by_id(items);
    unique.sort_by(|a, b| a.rank_cmp(b));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Artist, Movie};

    fn artist(id: &str, popularity: Option<u32>) -> Artist {
        Artist {
            id: id.to_string(),
            name: Some(format!("Artist {id}")),
            popularity,
            genres: Vec::new(),
            images: Vec::new(),
            extra: Default::default(),
        }
    }

    fn movie(id: u64, rating: f64, votes: u64) -> Movie {
        Movie {
            id,
            title: None,
            overview: None,
            poster_path: None,
            release_date: None,
            vote_average: Some(rating),
            vote_count: Some(votes),
            extra: Default::default(),
        }
    }

    fn ids(items: &[Artist]) -> Vec<&str> {
        items.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let items = vec![
            artist("a", Some(10)),
            artist("b", Some(20)),
            artist("a", Some(99)),
        ];
        let unique = dedup_by_id(items);

        assert_eq!(ids(&unique), vec!["a", "b"]);
        assert_eq!(unique[0].popularity, Some(10));
    }

    #[test]
    fn test_rank_artists_by_popularity_desc() {
        let items = vec![
            artist("low", Some(5)),
            artist("none", None),
            artist("high", Some(90)),
            artist("mid", Some(50)),
        ];
        let ranked = rank(items);
        assert_eq!(ids(&ranked), vec!["high", "mid", "low", "none"]);
    }

    #[test]
    fn test_rank_is_stable_for_equal_keys() {
        let items = vec![
            artist("first", Some(40)),
            artist("second", Some(40)),
            artist("third", Some(40)),
        ];
        let ranked = rank(items);
        assert_eq!(ids(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_movies_breaks_ties_on_votes() {
        let items = vec![
            movie(1, 8.0, 10),
            movie(2, 8.7, 5),
            movie(3, 8.0, 5000),
            movie(2, 1.0, 1),
        ];
        let ranked = rank(items);
        let order: Vec<u64> = ranked.iter().map(|m| m.id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let items = vec![
            artist("c", Some(3)),
            artist("a", Some(70)),
            artist("b", Some(70)),
            artist("c", Some(100)),
            artist("d", None),
        ];
        let once = rank(items);
        let twice = rank(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rank_empty() {
        let ranked: Vec<Artist> = rank(Vec::new());
        assert!(ranked.is_empty());
    }
}
