//! Core library for marquee
//!
//! This crate implements the **Functional Core** of the marquee catalog
//! proxy, following the Functional Core - Imperative Shell architectural
//! pattern.
//!
//! # Architecture Overview
//!
//! - **`marquee_core`** (this crate): entity models, ranking and the
//!   arithmetic behind virtual pages, with zero I/O
//! - **`marquee`**: upstream HTTP clients, caches, the async collection and
//!   aggregation pipeline, the HTTP API and the CLI (the Imperative Shell)
//!
//! Everything here is deterministic: the same input always produces the same
//! output, so it is tested with fixture data and no mocking.
//!
//! # Module Organization
//!
//! - [`entity`]: catalog entities (`Movie`, `Artist`), slices and page shapes
//! - [`rank`]: identity deduplication and stable ranking
//! - [`partition`]: query selector resolution and partition keys
//! - [`paging`]: page/offset/batch arithmetic
//! - [`pager`]: per-view pager state machine and navigation links
//! - [`params`]: numeric parameter validation
//! - [`spotify`] and [`tmdb`]: upstream response models and transforms
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use marquee_core::paging::PageRequest;
//! use marquee_core::rank::rank;
//!
//! let request = PageRequest::normalize(Some(3), Some(60));
//! assert_eq!(request.start_index(), 120);
//!
//! let ranked = rank(artists);
//! ```

pub mod entity;
pub mod pager;
pub mod paging;
pub mod params;
pub mod partition;
pub mod rank;
pub mod spotify;
pub mod tmdb;
