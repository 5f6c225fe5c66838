//! View pager state machine
//!
//! One [`PagerState`] exists per paginated view. It moves through
//! `Idle -> Loading -> {Idle, Error}`; a load requested while another one is
//! in flight is refused, and a result whose total no longer covers the
//! requested page triggers exactly one reload of the last available page.

use crate::paging::{total_pages, DEFAULT_PAGE_SIZE};
use serde::Serialize;

/// Default number of page links shown in the navigation window
pub const DEFAULT_LINK_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "message", rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Error(String),
}

/// Error returned by [`PagerState::begin`] while a load is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy;

impl std::fmt::Display for Busy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A page load is already in progress")
    }
}

impl std::error::Error for Busy {}

/// What the caller must do after handing a result to [`PagerState::complete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// State updated; render the items starting at absolute index `offset`.
    Applied { page: usize, offset: usize },
    /// Requested page is past the end; load `page` instead.
    Reload { page: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerState {
    pub page_size: usize,
    pub current_page: usize,
    pub total_results: usize,
    pub total_pages: usize,
    pub phase: Phase,
}

impl PagerState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: if page_size > 0 {
                page_size
            } else {
                DEFAULT_PAGE_SIZE
            },
            current_page: 1,
            total_results: 0,
            total_pages: 1,
            phase: Phase::Idle,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Enter `Loading` for `page` (clamped to at least 1).
    pub fn begin(&mut self, page: usize) -> Result<usize, Busy> {
        if self.is_loading() {
            return Err(Busy);
        }
        self.phase = Phase::Loading;
        Ok(page.max(1))
    }

    /// Apply a page result for `requested`.
    ///
    /// `allow_reload` is false on the corrective second request so the
    /// controller never loops. A `Reload` leaves the state in `Loading`.
    pub fn complete(
        &mut self,
        requested: usize,
        item_count: usize,
        total_results: Option<usize>,
        allow_reload: bool,
    ) -> Completion {
        let total = total_results.unwrap_or(item_count);
        let pages = total_pages(total, self.page_size);

        if allow_reload && requested > pages {
            // stays Loading: the corrective request belongs to the same load
            return Completion::Reload { page: pages };
        }

        self.total_results = total;
        self.total_pages = pages;
        self.current_page = requested.min(pages).max(1);
        self.phase = Phase::Idle;

        Completion::Applied {
            page: self.current_page,
            offset: (self.current_page - 1) * self.page_size,
        }
    }

    /// Record a failed load. Navigation is cleared until the next success.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = Phase::Error(message.into());
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether navigating to `page` should start a load.
    pub fn accepts(&self, page: usize) -> bool {
        !self.is_loading()
            && page >= 1
            && page <= self.total_pages
            && page != self.current_page
    }

    /// Navigation links for the current state; empty after an error.
    pub fn links(&self, window_size: usize) -> Vec<PageLink> {
        if matches!(self.phase, Phase::Error(_)) {
            return Vec::new();
        }
        page_links(self.current_page, self.total_pages, window_size)
    }
}

/// One element of the page navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageLink {
    Page { number: usize, active: bool },
    Gap,
}

fn link(number: usize, current: usize) -> PageLink {
    PageLink::Page {
        number,
        active: number == current,
    }
}

/// Build a navigation bar: first page, a sliding interior window around
/// `current`, last page, and gaps where pages are skipped.
///
/// `window_size` counts every numbered link and is at least 3, so the
/// current page always has a link of its own.
pub fn page_links(current: usize, total: usize, window_size: usize) -> Vec<PageLink> {
    if total <= 1 {
        return vec![link(1, 1)];
    }

    let max_links = window_size.max(3);
    if total <= max_links {
        return (1..=total).map(|n| link(n, current)).collect();
    }

    let interior = max_links - 2;
    let mut start = current.saturating_sub(interior / 2).max(2);
    let mut end = start + interior - 1;

    if end >= total {
        end = total - 1;
        start = end + 1 - interior;
    }
    if start <= 2 {
        start = 2;
        end = start + interior - 1;
    }
    if end >= total {
        end = total - 1;
    }

    let mut links = vec![link(1, current)];
    if start > 2 {
        links.push(PageLink::Gap);
    }
    links.extend((start..=end).map(|n| link(n, current)));
    if end < total - 1 {
        links.push(PageLink::Gap);
    }
    links.push(link(total, current));
    links
}
