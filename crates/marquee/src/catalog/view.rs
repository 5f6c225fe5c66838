//! Per-view page controller
//!
//! Wraps a [`VirtualPager`] with the view's [`PagerState`]. Only one load
//! runs at a time: a load requested while another is in flight is dropped,
//! not queued.

use super::{SearchProvider, VirtualPager};
use crate::prelude::*;
use marquee_core::pager::{Busy, Completion, PageLink, PagerState};
use marquee_core::paging::PageRequest;
use marquee_core::partition::QuerySelector;
use std::sync::{Arc, Mutex, MutexGuard};

/// A successfully loaded page
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage<E> {
    pub items: Vec<E>,
    pub page: usize,
    /// Absolute index of the first item, for numbering
    pub offset: usize,
    pub state: PagerState,
}

#[derive(Debug)]
pub enum LoadOutcome<E> {
    Loaded(LoadedPage<E>),
    /// Another load was in flight; nothing happened.
    Busy,
    Failed(Error),
}

#[derive(Debug)]
pub struct ViewController<P: SearchProvider> {
    pager: Arc<VirtualPager<P>>,
    market: Option<String>,
    selector: QuerySelector,
    state: Mutex<PagerState>,
}

impl<P: SearchProvider> ViewController<P> {
    pub fn new(
        pager: Arc<VirtualPager<P>>,
        page_size: usize,
        market: Option<String>,
        selector: QuerySelector,
    ) -> Self {
        Self {
            pager,
            market,
            selector,
            state: Mutex::new(PagerState::new(page_size)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PagerState> {
        // the state is plain data, a poisoned lock still holds a usable value
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> PagerState {
        self.lock().clone()
    }

    pub fn links(&self, window_size: usize) -> Vec<PageLink> {
        self.lock().links(window_size)
    }

    /// Load `page`, correcting once to the last page if the result shows the
    /// request was past the end.
    pub async fn load(&self, page: usize) -> LoadOutcome<P::Entity> {
        let (mut target, page_size) = {
            let mut state = self.lock();
            match state.begin(page) {
                Ok(target) => (target, state.page_size),
                Err(Busy) => {
                    log::debug!("page {page} ignored, a load is already running");
                    return LoadOutcome::Busy;
                }
            }
        };
        let mut allow_reload = true;

        loop {
            let request = PageRequest {
                page: target,
                page_size,
            };
            let result = self
                .pager
                .page(request, self.market.as_deref(), &self.selector)
                .await;

            let mut state = self.lock();
            let page = match result {
                Ok(page) => page,
                Err(err) => {
                    state.fail(err.to_string());
                    return LoadOutcome::Failed(err);
                }
            };

            match state.complete(target, page.items.len(), Some(page.total_results), allow_reload) {
                Completion::Reload { page: last } => {
                    log::debug!("page {target} is past the end, loading page {last}");
                    target = last;
                    allow_reload = false;
                }
                Completion::Applied { page: current, offset } => {
                    return LoadOutcome::Loaded(LoadedPage {
                        items: page.items,
                        page: current,
                        offset,
                        state: state.clone(),
                    });
                }
            }
        }
    }

    pub async fn next(&self) -> Option<LoadOutcome<P::Entity>> {
        let state = self.state();
        if state.is_loading() || !state.has_next() {
            return None;
        }
        Some(self.load(state.current_page + 1).await)
    }

    pub async fn prev(&self) -> Option<LoadOutcome<P::Entity>> {
        let state = self.state();
        if state.is_loading() || !state.has_prev() {
            return None;
        }
        Some(self.load(state.current_page - 1).await)
    }

    /// Jump to `page` if it is a valid, different page.
    pub async fn goto(&self, page: usize) -> Option<LoadOutcome<P::Entity>> {
        if !self.lock().accepts(page) {
            return None;
        }
        Some(self.load(page).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::MockProvider;
    use crate::catalog::SliceCache;
    use crate::config::CacheSettings;
    use marquee_core::pager::Phase;
    use marquee_core::partition::CatalogConfig;
    use tokio::sync::Semaphore;

    fn controller(provider: &MockProvider, page_size: usize) -> ViewController<MockProvider> {
        let pager = VirtualPager::new(
            Arc::new(provider.clone()),
            Arc::new(SliceCache::new(CacheSettings::default())),
            CatalogConfig {
                provider_max_batch: 50,
                default_market: "US".to_string(),
                default_query: "genre:pop".to_string(),
                configured_partitions: Vec::new(),
            },
        );
        ViewController::new(Arc::new(pager), page_size, None, QuerySelector::Absent)
    }

    fn loaded<E: std::fmt::Debug>(outcome: LoadOutcome<E>) -> LoadedPage<E> {
        match outcome {
            LoadOutcome::Loaded(page) => page,
            other => panic!("expected a loaded page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_first_page() {
        let provider = MockProvider::new().with_partition("genre:pop", 130);
        let view = controller(&provider, 60);

        let page = loaded(view.load(1).await);

        assert_eq!(page.items.len(), 60);
        assert_eq!(page.offset, 0);
        assert_eq!(page.state.total_pages, 3);
        assert_eq!(page.state.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_past_the_end_reloads_last_page_once() {
        let provider = MockProvider::new().with_partition("genre:pop", 130);
        let view = controller(&provider, 60);

        let page = loaded(view.load(9).await);

        assert_eq!(page.page, 3);
        assert_eq!(page.offset, 120);
        assert_eq!(page.items.len(), 10);
    }

    #[tokio::test]
    async fn test_concurrent_load_is_rejected() {
        let gate = Arc::new(Semaphore::new(0));
        let provider = MockProvider::new()
            .with_partition("genre:pop", 130)
            .with_gate(gate.clone());
        let view = controller(&provider, 60);

        let second = async {
            tokio::task::yield_now().await;
            let outcome = view.load(2).await;
            gate.add_permits(100);
            outcome
        };
        let (first, second) = tokio::join!(view.load(1), second);

        assert!(matches!(second, LoadOutcome::Busy));
        assert_eq!(loaded(first).page, 1);
        assert_eq!(view.state().current_page, 1);
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_clears_links() {
        let provider = MockProvider::new().with_failing_partition("genre:pop");
        let view = controller(&provider, 60);

        let outcome = view.load(1).await;

        assert!(matches!(outcome, LoadOutcome::Failed(Error::Upstream(_))));
        assert!(matches!(view.state().phase, Phase::Error(_)));
        assert!(view.links(5).is_empty());
    }

    #[tokio::test]
    async fn test_navigation() {
        let provider = MockProvider::new().with_partition("genre:pop", 130);
        let view = controller(&provider, 60);

        assert!(view.prev().await.is_none());
        loaded(view.load(1).await);
        assert!(view.prev().await.is_none());

        let page = loaded(view.next().await.unwrap());
        assert_eq!(page.page, 2);

        let page = loaded(view.goto(3).await.unwrap());
        assert_eq!(page.page, 3);
        assert!(view.next().await.is_none());
        assert!(view.goto(3).await.is_none());
        assert!(view.goto(4).await.is_none());

        let page = loaded(view.prev().await.unwrap());
        assert_eq!(page.page, 2);
    }
}
