use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::pagination::Page;

/// Where a list controller gets its pages from.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Clone + Send + Sync + 'static;
    /// Parameters that identify the list (search terms, movie id, ...).
    type Query: Clone + Send + Sync + 'static;

    async fn fetch_page(
        &self,
        query: &Self::Query,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<Self::Item>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T, Q> {
    pub items: Vec<T>,
    pub query: Q,
    /// Last page applied; 0 until the first successful fetch.
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
    seq: u64,
}

impl<T, Q> ListState<T, Q> {
    fn new(query: Q) -> Self {
        Self {
            items: Vec::new(),
            query,
            page: 0,
            total_pages: 0,
            total_items: 0,
            has_more: false,
            loading: false,
            error: None,
            seq: 0,
        }
    }

    fn reset(&mut self) {
        self.items.clear();
        self.page = 0;
        self.total_pages = 0;
        self.total_items = 0;
        self.has_more = false;
        self.loading = false;
        self.error = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied; `received` items came back.
    Applied { received: usize },
    /// Another fetch was already in flight, nothing was sent.
    Skipped,
    /// A newer request superseded this one; its response was dropped.
    Stale,
}

/// Paginated list state plus the operations views call on it.
///
/// State lives in a `watch` channel so views can subscribe; it is only
/// touched synchronously, never across an `.await`.
pub struct ListController<S: PageSource> {
    source: S,
    page_size: u32,
    state: watch::Sender<ListState<S::Item, S::Query>>,
}

impl<S: PageSource> ListController<S> {
    pub fn new(source: S, page_size: u32, query: S::Query) -> Self {
        let (state, _) = watch::channel(ListState::new(query));
        Self {
            source,
            page_size: page_size.max(1),
            state,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> ListState<S::Item, S::Query> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<S::Item> {
        self.state.borrow().items.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<S::Item, S::Query>> {
        self.state.subscribe()
    }

    /// Fetches `page`, appending to or replacing the current items.
    pub async fn fetch(&self, page: u32, append: bool) -> ApiResult<FetchOutcome> {
        let page = page.max(1);
        let mut issued = None;
        self.state.send_if_modified(|s| {
            if s.loading {
                return false;
            }
            s.loading = true;
            s.seq += 1;
            issued = Some((s.seq, s.query.clone()));
            true
        });
        let Some((seq, query)) = issued else {
            debug!(page, "Fetch skipped, another request is in flight");
            return Ok(FetchOutcome::Skipped);
        };
        let _pending = Pending {
            state: &self.state,
            seq,
        };

        let result = self.source.fetch_page(&query, page, self.page_size).await;

        let mut outcome = Ok(FetchOutcome::Stale);
        self.state.send_if_modified(|s| {
            if s.seq != seq {
                return false;
            }
            s.loading = false;
            outcome = apply(s, result, page, append);
            true
        });
        if matches!(outcome, Ok(FetchOutcome::Stale)) {
            debug!(page, seq, "Dropped response superseded by a newer request");
        }
        outcome
    }

    /// Starts over with new parameters. Any in-flight request is fenced off
    /// and its response ignored.
    pub async fn set_query(&self, query: S::Query) -> ApiResult<FetchOutcome> {
        self.state.send_modify(|s| {
            s.seq += 1;
            s.query = query;
            s.reset();
        });
        self.fetch(1, false).await
    }

    pub async fn load_first(&self) -> ApiResult<FetchOutcome> {
        self.fetch(1, false).await
    }

    pub async fn load_more(&self) -> ApiResult<FetchOutcome> {
        let next = {
            let s = self.state.borrow();
            if !s.has_more || s.loading {
                None
            } else {
                Some(s.page + 1)
            }
        };
        match next {
            Some(page) => self.fetch(page, true).await,
            None => Ok(FetchOutcome::Skipped),
        }
    }

    /// Jumps to `page`, replacing the shown items. Clicking the current page
    /// or a page out of range does nothing.
    pub async fn change_page(&self, page: u32) -> ApiResult<FetchOutcome> {
        let allowed = {
            let s = self.state.borrow();
            page >= 1 && page != s.page && (s.total_pages == 0 || page <= s.total_pages)
        };
        if !allowed {
            return Ok(FetchOutcome::Skipped);
        }
        self.fetch(page, false).await
    }

    pub async fn reload(&self) -> ApiResult<FetchOutcome> {
        let page = self.state.borrow().page.max(1);
        self.fetch(page, false).await
    }

    /// Drops items locally, e.g. a favorite removed from its own list.
    pub fn retain(&self, keep: impl FnMut(&S::Item) -> bool) {
        self.state.send_modify(|s| {
            let before = s.items.len();
            s.items.retain(keep);
            let removed = (before - s.items.len()) as u64;
            s.total_items = s.total_items.saturating_sub(removed);
        });
    }
}

/// Clears `loading` if the fetch that set it is dropped before its response
/// is applied.
struct Pending<'a, T, Q> {
    state: &'a watch::Sender<ListState<T, Q>>,
    seq: u64,
}

impl<T, Q> Drop for Pending<'_, T, Q> {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| {
            if s.seq != self.seq || !s.loading {
                return false;
            }
            s.loading = false;
            true
        });
    }
}

fn apply<T, Q>(
    s: &mut ListState<T, Q>,
    result: ApiResult<Page<T>>,
    page: u32,
    append: bool,
) -> ApiResult<FetchOutcome> {
    match result {
        Ok(fetched) => {
            let received = fetched.items.len();
            s.has_more = fetched.has_more();
            s.total_pages = fetched.pagination.total_pages;
            s.total_items = fetched.pagination.total_items;
            s.page = page;
            s.error = None;
            if append {
                s.items.extend(fetched.items);
            } else {
                s.items = fetched.items;
            }
            Ok(FetchOutcome::Applied { received })
        }
        Err(err) => {
            warn!("Failed to fetch page {}: {}", page, err);
            s.error = Some(err.user_message());
            Err(err)
        }
    }
}
