//! Paginated list-fetch/merge.
//!
//! A [`PagedList`] accumulates pages from a [`PageSource`] for infinite-scroll style
//! screens. Its invariant: the accumulated list never holds two entries with the same key.
//! A record fetched again replaces the earlier copy in place.
//!
//! Fetches run outside the state lock. A single in-flight flag, checked and set under the
//! lock, makes [`PagedList::load_more`] a no-op while another request is outstanding. A
//! refresh always proceeds and bumps a generation counter so that a load-more still in
//! flight is discarded when it lands. Dropping the list cancels its outstanding request.

use crate::{
    api::{CancelToken, Page, PageInfo},
    errors::{Error, Result},
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, warn};

/// Records with a unique identity
pub trait Keyed {
    /// Identity type
    type Key: Eq + Hash + Clone;

    /// The record's identity.
    fn key(&self) -> Self::Key;
}

/// Something that can fetch numbered pages of `T`
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Fetches page `page` (1-based), aborting when `cancel` fires.
    async fn fetch_page(&self, page: u32, cancel: &CancelToken) -> Result<Page<T>>;
}

/// Result of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was applied
    Loaded {
        /// Records not present before this page
        added: usize,
        /// Size of the accumulated list afterwards
        total: usize,
    },
    /// Nothing was requested: a fetch is in flight or no more pages exist
    Skipped,
    /// The response arrived after a refresh replaced the list and was discarded
    Superseded,
}

/// Snapshot of a paginated list
#[derive(Debug, Clone, PartialEq)]
pub struct PageState<T> {
    /// Last page applied, 0 before the first load
    pub page: u32,
    /// Accumulated records, unique by key
    pub items: Vec<T>,
    /// Metadata of the last applied page
    pub meta: Option<PageInfo>,
    /// A replacing load is in flight
    pub loading: bool,
    /// An appending load is in flight
    pub loading_more: bool,
    /// Message of the last failed load
    pub error: Option<String>,
    /// Records rejected by schema validation across applied pages
    pub rejected: usize,
    last_page_len: Option<usize>,
    generation: u64,
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        Self {
            page: 0,
            items: Vec::new(),
            meta: None,
            loading: false,
            loading_more: false,
            error: None,
            rejected: 0,
            last_page_len: None,
            generation: 0,
        }
    }
}

impl<T: Keyed> PageState<T> {
    /// Whether a request is outstanding.
    #[must_use]
    pub const fn in_flight(&self) -> bool {
        self.loading || self.loading_more
    }

    /// Whether another page may exist.
    ///
    /// Uses the metadata when present; without metadata a non-empty last page means more
    /// may exist. Before the first load there is always more.
    #[must_use]
    pub fn has_more(&self) -> bool {
        match (&self.meta, self.last_page_len) {
            (Some(info), _) => info.has_more(),
            (None, Some(len)) => len > 0,
            (None, None) => true,
        }
    }

    /// Applies a fetched page. Returns the number of records that were not present before.
    pub fn apply(&mut self, page_number: u32, page: Page<T>, append: bool) -> usize {
        self.page = page_number;
        self.meta = page.info;
        self.last_page_len = Some(page.items.len());
        self.error = None;
        if append {
            self.rejected += page.rejected;
            merge_by_key(&mut self.items, page.items)
        } else {
            self.rejected = page.rejected;
            self.items.clear();
            merge_by_key(&mut self.items, page.items)
        }
    }
}

/// Merges `incoming` into `existing` by key.
///
/// Records already present are overwritten in place; new records are appended in arrival
/// order. Duplicates within `incoming` collapse to the last one. Returns the number of
/// records appended.
pub fn merge_by_key<T: Keyed>(existing: &mut Vec<T>, incoming: Vec<T>) -> usize {
    let mut index: HashMap<T::Key, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, item)| (item.key(), i))
        .collect();
    let before = existing.len();

    for item in incoming {
        let key = item.key();
        if let Some(&slot) = index.get(&key) {
            existing[slot] = item;
        } else {
            index.insert(key, existing.len());
            existing.push(item);
        }
    }

    existing.len() - before
}

/// Incrementally loaded list over a [`PageSource`]
pub struct PagedList<T, S> {
    source: S,
    state: Mutex<PageState<T>>,
    cancel: CancelToken,
}

impl<T, S> PagedList<T, S>
where
    T: Keyed + Clone + Send,
    S: PageSource<T>,
{
    /// Creates an empty list; nothing is fetched until [`refresh`](Self::refresh) or
    /// [`load`](Self::load).
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(PageState::default()),
            cancel: CancelToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PageState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PageState<T> {
        self.lock().clone()
    }

    /// Copy of the accumulated records.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Whether another page may exist.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.lock().has_more()
    }

    /// Fetches `page` and replaces (`append = false`) or merges into the list.
    ///
    /// An appending load is skipped while another request is in flight. A replacing load
    /// always runs and supersedes whatever is in flight. On failure the list is left as it
    /// was and the error message is recorded in the state.
    pub async fn load(&self, page: u32, append: bool) -> Result<LoadOutcome> {
        let generation = {
            let mut state = self.lock();
            if append {
                if state.in_flight() {
                    debug!(page, "Skipping load: request already in flight");
                    return Ok(LoadOutcome::Skipped);
                }
                state.loading_more = true;
            } else {
                state.generation += 1;
                state.loading = true;
                state.loading_more = false;
            }
            state.generation
        };

        let fetched = self.source.fetch_page(page, &self.cancel).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(page, "Discarding page fetched before the latest refresh");
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;
        state.loading_more = false;

        match fetched {
            Ok(fetched) => {
                let added = state.apply(page, fetched, append);
                debug!(page, added, total = state.items.len(), "Applied page");
                Ok(LoadOutcome::Loaded {
                    added,
                    total: state.items.len(),
                })
            }
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                warn!(page, error = %e, "Failed to load page");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replaces the list with page 1.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        self.load(1, false).await
    }

    /// Appends the next page, unless a request is in flight or no more pages exist.
    pub async fn load_more(&self) -> Result<LoadOutcome> {
        let next = {
            let state = self.lock();
            if state.in_flight() || !state.has_more() {
                return Ok(LoadOutcome::Skipped);
            }
            state.page + 1
        };
        self.load(next, true).await
    }

    /// Cancels the outstanding request, if any.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl<T, S> Drop for PagedList<T, S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    impl Keyed for Row {
        type Key = u32;
        fn key(&self) -> u32 {
            self.id
        }
    }

    fn rows(ids: std::ops::RangeInclusive<u32>, label: &'static str) -> Vec<Row> {
        ids.map(|id| Row { id, label }).collect()
    }

    /// Serves `total` rows, `per_page` at a time, with range metadata.
    struct RangeSource {
        total: u32,
        per_page: u32,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl PageSource<Row> for RangeSource {
        async fn fetch_page(&self, page: u32, cancel: &CancelToken) -> Result<Page<Row>> {
            if let Some(gate) = &self.gate {
                tokio::select! {
                    () = gate.notified() => {}
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                }
            }
            let from = (page - 1) * self.per_page + 1;
            let to = (page * self.per_page).min(self.total);
            let items = if from > self.total {
                Vec::new()
            } else {
                rows(from..=to, "fetched")
            };
            Ok(Page {
                items,
                info: Some(PageInfo::Range {
                    from: Some(u64::from(from)),
                    to: u64::from(to),
                    total: u64::from(self.total),
                }),
                rejected: 0,
            })
        }
    }

    /// Serves scripted pages without metadata; fails on page numbers it has no script for.
    struct ScriptedSource {
        pages: Vec<Vec<Row>>,
    }

    #[async_trait]
    impl PageSource<Row> for ScriptedSource {
        async fn fetch_page(&self, page: u32, _cancel: &CancelToken) -> Result<Page<Row>> {
            self.pages
                .get(page as usize - 1)
                .cloned()
                .map(Page::unpaged)
                .ok_or_else(|| Error::Http {
                    message: "connection reset".to_string(),
                })
        }
    }

    #[tokio::test]
    async fn test_three_page_scenario() -> Result<()> {
        let list = PagedList::new(RangeSource {
            total: 25,
            per_page: 10,
            gate: None,
        });

        list.refresh().await?;
        assert_eq!(list.items().len(), 10);
        assert!(list.has_more());

        list.load_more().await?;
        assert_eq!(list.items().len(), 20);
        assert!(list.has_more());

        list.load_more().await?;
        assert_eq!(list.items().len(), 25);
        assert!(!list.has_more());

        assert_eq!(list.load_more().await?, LoadOutcome::Skipped);
        Ok(())
    }

    #[test]
    fn test_merge_overwrites_in_place_and_never_duplicates() {
        let mut items = rows(1..=3, "old");
        let added = merge_by_key(
            &mut items,
            vec![
                Row { id: 2, label: "new" },
                Row { id: 4, label: "new" },
                Row { id: 4, label: "newer" },
            ],
        );

        assert_eq!(added, 1);
        assert_eq!(
            items.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(items[1].label, "new");
        assert_eq!(items[3].label, "newer");
    }

    #[tokio::test]
    async fn test_refresh_fully_replaces() -> Result<()> {
        let list = PagedList::new(ScriptedSource {
            pages: vec![rows(1..=2, "first")],
        });
        list.load(1, false).await?;
        list.load(1, true).await?;
        assert_eq!(list.items().len(), 2);

        {
            let mut state = list.lock();
            state.items.push(Row { id: 99, label: "stale" });
        }
        list.refresh().await?;
        let ids: Vec<u32> = list.items().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_has_more_without_meta_follows_page_emptiness() -> Result<()> {
        let list = PagedList::new(ScriptedSource {
            pages: vec![rows(1..=2, "a"), Vec::new()],
        });
        assert!(list.has_more(), "fresh list may always load");

        list.refresh().await?;
        assert!(list.has_more());

        let outcome = list.load_more().await?;
        assert_eq!(outcome, LoadOutcome::Loaded { added: 0, total: 2 });
        assert!(!list.has_more());
        assert_eq!(list.load_more().await?, LoadOutcome::Skipped);
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_keeps_items_and_records_error() -> Result<()> {
        let list = PagedList::new(ScriptedSource {
            pages: vec![rows(1..=3, "a")],
        });
        list.refresh().await?;

        let result = list.load(2, true).await;
        assert!(result.is_err());

        let state = list.snapshot();
        assert_eq!(state.items.len(), 3);
        assert_eq!(state.page, 1);
        assert!(state.error.as_deref().unwrap().contains("connection reset"));
        assert!(!state.in_flight());
        Ok(())
    }

    #[tokio::test]
    async fn test_load_more_is_skipped_while_in_flight() -> Result<()> {
        let gate = Arc::new(Notify::new());
        let list = PagedList::new(RangeSource {
            total: 25,
            per_page: 10,
            gate: Some(Arc::clone(&gate)),
        });

        let (first, second, ()) = tokio::join!(list.load_more(), list.load_more(), async {
            gate.notify_one();
        });

        assert_eq!(first?, LoadOutcome::Loaded { added: 10, total: 10 });
        assert_eq!(second?, LoadOutcome::Skipped);
        assert_eq!(list.items().len(), 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_supersedes_in_flight_load_more() -> Result<()> {
        let gate = Arc::new(Notify::new());
        let list = PagedList::new(RangeSource {
            total: 25,
            per_page: 10,
            gate: Some(Arc::clone(&gate)),
        });

        let (stale, fresh, ()) = tokio::join!(list.load(2, true), list.refresh(), async {
            gate.notify_one();
            tokio::task::yield_now().await;
            gate.notify_one();
        });

        let outcomes = [stale?, fresh?];
        assert!(outcomes.contains(&LoadOutcome::Superseded));
        let ids: Vec<u32> = list.items().iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_aborts_outstanding_request() {
        let gate = Arc::new(Notify::new());
        let list = PagedList::new(RangeSource {
            total: 25,
            per_page: 10,
            gate: Some(gate),
        });

        let (result, ()) = tokio::join!(list.refresh(), async {
            list.cancel();
        });

        assert!(matches!(result, Err(Error::Cancelled)));
        let state = list.snapshot();
        assert!(!state.in_flight());
        assert!(state.error.is_none());
    }
}
