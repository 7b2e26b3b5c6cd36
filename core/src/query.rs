//! Coalescing query cache.
//!
//! # Design
//! One `QueryCache` per endpoint, keyed by (scope, params) where scope is
//! the effective base URL at call time — reconfiguring the host partitions
//! the cache instead of serving another tenant's entries. Entries are
//! `watch` channels: an in-flight fetch is a channel still in `Loading`,
//! a settled fetch is the channel's final value. Subscribing to an existing
//! entry is what coalesces identical concurrent requests into one network
//! call. Fetches run as spawned tasks, so dropping every `Query` handle
//! does not abort the request; the settled value lands in the cache either
//! way. Tags are declared per cache and logged, but nothing invalidates
//! them.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::error::ApiError;

/// Cache tag taxonomy. Declared and attached per endpoint; no code path
/// invalidates by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Post,
    LatestPosts,
    TopPosts,
    SearchPosts,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Post => "Post",
            Tag::LatestPosts => "LatestPosts",
            Tag::TopPosts => "TopPosts",
            Tag::SearchPosts => "SearchPosts",
        }
    }
}

/// Observed state of one query: loading, or settled with data or an error.
#[derive(Debug, Clone)]
pub enum QueryState<V> {
    Loading,
    Ready(V),
    Failed(ApiError),
}

impl<V> QueryState<V> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&V> {
        match self {
            QueryState::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Subscription handle to one cached query.
///
/// `state` gives the current snapshot without suspending; `resolve` awaits
/// the terminal state. Dropping the handle does not cancel the underlying
/// fetch.
#[derive(Debug, Clone)]
pub struct Query<V> {
    rx: watch::Receiver<QueryState<V>>,
}

impl<V: Clone> Query<V> {
    pub fn state(&self) -> QueryState<V> {
        self.rx.borrow().clone()
    }

    /// Await the settled value, sharing the outcome of whichever fetch this
    /// handle is subscribed to.
    pub async fn resolve(mut self) -> Result<V, ApiError> {
        loop {
            let settled = match &*self.rx.borrow_and_update() {
                QueryState::Ready(v) => Some(Ok(v.clone())),
                QueryState::Failed(e) => Some(Err(e.clone())),
                QueryState::Loading => None,
            };
            if let Some(result) = settled {
                return result;
            }
            if self.rx.changed().await.is_err() {
                // the cache entry was dropped before the fetch settled
                return Err(ApiError::Network(
                    "query dropped before settling".to_string(),
                ));
            }
        }
    }
}

type Entries<K, V> = Arc<Mutex<HashMap<(String, K), watch::Receiver<QueryState<V>>>>>;

/// Per-endpoint cache of query results, coalescing identical concurrent
/// fetches into one network call.
#[derive(Debug, Clone)]
pub struct QueryCache<K, V> {
    tag: Tag,
    entries: Entries<K, V>,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The tag this cache was declared with.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Return the cached entry for (scope, key), subscribing to it if a
    /// fetch is still in flight, or start a new fetch otherwise.
    ///
    /// `fetcher` runs only on a miss, as a spawned task; the caller must be
    /// inside a Tokio runtime. Settled errors are cached and shared exactly
    /// like successes.
    pub fn fetch<F, Fut>(&self, scope: &str, key: K, fetcher: F) -> Query<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let map_key = (scope.to_string(), key);
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(rx) = entries.get(&map_key) {
            tracing::debug!(tag = self.tag.as_str(), scope, "cache hit");
            return Query { rx: rx.clone() };
        }

        tracing::debug!(tag = self.tag.as_str(), scope, "cache miss, fetching");
        let (tx, rx) = watch::channel(QueryState::Loading);
        entries.insert(map_key, rx.clone());
        drop(entries);

        let fut = fetcher();
        tokio::spawn(async move {
            let state = match fut.await {
                Ok(value) => QueryState::Ready(value),
                Err(err) => QueryState::Failed(err),
            };
            // the cache keeps a receiver alive, so this cannot fail; even
            // if every subscriber is gone the settled value is retained
            let _ = tx.send(state);
        });

        Query { rx }
    }

    /// Drop the entry for (scope, key) and fetch it fresh. In-flight
    /// subscribers of the old entry still receive the old fetch's outcome.
    pub fn refetch<F, Fut>(&self, scope: &str, key: K, fetcher: F) -> Query<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(scope.to_string(), key.clone()));
        self.fetch(scope, key, fetcher)
    }
}
