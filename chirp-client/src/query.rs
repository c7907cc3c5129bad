//! Keyed cache of query results with invalidation and change subscriptions.
//!
//! Each [`QueryKey`] owns one entry: the registered fetcher, the last good
//! result, whether a fetch is in flight, whether the result is stale, and the
//! subscribers observing it. Invalidating a key marks it stale, tells its
//! subscribers, and refetches.

use crate::api::{self, ApiError};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use thiserror::Error;
use tracing::{debug, warn};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<api::Result<T>> + Send + Sync>;

/// Callback invoked on every change to a subscribed entry.
pub type QueryHandler = Arc<dyn Fn(QueryEvent) + Send + Sync>;

/// Identity of a query, e.g. `posts.getAll`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct QueryKey(&'static str);

impl QueryKey {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct SubscriptionId(u64);

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum QueryEvent {
    /// A fetch was issued.
    Fetching,
    /// The latest fetch finished, successfully or not.
    Settled,
    /// The result was marked stale; a refetch follows.
    Invalidated,
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum QueryError {
    #[error("No fetcher is registered for query {0}")]
    Unregistered(QueryKey),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Point-in-time view of one cache entry.
#[derive(Clone, Debug)]
pub struct QuerySnapshot<T> {
    pub data: Option<Arc<T>>,
    pub fetching: bool,
    pub stale: bool,
    /// At least one fetch has settled.
    pub fetched: bool,
    pub last_error: Option<ApiError>,
}

impl<T> QuerySnapshot<T> {
    fn empty() -> Self {
        Self {
            data: None,
            fetching: false,
            stale: false,
            fetched: false,
            last_error: None,
        }
    }
}

struct Entry<T> {
    fetcher: Option<Fetcher<T>>,
    data: Option<Arc<T>>,
    fetching: bool,
    stale: bool,
    fetched: bool,
    last_error: Option<ApiError>,
    generation: u64,
    subscribers: Vec<(SubscriptionId, QueryHandler)>,
}

impl<T> Entry<T> {
    fn new() -> Self {
        Self {
            fetcher: None,
            data: None,
            fetching: false,
            stale: false,
            fetched: false,
            last_error: None,
            generation: 0,
            subscribers: Vec::new(),
        }
    }

    fn handlers(&self) -> Vec<QueryHandler> {
        self.subscribers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    fn snapshot(&self) -> QuerySnapshot<T> {
        QuerySnapshot {
            data: self.data.clone(),
            fetching: self.fetching,
            stale: self.stale,
            fetched: self.fetched,
            last_error: self.last_error.clone(),
        }
    }
}

fn emit(handlers: Vec<QueryHandler>, event: QueryEvent) {
    for handler in handlers {
        handler(event);
    }
}

pub struct QueryCache<T> {
    entries: Mutex<HashMap<QueryKey, Entry<T>>>,
    next_subscription: AtomicU64,
}

impl<T: Send + Sync + 'static> QueryCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Install the fetcher for `key`, replacing any previous one.
    pub fn register<F, Fut>(&self, key: QueryKey, fetcher: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = api::Result<T>> + Send + 'static,
    {
        let fetcher: Fetcher<T> = Arc::new(move || -> BoxFuture<api::Result<T>> {
            Box::pin(fetcher())
        });
        self.entries
            .lock()
            .entry(key)
            .or_insert_with(Entry::new)
            .fetcher = Some(fetcher);
    }

    #[must_use]
    pub fn snapshot(&self, key: QueryKey) -> QuerySnapshot<T> {
        self.entries
            .lock()
            .get(&key)
            .map_or_else(QuerySnapshot::empty, Entry::snapshot)
    }

    pub fn subscribe<F>(&self, key: QueryKey, handler: F) -> SubscriptionId
    where
        F: Fn(QueryEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .entry(key)
            .or_insert_with(Entry::new)
            .subscribers
            .push((id, Arc::new(handler)));
        id
    }

    /// Returns whether a subscription was removed.
    pub fn unsubscribe(&self, key: QueryKey, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&key) else {
            return false;
        };
        let before = entry.subscribers.len();
        entry.subscribers.retain(|(existing, _)| *existing != id);
        entry.subscribers.len() != before
    }

    /// Fetch unless there is a fresh result or a fetch already in flight.
    pub async fn ensure(&self, key: QueryKey) -> Result<(), QueryError> {
        let needs_fetch = {
            let entries = self.entries.lock();
            let entry = entries
                .get(&key)
                .filter(|entry| entry.fetcher.is_some())
                .ok_or(QueryError::Unregistered(key))?;
            !entry.fetching && (entry.data.is_none() || entry.stale)
        };

        if needs_fetch {
            self.fetch(key).await?;
        }
        Ok(())
    }

    /// Run the fetcher for `key` and store its result.
    ///
    /// A result is only stored if no newer fetch was issued for the same key
    /// in the meantime. A failed fetch keeps the previous data.
    pub async fn fetch(&self, key: QueryKey) -> Result<Arc<T>, QueryError> {
        let (fetcher, generation, handlers) = {
            let mut entries = self.entries.lock();
            let entry = entries.get_mut(&key).ok_or(QueryError::Unregistered(key))?;
            let fetcher = entry
                .fetcher
                .clone()
                .ok_or(QueryError::Unregistered(key))?;
            entry.generation += 1;
            entry.fetching = true;
            (fetcher, entry.generation, entry.handlers())
        };

        debug!(query = %key, generation, "Fetching query");
        emit(handlers, QueryEvent::Fetching);

        let result = fetcher().await.map(Arc::new);

        let handlers = {
            let mut entries = self.entries.lock();
            match entries.get_mut(&key) {
                Some(entry) if entry.generation == generation => {
                    entry.fetching = false;
                    entry.fetched = true;
                    match &result {
                        Ok(data) => {
                            entry.data = Some(Arc::clone(data));
                            entry.stale = false;
                            entry.last_error = None;
                        }
                        Err(err) => {
                            warn!(query = %key, error = %err, "Query failed");
                            entry.last_error = Some(err.clone());
                        }
                    }
                    entry.handlers()
                }
                _ => {
                    debug!(query = %key, generation, "Discarding superseded query result");
                    Vec::new()
                }
            }
        };

        emit(handlers, QueryEvent::Settled);
        Ok(result?)
    }

    /// Mark the result for `key` stale, tell subscribers once, and refetch.
    pub async fn invalidate(&self, key: QueryKey) -> Result<(), QueryError> {
        let handlers = {
            let mut entries = self.entries.lock();
            let entry = entries
                .get_mut(&key)
                .filter(|entry| entry.fetcher.is_some())
                .ok_or(QueryError::Unregistered(key))?;
            entry.stale = true;
            entry.handlers()
        };

        debug!(query = %key, "Invalidating query");
        emit(handlers, QueryEvent::Invalidated);

        self.fetch(key).await?;
        Ok(())
    }
}

impl<T: Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
