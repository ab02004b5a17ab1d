use crate::model::entry::ConfigEntry;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use log::error;
use std::sync::Arc;

/// A cache API used to make custom cache implementations.
///
/// The cache may be shared between multiple clients (or processes); whatever it returns is
/// treated as the authoritative latest snapshot.
pub trait ConfigCache: Sync + Send {
    /// Gets the actual value from the cache identified by the given `key`.
    fn read(&self, key: &str) -> Option<String>;

    /// Writes the given `value` to the cache by the given `key`.
    fn write(&self, key: &str, value: &str);
}

/// Asynchronous variant of [`ConfigCache`], for stores that need I/O to reach their data.
#[async_trait]
pub trait AsyncConfigCache: Sync + Send {
    /// Gets the actual value from the cache identified by the given `key`.
    async fn read(&self, key: &str) -> Option<String>;

    /// Writes the given `value` to the cache by the given `key`.
    async fn write(&self, key: &str, value: &str);
}

/// A user-supplied cache store.
#[derive(Clone)]
pub(crate) enum CacheStore {
    Sync(Arc<dyn ConfigCache>),
    Async(Arc<dyn AsyncConfigCache>),
}

impl CacheStore {
    async fn read(&self, key: &str) -> Option<String> {
        match self {
            CacheStore::Sync(cache) => cache.read(key),
            CacheStore::Async(cache) => cache.read(key).await,
        }
    }

    async fn write(&self, key: &str, value: &str) {
        match self {
            CacheStore::Sync(cache) => cache.write(key, value),
            CacheStore::Async(cache) => cache.write(key, value).await,
        }
    }
}

struct LatestPayload {
    payload: Option<String>,
    entry: Arc<ConfigEntry>,
}

/// Wraps a [`CacheStore`] and remembers the last payload it saw, so an unchanged payload is
/// not parsed again.
pub(crate) struct ExternalCache {
    store: CacheStore,
    latest: ArcSwap<LatestPayload>,
}

impl ExternalCache {
    fn new(store: CacheStore) -> Self {
        Self {
            store,
            latest: ArcSwap::from_pointee(LatestPayload {
                payload: None,
                entry: Arc::new(ConfigEntry::empty()),
            }),
        }
    }

    async fn get(&self, key: &str) -> Arc<ConfigEntry> {
        let latest = self.latest.load_full();
        let Some(payload) = self.store.read(key).await.filter(|p| !p.is_empty()) else {
            return latest.entry.clone();
        };
        if latest.payload.as_ref() == Some(&payload) {
            return latest.entry.clone();
        }
        match ConfigEntry::from_cache_str(&payload) {
            Ok(entry) if entry.is_older_than(&latest.entry) => {
                // the store lags behind a write that is still in progress, or a writer
                // put an outdated snapshot in it
                self.latest.store(Arc::new(LatestPayload {
                    payload: Some(payload),
                    entry: latest.entry.clone(),
                }));
                latest.entry.clone()
            }
            Ok(entry) => {
                let entry = Arc::new(entry);
                self.latest.store(Arc::new(LatestPayload {
                    payload: Some(payload),
                    entry: entry.clone(),
                }));
                entry
            }
            Err(err) => {
                error!(event_id = 2200; "Error occurred while reading the cache. {err}");
                latest.entry.clone()
            }
        }
    }

    async fn set(&self, key: &str, entry: Arc<ConfigEntry>) {
        if entry.is_empty() {
            self.latest.store(Arc::new(LatestPayload {
                payload: None,
                entry,
            }));
            return;
        }
        let payload = entry.serialize();
        self.latest.store(Arc::new(LatestPayload {
            payload: Some(payload.clone()),
            entry,
        }));
        self.store.write(key, &payload).await;
    }
}

/// The storage the config service reads snapshots from and writes them to.
pub(crate) enum CacheAdapter {
    /// Keeps the snapshot as an object, without serialization.
    InMemory(ArcSwap<ConfigEntry>),
    External(ExternalCache),
}

impl CacheAdapter {
    pub(crate) fn new(store: Option<CacheStore>) -> Self {
        match store {
            Some(store) => CacheAdapter::External(ExternalCache::new(store)),
            None => CacheAdapter::InMemory(ArcSwap::from_pointee(ConfigEntry::empty())),
        }
    }

    /// Returns the latest snapshot, or the empty snapshot when the cache holds nothing usable.
    pub(crate) async fn get(&self, key: &str) -> Arc<ConfigEntry> {
        match self {
            CacheAdapter::InMemory(entry) => entry.load_full(),
            CacheAdapter::External(cache) => cache.get(key).await,
        }
    }

    pub(crate) async fn set(&self, key: &str, entry: Arc<ConfigEntry>) {
        match self {
            CacheAdapter::InMemory(current) => current.store(entry),
            CacheAdapter::External(cache) => cache.set(key, entry).await,
        }
    }
}
