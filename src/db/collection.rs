// src/db/collection.rs

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{RwLock, watch};

use crate::common::error::{AppError, StoreError};
use crate::db::local_store::LocalStore;
use crate::db::remote_sync::{RemoteChange, SyncGateway, SyncPolicy};

/// Attempts a mutation gets before giving up on a contended collection.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// An entity kept as one element of a whole-collection snapshot.
pub trait StoredEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Fixed key in local storage.
    const STORAGE_KEY: &'static str;
    /// Path segment under `/api/` on the remote service.
    const RESOURCE: &'static str;

    fn id(&self) -> &str;

    /// Collection used when neither the remote nor the cache has anything.
    fn defaults() -> Vec<Self> {
        Vec::new()
    }

    /// Copies fields that never leave this device from the cached copy of the same entity.
    fn merge_local(&mut self, _cached: &Self) {}
}

/// What readers see: the current items plus load state.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Arc<Vec<T>>,
    pub version: u64,
    pub is_loading: bool,
    pub loaded: bool,
}

impl<T> Snapshot<T> {
    fn empty() -> Self {
        Self { items: Arc::new(Vec::new()), version: 0, is_loading: false, loaded: false }
    }
}

/// Outcome of a mutation closure: the replacement array (`None` leaves the
/// collection untouched), the value handed back to the caller and the change to
/// mirror remotely.
pub struct Mutation<T, R> {
    pub items: Option<Vec<T>>,
    pub output: R,
    pub change: Option<RemoteChange>,
}

impl<T, R> Mutation<T, R> {
    pub fn new(items: Vec<T>, output: R) -> Self {
        Self { items: Some(items), output, change: None }
    }

    pub fn unchanged(output: R) -> Self {
        Self { items: None, output, change: None }
    }

    pub fn mirrored(mut self, change: RemoteChange) -> Self {
        self.change = Some(change);
        self
    }
}

/// Cached array as read back from local storage.
struct Cached<T> {
    items: Vec<T>,
    version: u64,
    readable: bool,
}

/// Where a reconcile took its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
    Defaults,
}

/// A named collection backed by local storage and mirrored, best effort, to the remote.
pub struct Collection<T: StoredEntity> {
    store: Arc<dyn LocalStore>,
    sync: SyncGateway,
    state: RwLock<Snapshot<T>>,
    changes: watch::Sender<u64>,
}

impl<T: StoredEntity> Collection<T> {
    pub fn new(store: Arc<dyn LocalStore>, sync: SyncGateway) -> Self {
        let (changes, _) = watch::channel(0);
        Self { store, sync, state: RwLock::new(Snapshot::empty()), changes }
    }

    pub fn key(&self) -> &'static str {
        T::STORAGE_KEY
    }

    /// Receives the snapshot version every time it changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Current snapshot, loading it on first access.
    pub async fn snapshot(&self) -> Result<Snapshot<T>, AppError> {
        {
            let state = self.state.read().await;
            if state.loaded {
                return Ok(state.clone());
            }
        }
        self.reconcile().await?;
        Ok(self.state.read().await.clone())
    }

    pub async fn items(&self) -> Result<Arc<Vec<T>>, AppError> {
        Ok(self.snapshot().await?.items)
    }

    pub async fn find(&self, id: &str) -> Result<Option<T>, AppError> {
        Ok(self.items().await?.iter().find(|item| item.id() == id).cloned())
    }

    /// Refreshes from the remote, falling back to the local cache and then to defaults.
    pub async fn reconcile(&self) -> Result<LoadSource, AppError> {
        self.state.write().await.is_loading = true;
        let outcome = self.load().await;
        self.state.write().await.is_loading = false;
        outcome
    }

    async fn load(&self) -> Result<LoadSource, AppError> {
        // 1. Remote first
        match self.fetch_remote().await {
            Ok(mut items) => {
                self.carry_local_fields(&mut items).await?;
                self.overwrite_cache(items).await?;
                tracing::info!("{} refreshed from remote", T::STORAGE_KEY);
                return Ok(LoadSource::Remote);
            }
            Err(e) if self.sync.policy() == SyncPolicy::Strict => return Err(e),
            Err(e) => tracing::warn!("{} remote fetch failed, using local data: {}", T::STORAGE_KEY, e),
        }

        // 2. Local cache
        if let Some(cached) = self.read_cache().await? {
            self.publish(cached.items, cached.version).await;
            return Ok(if cached.readable { LoadSource::Cache } else { LoadSource::Defaults });
        }

        // 3. Nothing anywhere
        self.publish(T::defaults(), 0).await;
        Ok(LoadSource::Defaults)
    }

    async fn fetch_remote(&self) -> Result<Vec<T>, AppError> {
        let value = self.sync.fetch(T::RESOURCE).await?;
        serde_json::from_value(value)
            .map_err(|e| crate::common::error::SyncError::Decode(e.to_string()).into())
    }

    /// Reads the cached array. An unreadable payload is logged and replaced by the
    /// defaults at its stored version, so the next write overwrites it.
    async fn read_cache(&self) -> Result<Option<Cached<T>>, AppError> {
        let Some(stored) = self.store.read(T::STORAGE_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<T>>(&stored.payload) {
            Ok(items) => Ok(Some(Cached { items, version: stored.version, readable: true })),
            Err(source) => {
                let error = StoreError::Corrupt { key: T::STORAGE_KEY.to_string(), source };
                tracing::error!("{}, falling back to defaults", error);
                Ok(Some(Cached { items: T::defaults(), version: stored.version, readable: false }))
            }
        }
    }

    async fn carry_local_fields(&self, items: &mut [T]) -> Result<(), AppError> {
        let Some(cached) = self.read_cache().await? else {
            return Ok(());
        };
        let by_id: HashMap<&str, &T> = cached.items.iter().map(|item| (item.id(), item)).collect();
        for item in items.iter_mut() {
            if let Some(local) = by_id.get(item.id()) {
                item.merge_local(local);
            }
        }
        Ok(())
    }

    // Remote data replaces whatever the cache holds, whatever its version.
    async fn overwrite_cache(&self, items: Vec<T>) -> Result<(), AppError> {
        let payload = serialize(&items)?;
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let current = self.store.read(T::STORAGE_KEY).await?.map(|v| v.version).unwrap_or(0);
            match self.store.write(T::STORAGE_KEY, current, &payload).await {
                Ok(version) => {
                    self.publish(items, version).await;
                    return Ok(());
                }
                Err(StoreError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::Conflict(T::STORAGE_KEY))
    }

    // Versions only move forward; a writer that stalled after persisting loses to a newer publish.
    async fn publish(&self, items: Vec<T>, version: u64) {
        {
            let mut state = self.state.write().await;
            if state.loaded && version < state.version {
                tracing::debug!("{} skipped stale v{} (at v{})", T::STORAGE_KEY, version, state.version);
                return;
            }
            state.items = Arc::new(items);
            state.version = version;
            state.loaded = true;
        }
        self.changes.send_replace(version);
    }

    /// Read-validate-write cycle shared by every mutation.
    ///
    /// `apply` sees the whole current collection and either fails (nothing is written)
    /// or returns the full replacement array. The write is a compare-and-swap on the
    /// version `apply` saw; if another writer got there first the cycle is repeated
    /// against the fresh data, so validation always runs against what gets replaced.
    pub async fn mutate<R, F>(&self, mut apply: F) -> Result<R, AppError>
    where
        F: FnMut(&[T]) -> Result<Mutation<T, R>, AppError>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let snapshot = self.snapshot().await?;
            let Mutation { items, output, change } = apply(&snapshot.items)?;
            let Some(items) = items else {
                return Ok(output);
            };

            if let Some(change) = change {
                self.sync.mirror(change).await?;
            }

            match self.persist(snapshot.version, items).await {
                Ok(()) => return Ok(output),
                Err(AppError::Storage(StoreError::VersionConflict { expected, found, .. })) => {
                    tracing::warn!(
                        "{} changed during update (attempt {}, expected v{}, found v{}), retrying",
                        T::STORAGE_KEY,
                        attempt,
                        expected,
                        found
                    );
                    self.refresh_from_cache().await?;
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::Conflict(T::STORAGE_KEY))
    }

    /// Serializes the full array and writes it if the stored version is still `expected_version`.
    pub async fn persist(&self, expected_version: u64, items: Vec<T>) -> Result<(), AppError> {
        let payload = serialize(&items)?;
        let version = self.store.write(T::STORAGE_KEY, expected_version, &payload).await?;
        self.publish(items, version).await;
        Ok(())
    }

    async fn refresh_from_cache(&self) -> Result<(), AppError> {
        if let Some(cached) = self.read_cache().await? {
            self.publish(cached.items, cached.version).await;
        }
        Ok(())
    }
}

fn serialize<T: Serialize>(items: &[T]) -> Result<String, AppError> {
    serde_json::to_string(items).map_err(|e| AppError::InternalServerError(e.into()))
}

/// Converts an entity into the camelCase body mirrored to the remote.
pub fn remote_body<T: Serialize>(entity: &T) -> serde_json::Value {
    serde_json::to_value(entity).unwrap_or(serde_json::Value::Null)
}
