use chrono::{DateTime, Utc};
use moka::{sync::Cache as MemoryCache, Expiry};
use redis::AsyncCommands;
use redis::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Display;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::{CatalogId, MediaType, TimeWindow};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Trending {
        media_type: MediaType,
        time_window: TimeWindow,
        page: u32,
    },
    Details(MediaType, CatalogId),
    WatchProviders(MediaType, CatalogId),
    ImdbId(MediaType, CatalogId),
    Awards(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Trending {
                media_type,
                time_window,
                page,
            } => write!(
                f,
                "trending:{}:{}:{}",
                media_type,
                time_window.as_str(),
                page
            ),
            CacheKey::Details(media_type, id) => write!(f, "details:{}:{}", media_type, id),
            CacheKey::WatchProviders(media_type, id) => {
                write!(f, "providers:{}:{}", media_type, id)
            }
            CacheKey::ImdbId(media_type, id) => write!(f, "imdb:{}:{}", media_type, id),
            CacheKey::Awards(imdb_id) => write!(f, "awards:{}", imdb_id.to_lowercase()),
        }
    }
}

/// A cached value and the time it was fetched
///
/// Freshness is decided by the reader against its own TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, ttl_secs: u64, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.fetched_at);
        age.num_seconds() < ttl_secs as i64
    }

    /// Seconds left before the entry outlives `ttl_secs`, zero once expired
    fn remaining_secs(&self, ttl_secs: u64, now: DateTime<Utc>) -> u64 {
        let age = now.signed_duration_since(self.fetched_at).num_seconds().max(0) as u64;
        ttl_secs.saturating_sub(age)
    }
}

/// Default entry bound for the in-process backend
pub const DEFAULT_MEMORY_CAPACITY: u64 = 10_000;

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

#[derive(Clone)]
struct MemoryEntry {
    json: String,
    expires_in: Duration,
}

/// Expires each in-process entry after the TTL it was written with
struct MemoryExpiry;

impl Expiry<String, MemoryEntry> for MemoryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &MemoryEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expires_in)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &MemoryEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_in)
    }
}

#[derive(Clone)]
enum CacheBackend {
    Memory(MemoryCache<String, MemoryEntry>),
    Redis {
        client: Client,
        write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
    },
}

/// Response cache handed explicitly to the fetch layer
///
/// Values are stored as JSON-encoded [`CacheEntry`] records, either in a
/// bounded in-process cache or in Redis. Both backends drop an entry once the
/// TTL it was written with has elapsed since `fetched_at`.
#[derive(Clone)]
pub struct Cache {
    backend: CacheBackend,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task, which flushes pending writes
    /// to Redis before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a process-local cache with the default capacity
    pub fn in_memory() -> Self {
        Self::in_memory_with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    /// Creates a process-local cache holding at most `max_capacity` entries
    pub fn in_memory_with_capacity(max_capacity: u64) -> Self {
        let entries = MemoryCache::builder()
            .max_capacity(max_capacity)
            .expire_after(MemoryExpiry)
            .build();

        Self {
            backend: CacheBackend::Memory(entries),
        }
    }

    /// Creates a Redis-backed cache with an async write background task
    ///
    /// Writes go through a channel so cache operations never block API responses.
    pub async fn redis(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            backend: CacheBackend::Redis {
                client: redis_client,
                write_tx,
            },
        };

        (cache, CacheWriterHandle { shutdown_tx })
    }

    /// Picks the backend from an optional Redis URL
    pub async fn from_url(
        redis_url: Option<&str>,
        memory_capacity: u64,
    ) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        match redis_url {
            Some(url) => {
                let client = create_redis_client(url)?;
                let (cache, handle) = Self::redis(client).await;
                tracing::info!("Using Redis response cache");
                Ok((cache, Some(handle)))
            }
            None => {
                tracing::info!(
                    capacity = memory_capacity,
                    "REDIS_URL not set, using in-memory response cache"
                );
                Ok((Self::in_memory_with_capacity(memory_capacity), None))
            }
        }
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown signal, flushes all remaining messages before exiting.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");
        let mut pending_writes = 0;

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    pending_writes += 1;
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    } else {
                        pending_writes -= 1;
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!(
                        pending = pending_writes,
                        "Cache writer shutting down, flushing remaining writes"
                    );

                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(
                                error = %e,
                                "Failed to flush cache write during shutdown"
                            );
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves an entry from the cache by key
    ///
    /// Returns the entry regardless of age; callers check [`CacheEntry::is_fresh`].
    pub async fn get_from_cache<T: DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<CacheEntry<T>>> {
        let cached: Option<String> = match &self.backend {
            CacheBackend::Memory(entries) => entries.get(&key.to_string()).map(|e| e.json),
            CacheBackend::Redis { client, .. } => {
                let mut conn = client.get_multiplexed_async_connection().await?;
                conn.get(key.to_string()).await?
            }
        };

        match cached {
            Some(json) => {
                let entry = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Stores a value stamped with the current time without blocking
    ///
    /// The Redis backend hands the write to a background worker. The memory
    /// backend writes in place. Either way `ttl` bounds how long the entry is kept.
    pub fn set_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let entry = CacheEntry {
            value,
            fetched_at: Utc::now(),
        };
        self.insert_entry(key, &entry, ttl);
    }

    /// Stores an entry with its own `fetched_at` stamp
    ///
    /// An entry already older than `ttl` is not stored.
    pub fn insert_entry<T: Serialize>(&self, key: &CacheKey, entry: &CacheEntry<T>, ttl: u64) {
        let remaining = entry.remaining_secs(ttl, Utc::now());
        if remaining == 0 {
            tracing::debug!(key = %key, "Entry already expired, not caching");
            return;
        }

        let json = match serde_json::to_string(entry) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        match &self.backend {
            CacheBackend::Memory(entries) => {
                let entry = MemoryEntry {
                    json,
                    expires_in: Duration::from_secs(remaining),
                };
                entries.insert(key.to_string(), entry);
            }
            CacheBackend::Redis { write_tx, .. } => {
                let msg = CacheWriteMessage {
                    key: key.to_string(),
                    value: json,
                    ttl: remaining,
                };

                if let Err(e) = write_tx.send(msg) {
                    tracing::error!(error = %e, "Failed to send cache write message");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_entry_count(cache: &Cache) -> u64 {
        match &cache.backend {
            CacheBackend::Memory(entries) => {
                entries.run_pending_tasks();
                entries.entry_count()
            }
            CacheBackend::Redis { .. } => panic!("expected memory backend"),
        }
    }

    #[test]
    fn test_cache_key_display_trending() {
        let key = CacheKey::Trending {
            media_type: MediaType::Tv,
            time_window: TimeWindow::Week,
            page: 2,
        };
        assert_eq!(format!("{}", key), "trending:tv:week:2");
    }

    #[test]
    fn test_cache_key_display_providers() {
        let key = CacheKey::WatchProviders(MediaType::Movie, CatalogId::Numeric(27205));
        assert_eq!(format!("{}", key), "providers:movie:27205");
    }

    #[test]
    fn test_cache_key_display_awards_lowercase() {
        let key = CacheKey::Awards("TT1375666".to_string());
        assert_eq!(format!("{}", key), "awards:tt1375666");
    }

    #[test]
    fn test_entry_freshness() {
        let now = Utc::now();
        let entry = CacheEntry {
            value: 1,
            fetched_at: now - chrono::Duration::seconds(30),
        };
        assert!(entry.is_fresh(60, now));
        assert!(!entry.is_fresh(30, now));
        assert!(!entry.is_fresh(10, now));
    }

    #[tokio::test]
    async fn test_memory_cache_miss() {
        let cache = Cache::in_memory();
        let key = CacheKey::Awards("tt0000001".to_string());
        let retrieved: Option<CacheEntry<Vec<String>>> = cache.get_from_cache(&key).await.unwrap();
        assert!(retrieved.is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache = Cache::in_memory();
        let key = CacheKey::Details(MediaType::Tv, CatalogId::Numeric(1396));
        let value = vec!["a".to_string(), "b".to_string()];

        cache.set_in_background(&key, &value, 60);

        let entry: CacheEntry<Vec<String>> = cache.get_from_cache(&key).await.unwrap().unwrap();
        assert_eq!(entry.value, value);
        assert!(entry.is_fresh(60, Utc::now()));
    }

    #[tokio::test]
    async fn test_stale_entry_is_returned_for_caller_to_judge() {
        let cache = Cache::in_memory();
        let key = CacheKey::Awards("tt42".to_string());
        let old = CacheEntry {
            value: 7u32,
            fetched_at: Utc::now() - chrono::Duration::hours(2),
        };
        cache.insert_entry(&key, &old, 3 * 3600);

        let entry: CacheEntry<u32> = cache.get_from_cache(&key).await.unwrap().unwrap();
        assert_eq!(entry.value, 7);
        assert!(!entry.is_fresh(3600, Utc::now()));
    }

    #[tokio::test]
    async fn test_entries_past_their_ttl_are_not_kept() {
        let cache = Cache::in_memory();
        for id in 0..500u64 {
            let key = CacheKey::Details(MediaType::Movie, CatalogId::Numeric(id));
            let old = CacheEntry {
                value: id,
                fetched_at: Utc::now() - chrono::Duration::days(30),
            };
            cache.insert_entry(&key, &old, 1);
        }

        let key = CacheKey::Details(MediaType::Movie, CatalogId::Numeric(1));
        let entry: Option<CacheEntry<u64>> = cache.get_from_cache(&key).await.unwrap();
        assert!(entry.is_none());
        assert_eq!(memory_entry_count(&cache), 0);
    }

    #[tokio::test]
    async fn test_memory_entries_expire() {
        let cache = Cache::in_memory();
        let key = CacheKey::ImdbId(MediaType::Tv, CatalogId::Numeric(1396));
        cache.set_in_background(&key, &"tt0903747", 1);

        let entry: Option<CacheEntry<String>> = cache.get_from_cache(&key).await.unwrap();
        assert!(entry.is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let entry: Option<CacheEntry<String>> = cache.get_from_cache(&key).await.unwrap();
        assert!(entry.is_none());
        assert_eq!(memory_entry_count(&cache), 0);
    }

    #[tokio::test]
    async fn test_memory_cache_is_bounded() {
        let cache = Cache::in_memory_with_capacity(10);
        for id in 0..200u64 {
            let key = CacheKey::WatchProviders(MediaType::Tv, CatalogId::Numeric(id));
            cache.set_in_background(&key, &id, 3600);
        }

        assert!(memory_entry_count(&cache) <= 10);
    }
}
