//! Remote cache backend (C2, spec §4.1), backed by Redis.
//!
//! Values are serialized as self-describing JSON blobs and written
//! with `SETEX`. TTL introspection for [`CacheBackend::get_metadata`]
//! comes straight from Redis's own `TTL` command, so the remote and
//! in-memory backends never disagree about how many seconds remain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bracket_core::cache::{CacheBackend, CacheError, CacheMetadata, CachedValue};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const MAX_CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_BACKOFF_CAP: Duration = Duration::from_secs(2);

/// A single stored value plus the timestamp it was written at, so
/// that `created_at` survives a round trip through Redis (which only
/// natively tracks remaining TTL, not absolute creation time).
#[derive(serde::Serialize, serde::Deserialize)]
struct StoredValue {
    value: serde_json::Value,
    created_at_unix_ms: u128,
}

/// Remote cache backend (C2). Tracks its own connection state and
/// fails fast rather than blocking when disconnected: a lost
/// connection is repaired by a single background reconnect task, never
/// by the calling operation.
pub struct RedisCacheBackend {
    client: Client,
    conn: Arc<RwLock<Option<ConnectionManager>>>,
    reconnecting: Arc<AtomicBool>,
}

impl RedisCacheBackend {
    /// Connect to `redis_url`, retrying per spec §4.1's policy: up to
    /// 3 attempts, exponential backoff capped at 2s.
    ///
    /// # Errors
    /// Returns [`CacheError::Unavailable`] if every connection
    /// attempt fails.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Unavailable(format!("invalid redis url: {e}")))?;

        let conn = Self::connect_with_retry(&client).await?;
        Ok(Self {
            client,
            conn: Arc::new(RwLock::new(Some(conn))),
            reconnecting: Arc::new(AtomicBool::new(false)),
        })
    }

    async fn connect_with_retry(client: &Client) -> Result<ConnectionManager, CacheError> {
        let mut last_err = None;
        for attempt in 0..MAX_CONNECT_ATTEMPTS {
            match ConnectionManager::new(client.clone()).await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    let delay = Duration::from_millis(250 * 2u64.pow(attempt)).min(CONNECT_BACKOFF_CAP);
                    warn!(attempt, error = %e, delay_ms = delay.as_millis(), "redis connect attempt failed");
                    last_err = Some(e);
                    if attempt + 1 < MAX_CONNECT_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(CacheError::Unavailable(format!(
            "redis connection failed after {MAX_CONNECT_ATTEMPTS} attempts: {}",
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Return the current connection, or fail fast if disconnected.
    ///
    /// Never blocks on a reconnect itself; instead it kicks off a
    /// single background reconnect attempt (if one isn't already in
    /// flight) and returns [`CacheError::Unavailable`] immediately so
    /// callers don't queue up behind a retry storm.
    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        if let Some(conn) = self.conn.read().await.clone() {
            return Ok(conn);
        }
        self.spawn_reconnect();
        Err(CacheError::Unavailable(
            "redis connection not available, reconnecting in background".to_string(),
        ))
    }

    fn spawn_reconnect(&self) {
        if self
            .reconnecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let client = self.client.clone();
        let conn_slot = Arc::clone(&self.conn);
        let reconnecting = Arc::clone(&self.reconnecting);
        tokio::spawn(async move {
            match Self::connect_with_retry(&client).await {
                Ok(conn) => {
                    *conn_slot.write().await = Some(conn);
                    debug!("redis background reconnect succeeded");
                }
                Err(e) => {
                    warn!(error = %e, "redis background reconnect failed, will retry on next access");
                }
            }
            reconnecting.store(false, Ordering::SeqCst);
        });
    }

    async fn mark_disconnected(&self) {
        *self.conn.write().await = None;
        self.spawn_reconnect();
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<CachedValue>, CacheError> {
        let mut conn = self.connection().await?;
        let raw: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Fault(format!("GET failed: {e}")))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let stored: StoredValue = serde_json::from_slice(&raw)
            .map_err(|e| CacheError::Fault(format!("corrupt cache blob: {e}")))?;

        let ttl_secs: i64 = redis::cmd("TTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Fault(format!("TTL failed: {e}")))?;
        if ttl_secs <= 0 {
            // Expired between GET and TTL, or Redis's own eviction raced us.
            return Ok(None);
        }

        let created_at = SystemTime::UNIX_EPOCH
            + Duration::from_millis(stored.created_at_unix_ms as u64);
        let expires_at = SystemTime::now() + Duration::from_secs(ttl_secs.unsigned_abs());

        Ok(Some(CachedValue {
            value: stored.value,
            created_at,
            expires_at,
        }))
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl_seconds: i64,
    ) -> Result<(), CacheError> {
        if ttl_seconds <= 0 {
            return Err(CacheError::InvalidTtl);
        }
        let created_at_unix_ms = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let stored = StoredValue {
            value,
            created_at_unix_ms,
        };
        let blob = serde_json::to_vec(&stored)
            .map_err(|e| CacheError::Fault(format!("serialize failed: {e}")))?;

        let mut conn = self.connection().await?;
        let result: Result<(), redis::RedisError> =
            conn.set_ex(key, blob, ttl_seconds.unsigned_abs()).await;
        if let Err(e) = result {
            self.mark_disconnected().await;
            return Err(CacheError::Fault(format!("SETEX failed: {e}")));
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: i64 = conn
            .del(key)
            .await
            .map_err(|e| CacheError::Fault(format!("DEL failed: {e}")))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let exists: bool = conn
            .exists(key)
            .await
            .map_err(|e| CacheError::Fault(format!("EXISTS failed: {e}")))?;
        Ok(exists)
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<CacheMetadata>, CacheError> {
        let Some(cached) = self.get(key).await? else {
            return Ok(None);
        };
        let ttl_seconds = cached
            .expires_at
            .duration_since(SystemTime::now())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Ok(Some(CacheMetadata {
            key: key.to_string(),
            ttl_seconds,
            created_at: cached.created_at,
            expires_at: cached.expires_at,
        }))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Fault(format!("FLUSHDB failed: {e}")))?;
        Ok(())
    }

    async fn close(&self) {
        *self.conn.write().await = None;
        debug!("redis cache backend closed");
    }

    fn name(&self) -> &str {
        "redis"
    }
}
