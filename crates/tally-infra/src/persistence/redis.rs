//! Redis snapshot store.
//!
//! Counters live in one hash (`<prefix>:clicks`, country → decimal count) and
//! the epoch in a scalar key (`<prefix>:start_time`, Unix seconds).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, ConnectionInfo, IntoConnectionInfo};
use tokio::sync::OnceCell;

use tally_core::StoreError;
use tally_core::ports::SnapshotStore;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `host:port` or a full `redis://` URL
    pub url: String,
    /// Overrides any password in `url`
    pub password: Option<String>,
    /// Overrides any database index in `url`
    pub db: Option<i64>,
    /// Bound on establishing a connection
    pub connect_timeout: Duration,
    /// Bound on a single command round trip, health pings included
    pub command_timeout: Duration,
    /// Namespace for the counter hash and epoch key
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "localhost:6379".to_string(),
            password: None,
            db: None,
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(5),
            key_prefix: "football".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| "localhost:6379".to_string()),
            password: std::env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()),
            db: std::env::var("REDIS_DB").ok().and_then(|s| s.parse().ok()),
            connect_timeout: Duration::from_secs(positive_secs("REDIS_CONNECT_TIMEOUT_SECS", 5)),
            command_timeout: Duration::from_secs(positive_secs("REDIS_COMMAND_TIMEOUT_SECS", 5)),
            key_prefix: std::env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "football".to_string()),
        }
    }

    fn connection_info(&self) -> Result<ConnectionInfo, StoreError> {
        let url = if self.url.contains("://") {
            self.url.clone()
        } else {
            format!("redis://{}", self.url)
        };

        let mut info = url
            .as_str()
            .into_connection_info()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        if let Some(password) = &self.password {
            info.redis.password = Some(password.clone());
        }
        if let Some(db) = self.db {
            info.redis.db = db;
        }

        Ok(info)
    }
}

fn positive_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}

/// Redis-backed snapshot store.
///
/// The connection is established lazily and then kept by a connection
/// manager, which reconnects on its own. A backend that is down at startup
/// is therefore picked up as soon as it comes back.
///
/// Every command is bounded by `command_timeout`, so a server that accepts
/// the connection and then stops answering fails the call instead of
/// stalling the save loop.
pub struct RedisSnapshotStore {
    client: Client,
    conn: OnceCell<ConnectionManager>,
    config: RedisConfig,
}

impl RedisSnapshotStore {
    /// Validate the configuration. Does not touch the network.
    pub fn new(config: RedisConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.connection_info()?)
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            conn: OnceCell::new(),
            config,
        })
    }

    /// Create from environment configuration.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::new(RedisConfig::from_env())
    }

    fn clicks_key(&self) -> String {
        format!("{}:clicks", self.config.key_prefix)
    }

    fn epoch_key(&self) -> String {
        format!("{}:start_time", self.config.key_prefix)
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let manager_config = ConnectionManagerConfig::new()
                    .set_connection_timeout(self.config.connect_timeout)
                    .set_response_timeout(self.config.command_timeout)
                    .set_number_of_retries(1);

                // Use timeout to prevent hanging if Redis is unreachable
                let conn = tokio::time::timeout(
                    self.config.connect_timeout,
                    ConnectionManager::new_with_config(self.client.clone(), manager_config),
                )
                .await
                .map_err(|_| StoreError::Connection("Connection timed out".to_string()))?
                .map_err(|e| StoreError::Connection(e.to_string()))?;

                tracing::info!(url = %self.config.url, "Connected to Redis snapshot store");
                Ok::<_, StoreError>(conn)
            })
            .await?;

        Ok(conn.clone())
    }
}

fn op_error(e: redis::RedisError) -> StoreError {
    if e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Operation(e.to_string())
    }
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn load_counts(&self) -> Result<HashMap<String, u64>, StoreError> {
        let mut conn = self.connection().await?;
        let key = self.clicks_key();

        let raw: HashMap<String, String> = conn.hgetall(&key).await.map_err(op_error)?;

        let mut counts = HashMap::with_capacity(raw.len());
        for (country, value) in raw {
            match value.parse::<u64>() {
                Ok(count) => {
                    counts.insert(country, count);
                }
                Err(_) => {
                    tracing::warn!(key = %key, country = %country, value = %value, "Skipping unparsable counter");
                }
            }
        }

        Ok(counts)
    }

    async fn save_counts(&self, counts: &HashMap<String, u64>) -> Result<(), StoreError> {
        if counts.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection().await?;
        let items: Vec<(&str, u64)> = counts.iter().map(|(c, n)| (c.as_str(), *n)).collect();

        conn.hset_multiple::<_, _, _, ()>(self.clicks_key(), &items)
            .await
            .map_err(op_error)
    }

    async fn load_epoch(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let mut conn = self.connection().await?;
        let key = self.epoch_key();

        let raw: Option<String> = conn.get(&key).await.map_err(op_error)?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        raw.parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(Some)
            .ok_or(StoreError::Corrupt { key, value: raw })
    }

    async fn save_epoch(&self, epoch: DateTime<Utc>) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;

        conn.set::<_, _, ()>(self.epoch_key(), epoch.timestamp())
            .await
            .map_err(op_error)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let timeout = self.config.connect_timeout + self.config.command_timeout;

        let result = tokio::time::timeout(timeout, async {
            let mut conn = self.connection().await?;
            let _pong: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(op_error)?;
            Ok::<_, StoreError>(())
        })
        .await;

        result.map_err(|_| StoreError::Connection("Ping timed out".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// A server that completes the connection handshake and then never
    /// answers a data command.
    async fn spawn_silent_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    loop {
                        let n = match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        let chunk = String::from_utf8_lossy(&buf[..n]);
                        if chunk.contains("CLIENT") || chunk.contains("SELECT") {
                            let replies = chunk.lines().filter(|l| l.starts_with('*')).count();
                            let _ = socket.write_all("+OK\r\n".repeat(replies).as_bytes()).await;
                        }
                    }
                });
            }
        });

        addr
    }

    fn test_config(prefix: &str) -> RedisConfig {
        RedisConfig {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| "localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
            command_timeout: Duration::from_secs(1),
            key_prefix: prefix.to_string(),
            ..RedisConfig::default()
        }
    }

    async fn get_test_store(prefix: &str) -> Option<RedisSnapshotStore> {
        let store = RedisSnapshotStore::new(test_config(prefix)).ok()?;
        store.ping().await.ok()?;

        // Start from a clean namespace.
        let mut conn = store.connection().await.ok()?;
        conn.del::<_, ()>(vec![store.clicks_key(), store.epoch_key()])
            .await
            .ok()?;
        Some(store)
    }

    #[test]
    fn test_connection_info_overrides() {
        let config = RedisConfig {
            url: "cache.internal:6380".to_string(),
            password: Some("secret".to_string()),
            db: Some(3),
            ..RedisConfig::default()
        };

        let info = config.connection_info().unwrap();
        assert_eq!(info.redis.password.as_deref(), Some("secret"));
        assert_eq!(info.redis.db, 3);
    }

    #[test]
    fn test_full_url_is_accepted() {
        let config = RedisConfig {
            url: "redis://localhost:6379/2".to_string(),
            ..RedisConfig::default()
        };

        assert_eq!(config.connection_info().unwrap().redis.db, 2);
    }

    #[tokio::test]
    async fn test_redis_round_trip() {
        let store = match get_test_store("test_tally_round_trip").await {
            Some(s) => s,
            None => {
                tracing::warn!("Redis not available, skipping test");
                return;
            }
        };

        assert!(store.load_counts().await.unwrap().is_empty());
        assert_eq!(store.load_epoch().await.unwrap(), None);

        let counts = HashMap::from([("Brazil".to_string(), 5), ("Peru".to_string(), 2)]);
        store.save_counts(&counts).await.unwrap();
        assert_eq!(store.load_counts().await.unwrap(), counts);

        let epoch = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        store.save_epoch(epoch).await.unwrap();
        assert_eq!(store.load_epoch().await.unwrap(), Some(epoch));
    }

    #[tokio::test]
    async fn test_redis_corrupt_epoch() {
        let store = match get_test_store("test_tally_corrupt").await {
            Some(s) => s,
            None => return,
        };

        let mut conn = store.connection().await.unwrap();
        conn.set::<_, _, ()>(store.epoch_key(), "yesterday").await.unwrap();

        assert!(matches!(
            store.load_epoch().await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_redis_reports_connection_error() {
        let config = RedisConfig {
            url: "127.0.0.1:1".to_string(),
            connect_timeout: Duration::from_millis(500),
            ..RedisConfig::default()
        };
        let store = RedisSnapshotStore::new(config).unwrap();

        assert!(matches!(store.ping().await, Err(StoreError::Connection(_))));
        assert!(matches!(store.load_counts().await, Err(StoreError::Connection(_))));
    }

    #[tokio::test]
    async fn test_silent_server_fails_commands_within_timeout() {
        let addr = spawn_silent_server().await;
        let store = RedisSnapshotStore::new(RedisConfig {
            url: addr.to_string(),
            connect_timeout: Duration::from_secs(1),
            command_timeout: Duration::from_millis(300),
            ..RedisConfig::default()
        })
        .unwrap();

        let counts = HashMap::from([("Japan".to_string(), 1)]);
        let saved = tokio::time::timeout(Duration::from_secs(10), store.save_counts(&counts))
            .await
            .expect("save_counts must not hang");
        assert!(matches!(saved, Err(StoreError::Connection(_))));

        let loaded = tokio::time::timeout(Duration::from_secs(10), store.load_epoch())
            .await
            .expect("load_epoch must not hang");
        assert!(loaded.is_err());

        assert!(store.ping().await.is_err());
    }
}
