//! Redis Ephemeral Store
//!
//! All short-lived auth state lives here under per-key TTLs. The
//! connection manager multiplexes one connection and reconnects on its
//! own; we clone the handle per call.

use std::time::Duration;

use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::debug;

use crate::domain::store::EphemeralStore;
use crate::error::{AuthError, AuthResult};

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect and wait for the first ping
    pub async fn connect(url: &str) -> AuthResult<Self> {
        let client = redis::Client::open(url).map_err(store_err)?;
        let conn = ConnectionManager::new(client).await.map_err(store_err)?;
        Ok(Self { conn })
    }
}

fn store_err(err: redis::RedisError) -> AuthError {
    AuthError::TransientStore(err.to_string())
}

impl EphemeralStore for RedisStore {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(store_err)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        // SET with EX wants whole seconds; never round down to zero
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(store_err)?;
        debug!(key, ttl_secs = seconds, "ephemeral entry written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AuthResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await.map_err(store_err)?;
        Ok(removed > 0)
    }
}
