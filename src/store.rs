use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::detector::SongId;
use crate::error::Result;

/// Key holding the whole followed-user mapping.
pub const USERS_KEY: &str = "last_fm_notifier_users";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedUser {
    pub username: String,
    pub last_song_id: Option<SongId>,
}

impl TrackedUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            last_song_id: None,
        }
    }
}

/// Persistence seam for the user registry. Implementations store the full
/// mapping on every save; there is no partial update.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load(&self) -> Result<Vec<TrackedUser>>;
    async fn save(&self, users: &[TrackedUser]) -> Result<()>;
}

/// Encodes users as a JSON object `{ username: song_id | null }`, keeping
/// insertion order.
pub fn encode_users(users: &[TrackedUser]) -> Result<String> {
    let mut map = Map::with_capacity(users.len());
    for user in users {
        let value = match &user.last_song_id {
            Some(song_id) => Value::String(song_id.as_str().to_string()),
            None => Value::Null,
        };
        map.insert(user.username.clone(), value);
    }
    Ok(serde_json::to_string(&map)?)
}

/// Any non-string value loads as "never seen"; older data stored `{}` for a
/// freshly followed user.
pub fn decode_users(json: &str) -> Result<Vec<TrackedUser>> {
    let map: Map<String, Value> = serde_json::from_str(json)?;
    Ok(map
        .into_iter()
        .map(|(username, value)| TrackedUser {
            username,
            last_song_id: match value {
                Value::String(raw) if !raw.is_empty() => Some(SongId::from(raw)),
                _ => None,
            },
        })
        .collect())
}

pub struct RedisUserStore {
    redis: ConnectionManager,
    key: String,
}

impl RedisUserStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            key: USERS_KEY.to_string(),
        }
    }
}

#[async_trait]
impl UserStore for RedisUserStore {
    async fn load(&self) -> Result<Vec<TrackedUser>> {
        let mut conn = self.redis.clone();
        let data: Option<String> = conn.get(&self.key).await?;

        match data {
            Some(json) => decode_users(&json),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, users: &[TrackedUser]) -> Result<()> {
        let mut conn = self.redis.clone();
        let json = encode_users(users)?;
        let _: () = conn.set(&self.key, json).await?;
        Ok(())
    }
}

/// Keeps the encoded mapping in process memory. Used for local runs and tests.
#[derive(Default)]
pub struct MemoryUserStore {
    data: Mutex<Option<String>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            data: Mutex::new(Some(json.into())),
        }
    }

    /// Raw JSON as last written.
    pub async fn snapshot(&self) -> Option<String> {
        self.data.lock().await.clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn load(&self) -> Result<Vec<TrackedUser>> {
        match self.data.lock().await.as_deref() {
            Some(json) => decode_users(json),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, users: &[TrackedUser]) -> Result<()> {
        let json = encode_users(users)?;
        *self.data.lock().await = Some(json);
        Ok(())
    }
}
