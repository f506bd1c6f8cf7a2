//! Redis 用户存储
//!
//! 键布局：
//! - `user_counter`：全局ID计数器，使用 `INCR` 原子递增
//! - `users:<username>`：用户资料哈希 `{id, name, age, gender, location}`
//! - `channels:<username>`：用户订阅的规范主题键集合

use std::collections::BTreeMap;

use application::{MembershipStore, ProfileStore, StoreError};
use async_trait::async_trait;
use config::KeysConfig;
use domain::ProfileFields;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use crate::redis::{RedisError, RedisResult};

pub struct RedisUserStore {
    connection: MultiplexedConnection,
    keys: KeysConfig,
}

impl RedisUserStore {
    /// 连接 Redis 并创建用户存储
    pub async fn connect(url: &str, keys: KeysConfig) -> RedisResult<Self> {
        let client = Client::open(url).map_err(|e| RedisError::ConfigError {
            message: format!("创建 Redis 客户端失败: {}", e),
        })?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RedisError::ConnectionError {
                message: format!("连接 Redis 失败: {}", e),
            })?;

        info!("Redis 用户存储已连接");
        Ok(Self { connection, keys })
    }

    fn profile_key(&self, username: &str) -> String {
        format!("{}{}", self.keys.profile_prefix, username)
    }

    fn membership_key(&self, username: &str) -> String {
        format!("{}{}", self.keys.membership_prefix, username)
    }
}

#[async_trait]
impl ProfileStore for RedisUserStore {
    async fn next_id(&self) -> Result<u64, StoreError> {
        let mut conn = self.connection.clone();
        let id: u64 = conn
            .incr(&self.keys.counter, 1)
            .await
            .map_err(RedisError::from)?;
        debug!(user_id = id, "分配用户ID");
        Ok(id)
    }

    async fn put_profile(&self, username: &str, fields: &ProfileFields) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .collect();

        let _: () = conn
            .hset_multiple(self.profile_key(username), items.as_slice())
            .await
            .map_err(RedisError::from)?;
        Ok(())
    }

    async fn get_profile(&self, username: &str) -> Result<Option<ProfileFields>, StoreError> {
        let mut conn = self.connection.clone();
        let fields: BTreeMap<String, String> = conn
            .hgetall(self.profile_key(username))
            .await
            .map_err(RedisError::from)?;

        // HGETALL 对不存在的键返回空哈希
        Ok((!fields.is_empty()).then_some(fields))
    }
}

#[async_trait]
impl MembershipStore for RedisUserStore {
    async fn add_membership(&self, username: &str, topic: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let added: i64 = conn
            .sadd(self.membership_key(username), topic)
            .await
            .map_err(RedisError::from)?;
        Ok(added > 0)
    }

    async fn remove_membership(&self, username: &str, topic: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let removed: i64 = conn
            .srem(self.membership_key(username), topic)
            .await
            .map_err(RedisError::from)?;
        Ok(removed > 0)
    }

    async fn is_member(&self, username: &str, topic: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let member: bool = conn
            .sismember(self.membership_key(username), topic)
            .await
            .map_err(RedisError::from)?;
        Ok(member)
    }

    async fn memberships(&self, username: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        let topics: Vec<String> = conn
            .smembers(self.membership_key(username))
            .await
            .map_err(RedisError::from)?;
        Ok(topics)
    }
}
