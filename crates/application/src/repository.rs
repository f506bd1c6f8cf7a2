use async_trait::async_trait;
use domain::ProfileFields;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("record {key} is missing")]
    MissingRecord { key: String },
    #[error("record {key} is corrupt: {message}")]
    CorruptRecord { key: String, message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 原子递增全局计数器并返回新值
    async fn next_id(&self) -> Result<u64, StoreError>;

    async fn put_profile(&self, username: &str, fields: &ProfileFields) -> Result<(), StoreError>;

    async fn get_profile(&self, username: &str) -> Result<Option<ProfileFields>, StoreError>;
}

/// 每个用户一个主题集合，记录其订阅的规范主题键
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// 返回是否新加入
    async fn add_membership(&self, username: &str, topic: &str) -> Result<bool, StoreError>;

    /// 返回是否确实移除
    async fn remove_membership(&self, username: &str, topic: &str) -> Result<bool, StoreError>;

    async fn is_member(&self, username: &str, topic: &str) -> Result<bool, StoreError>;

    async fn memberships(&self, username: &str) -> Result<Vec<String>, StoreError>;
}
