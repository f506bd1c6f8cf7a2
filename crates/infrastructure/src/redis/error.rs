//! Redis 错误类型定义

use application::{BrokerError, StoreError};
use thiserror::Error;

/// Redis 操作错误
#[derive(Error, Debug)]
pub enum RedisError {
    /// 连接错误
    #[error("Redis 连接错误: {message}")]
    ConnectionError { message: String },

    /// 命令执行错误
    #[error("Redis 命令错误: {message}")]
    CommandError { message: String },

    /// 订阅错误
    #[error("Redis 订阅错误: {message}")]
    SubscribeError { message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    ConfigError { message: String },
}

/// Redis 结果类型
pub type RedisResult<T> = Result<T, RedisError>;

impl From<redis::RedisError> for RedisError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::InvalidClientConfig => RedisError::ConfigError {
                message: err.to_string(),
            },
            redis::ErrorKind::IoError => RedisError::ConnectionError {
                message: err.to_string(),
            },
            _ if err.is_connection_dropped() || err.is_connection_refusal() => {
                RedisError::ConnectionError {
                    message: err.to_string(),
                }
            }
            _ => RedisError::CommandError {
                message: err.to_string(),
            },
        }
    }
}

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        StoreError::unavailable(err.to_string())
    }
}

impl From<RedisError> for BrokerError {
    fn from(err: RedisError) -> Self {
        BrokerError::unavailable(err.to_string())
    }
}
