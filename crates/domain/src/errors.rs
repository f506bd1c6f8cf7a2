//! 领域模型错误定义
//!
//! 定义了聊天核心中所有可恢复的错误类型，提供清晰的错误上下文。
//! 存储和消息代理的故障属于基础设施错误，不在这里定义。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 输入校验失败（空名字、非法年龄、无法识别的地点等）
    #[error("验证失败: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// 给自己发送私信
    #[error("不能给自己发送私信: {username}")]
    SelfAddressed { username: String },

    /// 私信目标用户不存在
    #[error("用户不存在: {username}")]
    UnknownRecipient { username: String },

    /// 消息负载无法解码
    #[error("消息解码失败: {topic}: {message}")]
    DecodeError { topic: String, message: String },

    /// 存储中的用户记录格式不正确
    #[error("用户记录损坏: {key}: {message}")]
    InvalidRecord { key: String, message: String },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn self_addressed(username: impl Into<String>) -> Self {
        Self::SelfAddressed {
            username: username.into(),
        }
    }

    pub fn unknown_recipient(username: impl Into<String>) -> Self {
        Self::UnknownRecipient {
            username: username.into(),
        }
    }

    /// 创建解码错误
    pub fn decode_error(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DecodeError {
            topic: topic.into(),
            message: message.into(),
        }
    }

    pub fn invalid_record(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
