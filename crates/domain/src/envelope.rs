//! 消息信封与分类
//!
//! 私信负载是带 `kind` 判别字段的 JSON 信封，携带发送者用户名；
//! 广播负载是原始文本，来源由频道名表示。

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::topic::Topic;
use crate::value_objects::{ChannelName, Username};

/// 私信信封
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectEnvelope {
    pub from: Username,
    pub message: String,
}

/// 线上格式
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireEnvelope {
    Direct { from: String, message: String },
}

/// 兼容没有 `kind` 字段的旧格式 `{"from": .., "message": ..}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IncomingEnvelope {
    Tagged(WireEnvelope),
    Legacy { from: String, message: String },
}

impl DirectEnvelope {
    pub fn new(from: Username, message: impl Into<String>) -> Self {
        Self {
            from,
            message: message.into(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let wire = WireEnvelope::Direct {
            from: self.from.to_string(),
            message: self.message.clone(),
        };
        // 只包含字符串字段，序列化不会失败
        serde_json::to_vec(&wire).unwrap_or_default()
    }

    pub fn decode(topic: &str, payload: &[u8]) -> DomainResult<Self> {
        let incoming: IncomingEnvelope = serde_json::from_slice(payload)
            .map_err(|e| DomainError::decode_error(topic, e.to_string()))?;

        let (from, message) = match incoming {
            IncomingEnvelope::Tagged(WireEnvelope::Direct { from, message }) => (from, message),
            IncomingEnvelope::Legacy { from, message } => (from, message),
        };

        let from = Username::parse(from)
            .map_err(|_| DomainError::decode_error(topic, "发送者为空"))?;
        Ok(Self { from, message })
    }
}

/// 消息来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOrigin {
    /// 来自广播频道
    Broadcast(ChannelName),
    /// 来自其他用户的私信
    Direct(Username),
}

impl MessageOrigin {
    pub fn label(&self) -> &str {
        match self {
            Self::Broadcast(channel) => channel.as_str(),
            Self::Direct(sender) => sender.as_str(),
        }
    }
}

/// 已分类的收件箱消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedMessage {
    pub origin: MessageOrigin,
    pub text: String,
}

impl ClassifiedMessage {
    /// 按主题命名空间对原始负载分类
    pub fn classify(topic: &Topic, payload: &[u8]) -> DomainResult<Self> {
        match topic {
            Topic::Direct(_) => {
                let envelope = DirectEnvelope::decode(&topic.key(), payload)?;
                Ok(Self {
                    origin: MessageOrigin::Direct(envelope.from),
                    text: envelope.message,
                })
            }
            Topic::Channel(channel) => {
                let text = String::from_utf8(payload.to_vec())
                    .map_err(|e| DomainError::decode_error(topic.key(), e.to_string()))?;
                Ok(Self {
                    origin: MessageOrigin::Broadcast(channel.clone()),
                    text,
                })
            }
        }
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.origin, MessageOrigin::Direct(_))
    }
}
