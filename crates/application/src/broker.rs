use async_trait::async_trait;
use thiserror::Error;

/// 代理上报的事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerEventKind {
    /// 真正的消息负载
    Message,
    /// 订阅确认
    Subscribe,
    /// 取消订阅确认
    Unsubscribe,
}

/// 从代理缓冲区取出的原始事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEvent {
    pub topic: String,
    pub payload: Vec<u8>,
    pub kind: BrokerEventKind,
}

impl BrokerEvent {
    pub fn message(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            kind: BrokerEventKind::Message,
        }
    }

    pub fn control(topic: impl Into<String>, kind: BrokerEventKind) -> Self {
        Self {
            topic: topic.into(),
            payload: Vec::new(),
            kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),
    #[error("publish to {topic} failed: {message}")]
    Publish { topic: String, message: String },
    #[error("broker connection closed")]
    Disconnected,
}

impl BrokerError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// 发布/订阅消息代理
///
/// 每个实例对应一条代理连接；订阅只接收订阅之后发布的消息，不回放历史。
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Broker: Send + Sync {
    /// 发布消息，返回代理报告的接收者数量
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<u32, BrokerError>;

    async fn subscribe(&self, topic: &str) -> Result<(), BrokerError>;

    async fn unsubscribe(&self, topic: &str) -> Result<(), BrokerError>;

    /// 取出一条已缓冲的事件，没有时立即返回 `None`，不会等待
    async fn poll_next(&self) -> Result<Option<BrokerEvent>, BrokerError>;
}
