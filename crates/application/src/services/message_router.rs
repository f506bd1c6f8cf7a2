use std::sync::Arc;

use domain::{DirectEnvelope, DomainError, Topic, UserProfile, Username};

use crate::{broker::Broker, error::ApplicationError, services::IdentityRegistry};

/// 代理接受发布后的确认，不代表任何订阅者已收到
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub topic: Topic,
    /// 代理报告的当前接收者数量，仅供参考
    pub receivers: u32,
}

pub struct MessageRouterDependencies {
    pub sender: Username,
    pub broker: Arc<dyn Broker>,
    pub registry: Arc<IdentityRegistry>,
}

/// 消息路由：把逻辑目的地解析为主题并发布
pub struct MessageRouter {
    deps: MessageRouterDependencies,
}

impl MessageRouter {
    pub fn new(deps: MessageRouterDependencies) -> Self {
        Self { deps }
    }

    /// 发送消息
    ///
    /// 私信会先确认收件人存在且不是自己，再用带发送者的信封包装；
    /// 广播直接发布原始文本，频道不存在（无人订阅）也是合法的。
    pub async fn send(
        &self,
        destination: &str,
        text: &str,
        is_direct: bool,
    ) -> Result<Ack, ApplicationError> {
        let topic = Topic::resolve(destination, is_direct)?;

        let payload = match &topic {
            Topic::Direct(recipient) => {
                self.ensure_recipient(recipient).await?;
                DirectEnvelope::new(self.deps.sender.clone(), text).encode()
            }
            Topic::Channel(_) => text.as_bytes().to_vec(),
        };

        let key = topic.key();
        let receivers = self.deps.broker.publish(&key, &payload).await?;

        tracing::debug!(
            sender = %self.deps.sender,
            topic = %key,
            receivers,
            "消息已发布"
        );

        Ok(Ack { topic, receivers })
    }

    /// 私信前的收件人检查：不能是自己，且必须已注册
    pub async fn check_recipient(&self, recipient: &str) -> Result<UserProfile, ApplicationError> {
        let recipient = Username::parse(recipient)?;
        self.ensure_recipient(&recipient).await
    }

    async fn ensure_recipient(
        &self,
        recipient: &Username,
    ) -> Result<UserProfile, ApplicationError> {
        if recipient == &self.deps.sender {
            return Err(DomainError::self_addressed(recipient.as_str()).into());
        }

        self.deps
            .registry
            .find_profile(recipient)
            .await?
            .ok_or_else(|| DomainError::unknown_recipient(recipient.as_str()).into())
    }
}
