use std::sync::Arc;

use futures_util::stream::{self, Stream, TryStreamExt};

use domain::{ClassifiedMessage, Topic, Username};

use crate::{
    broker::{Broker, BrokerEvent, BrokerEventKind},
    error::ApplicationError,
    repository::MembershipStore,
};

pub struct InboxReaderDependencies {
    pub owner: Username,
    pub broker: Arc<dyn Broker>,
    pub membership_store: Arc<dyn MembershipStore>,
}

/// 收件箱读取：把代理中已缓冲的消息一次性取完并分类
pub struct InboxReader {
    deps: InboxReaderDependencies,
}

impl InboxReader {
    pub fn new(deps: InboxReaderDependencies) -> Self {
        Self { deps }
    }

    /// 惰性的快照读取
    ///
    /// 代理报告没有缓冲消息时流结束，不会等待之后的消息。
    /// 控制事件、未知命名空间和无法解码的消息会被跳过。
    pub fn drain(
        &self,
    ) -> impl Stream<Item = Result<ClassifiedMessage, ApplicationError>> + Send + '_ {
        stream::try_unfold(self, |reader| async move {
            reader
                .next_message()
                .await
                .map(|next| next.map(|message| (message, reader)))
        })
    }

    /// 读取全部缓冲消息
    pub async fn drain_all(&self) -> Result<Vec<ClassifiedMessage>, ApplicationError> {
        self.drain().try_collect().await
    }

    async fn next_message(&self) -> Result<Option<ClassifiedMessage>, ApplicationError> {
        while let Some(event) = self.deps.broker.poll_next().await? {
            if let Some(message) = self.classify(event).await? {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    async fn classify(
        &self,
        event: BrokerEvent,
    ) -> Result<Option<ClassifiedMessage>, ApplicationError> {
        if event.kind != BrokerEventKind::Message {
            tracing::trace!(topic = %event.topic, kind = ?event.kind, "跳过控制事件");
            return Ok(None);
        }

        let Some(topic) = Topic::from_key(&event.topic) else {
            tracing::debug!(topic = %event.topic, "跳过未知命名空间的消息");
            return Ok(None);
        };

        // 已离开的主题中残留的消息不再投递
        let owner = self.deps.owner.as_str();
        let store = &self.deps.membership_store;
        if !store.is_member(owner, &event.topic).await? {
            tracing::debug!(username = %owner, topic = %event.topic, "跳过未订阅主题的消息");
            return Ok(None);
        }

        match ClassifiedMessage::classify(&topic, &event.payload) {
            Ok(message) => Ok(Some(message)),
            Err(err) => {
                tracing::warn!(topic = %event.topic, error = %err, "消息解码失败，已跳过");
                Ok(None)
            }
        }
    }
}
