use std::sync::Arc;

use domain::{ChannelName, DomainError, Topic, Username};

use crate::{broker::Broker, error::ApplicationError, repository::MembershipStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    AlreadySubscribed,
    Subscribed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    NotSubscribed,
    Unsubscribed,
}

pub struct SubscriptionManagerDependencies {
    pub owner: Username,
    pub broker: Arc<dyn Broker>,
    pub membership_store: Arc<dyn MembershipStore>,
}

/// 订阅管理：维护用户的主题集合，并在代理上订阅/取消订阅。
///
/// 用户自己的私信收件箱在会话开始时订阅，之后无法离开：`leave` 只接受频道名。
pub struct SubscriptionManager {
    deps: SubscriptionManagerDependencies,
}

impl SubscriptionManager {
    pub fn new(deps: SubscriptionManagerDependencies) -> Self {
        Self { deps }
    }

    pub fn owner(&self) -> &Username {
        &self.deps.owner
    }

    /// 加入主题，重复加入不做任何事
    ///
    /// 私信收件箱只有所有者本人可以订阅。
    pub async fn join(
        &self,
        topic_name: &str,
        is_direct: bool,
    ) -> Result<JoinOutcome, ApplicationError> {
        let topic = Topic::resolve(topic_name, is_direct)?;
        if matches!(&topic, Topic::Direct(inbox) if inbox != &self.deps.owner) {
            tracing::warn!(
                username = %self.deps.owner,
                topic = %topic,
                "拒绝订阅他人收件箱"
            );
            let err = DomainError::validation_error("topic", "belongs to another user");
            return Err(err.into());
        }
        self.join_topic(&topic).await
    }

    /// 订阅自己的私信收件箱
    pub async fn subscribe_own_inbox(&self) -> Result<JoinOutcome, ApplicationError> {
        let inbox = Topic::Direct(self.deps.owner.clone());
        self.join_topic(&inbox).await
    }

    /// 离开广播频道，未加入时不做任何事
    pub async fn leave(&self, channel_name: &str) -> Result<LeaveOutcome, ApplicationError> {
        let topic = Topic::Channel(ChannelName::parse(channel_name)?);
        let key = topic.key();
        let owner = self.deps.owner.as_str();
        let store = &self.deps.membership_store;

        if !store.is_member(owner, &key).await? {
            tracing::debug!(username = %owner, topic = %key, "未订阅，无需离开");
            return Ok(LeaveOutcome::NotSubscribed);
        }

        self.deps.broker.unsubscribe(&key).await?;
        store.remove_membership(owner, &key).await?;

        tracing::info!(username = %owner, topic = %key, "已取消订阅");
        Ok(LeaveOutcome::Unsubscribed)
    }

    pub async fn is_subscribed(&self, topic: &Topic) -> Result<bool, ApplicationError> {
        Ok(self
            .deps
            .membership_store
            .is_member(self.deps.owner.as_str(), &topic.key())
            .await?)
    }

    /// 当前订阅的全部主题
    pub async fn memberships(&self) -> Result<Vec<Topic>, ApplicationError> {
        let keys = self
            .deps
            .membership_store
            .memberships(self.deps.owner.as_str())
            .await?;
        let mut topics: Vec<Topic> = keys.iter().filter_map(|key| Topic::from_key(key)).collect();
        topics.sort();
        Ok(topics)
    }

    async fn join_topic(&self, topic: &Topic) -> Result<JoinOutcome, ApplicationError> {
        let key = topic.key();
        let owner = self.deps.owner.as_str();
        let store = &self.deps.membership_store;

        if store.is_member(owner, &key).await? {
            tracing::debug!(username = %owner, topic = %key, "主题已订阅");
            return Ok(JoinOutcome::AlreadySubscribed);
        }

        self.deps.broker.subscribe(&key).await?;
        store.add_membership(owner, &key).await?;

        tracing::info!(username = %owner, topic = %key, "订阅主题");
        Ok(JoinOutcome::Subscribed)
    }
}
