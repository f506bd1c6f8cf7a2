//! 单用户聊天会话
//!
//! 一个会话对应一个用户、一条代理连接，命令按顺序执行。

use std::sync::Arc;

use domain::{ClassifiedMessage, Command, UserProfile};

use crate::{
    broker::Broker,
    error::ApplicationError,
    lookup::{FactSource, LocationLookup, LookupError, WeatherReport},
    repository::{MembershipStore, StoreError},
    services::{
        Ack, IdentityRegistry, InboxReader, InboxReaderDependencies, JoinOutcome, LeaveOutcome,
        MessageRouter, MessageRouterDependencies, SubscriptionManager,
        SubscriptionManagerDependencies,
    },
};

pub struct SessionDependencies {
    pub registry: Arc<IdentityRegistry>,
    pub broker: Arc<dyn Broker>,
    pub membership_store: Arc<dyn MembershipStore>,
    pub location_lookup: Arc<dyn LocationLookup>,
    pub fact_source: Arc<dyn FactSource>,
}

/// 命令执行结果，由命令行外壳负责展示
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Help,
    Weather {
        location: String,
        report: Result<WeatherReport, LookupError>,
    },
    Fact(String),
    Profile(UserProfile),
    Joined {
        channel: String,
        outcome: JoinOutcome,
    },
    Left {
        channel: String,
        outcome: LeaveOutcome,
    },
    Published(Ack),
    DirectSent(Ack),
    Messages(Vec<ClassifiedMessage>),
    Exit,
}

pub struct ChatSession {
    profile: UserProfile,
    registry: Arc<IdentityRegistry>,
    subscriptions: SubscriptionManager,
    router: MessageRouter,
    inbox: InboxReader,
    location_lookup: Arc<dyn LocationLookup>,
    fact_source: Arc<dyn FactSource>,
}

impl ChatSession {
    /// 开始会话并订阅自己的私信收件箱
    pub async fn start(
        deps: SessionDependencies,
        profile: UserProfile,
    ) -> Result<Self, ApplicationError> {
        let owner = profile.username.clone();

        let subscriptions = SubscriptionManager::new(SubscriptionManagerDependencies {
            owner: owner.clone(),
            broker: Arc::clone(&deps.broker),
            membership_store: Arc::clone(&deps.membership_store),
        });
        let router = MessageRouter::new(MessageRouterDependencies {
            sender: owner.clone(),
            broker: Arc::clone(&deps.broker),
            registry: Arc::clone(&deps.registry),
        });
        let inbox = InboxReader::new(InboxReaderDependencies {
            owner: owner.clone(),
            broker: deps.broker,
            membership_store: deps.membership_store,
        });

        subscriptions.subscribe_own_inbox().await?;
        tracing::info!(username = %owner, "会话已开始");

        Ok(Self {
            profile,
            registry: deps.registry,
            subscriptions,
            router,
            inbox,
            location_lookup: deps.location_lookup,
            fact_source: deps.fact_source,
        })
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn inbox(&self) -> &InboxReader {
        &self.inbox
    }

    /// 私信前确认收件人
    pub async fn check_recipient(&self, recipient: &str) -> Result<UserProfile, ApplicationError> {
        self.router.check_recipient(recipient).await
    }

    pub async fn execute(&mut self, command: Command) -> Result<CommandOutcome, ApplicationError> {
        match command {
            Command::Help => Ok(CommandOutcome::Help),
            Command::Weather { location } => {
                let location = location
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| self.profile.location.clone());
                let report = self.location_lookup.lookup(&location).await;
                Ok(CommandOutcome::Weather { location, report })
            }
            Command::Fact => Ok(CommandOutcome::Fact(self.fact_source.fetch().await)),
            Command::WhoAmI => {
                let username = &self.profile.username;
                let Some(profile) = self.registry.find_profile(username).await? else {
                    let key = username.to_string();
                    return Err(StoreError::MissingRecord { key }.into());
                };
                Ok(CommandOutcome::Profile(profile))
            }
            Command::Listen { channel } => {
                let outcome = self.subscriptions.join(&channel, false).await?;
                Ok(CommandOutcome::Joined {
                    channel: channel.trim().to_string(),
                    outcome,
                })
            }
            Command::Leave { channel } => {
                let outcome = self.subscriptions.leave(&channel).await?;
                Ok(CommandOutcome::Left {
                    channel: channel.trim().to_string(),
                    outcome,
                })
            }
            Command::Publish { channel, text } => {
                let ack = self.router.send(&channel, &text, false).await?;
                Ok(CommandOutcome::Published(ack))
            }
            Command::DirectMessage { recipient, text } => {
                let ack = self.router.send(&recipient, &text, true).await?;
                Ok(CommandOutcome::DirectSent(ack))
            }
            Command::Fetch => Ok(CommandOutcome::Messages(self.inbox.drain_all().await?)),
            Command::Exit => {
                tracing::info!(username = %self.profile.username, "会话结束");
                Ok(CommandOutcome::Exit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::MockFactSource;
    use crate::memory::{MemoryBroker, MemoryProfileStore, StaticLocationLookup};
    use crate::services::{IdentityRegistryDependencies, RegisterUserRequest, VerifiedLocation};
    use domain::{Age, DisplayName, DomainError, Topic};

    fn oslo() -> WeatherReport {
        WeatherReport {
            temperature: 4.0,
            humidity: 81.0,
        }
    }

    async fn start_session(fact_source: MockFactSource) -> ChatSession {
        let store = Arc::new(MemoryProfileStore::new());
        let lookup = Arc::new(StaticLocationLookup::new().with_location("Oslo", oslo()));
        let registry = Arc::new(IdentityRegistry::new(IdentityRegistryDependencies {
            profile_store: store.clone(),
            location_lookup: lookup.clone(),
        }));

        let location = registry.verify_location("Oslo").await.unwrap();
        let profile = registry
            .register(RegisterUserRequest {
                name: DisplayName::parse("alice").unwrap(),
                age: Age::new(28).unwrap(),
                gender: "female".to_string(),
                location,
            })
            .await
            .unwrap();

        ChatSession::start(
            SessionDependencies {
                registry,
                broker: Arc::new(MemoryBroker::new().connect()),
                membership_store: store,
                location_lookup: lookup,
                fact_source: Arc::new(fact_source),
            },
            profile,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_starts_subscribed_to_own_inbox() {
        let session = start_session(MockFactSource::new()).await;
        let inbox = Topic::resolve("alice1", true).unwrap();
        assert!(session.subscriptions().is_subscribed(&inbox).await.unwrap());
    }

    #[tokio::test]
    async fn test_weather_defaults_to_own_location() {
        let mut session = start_session(MockFactSource::new()).await;

        let outcome = session
            .execute(Command::Weather { location: None })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Weather {
                location: "Oslo".to_string(),
                report: Ok(oslo()),
            }
        );

        let outcome = session
            .execute(Command::Weather {
                location: Some("Atlantis".to_string()),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, CommandOutcome::Weather { report: Err(_), .. }));
    }

    #[tokio::test]
    async fn test_fact_comes_from_fact_source() {
        let mut facts = MockFactSource::new();
        facts
            .expect_fetch()
            .times(1)
            .returning(|| "0 is the additive identity.".to_string());
        let mut session = start_session(facts).await;

        let outcome = session.execute(Command::Fact).await.unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Fact("0 is the additive identity.".to_string())
        );
    }

    #[tokio::test]
    async fn test_whoami_reads_profile_back_from_store() {
        let mut session = start_session(MockFactSource::new()).await;

        let outcome = session.execute(Command::WhoAmI).await.unwrap();
        let CommandOutcome::Profile(profile) = outcome else {
            panic!("expected profile outcome");
        };
        assert_eq!(&profile, session.profile());
    }

    #[tokio::test]
    async fn test_self_addressed_dm_is_reported_not_fatal() {
        let mut session = start_session(MockFactSource::new()).await;

        let err = session
            .execute(Command::DirectMessage {
                recipient: "alice1".to_string(),
                text: "hi me".to_string(),
            })
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err.as_domain(), Some(DomainError::SelfAddressed { .. })));
    }

    #[tokio::test]
    async fn test_listen_publish_fetch_in_one_session() {
        let mut session = start_session(MockFactSource::new()).await;

        let outcome = session
            .execute(Command::Listen {
                channel: " news ".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Joined {
                channel: "news".to_string(),
                outcome: JoinOutcome::Subscribed,
            }
        );

        session
            .execute(Command::Publish {
                channel: "news".to_string(),
                text: "echo".to_string(),
            })
            .await
            .unwrap();

        let outcome = session.execute(Command::Fetch).await.unwrap();
        let CommandOutcome::Messages(messages) = outcome else {
            panic!("expected messages outcome");
        };
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].origin.label(), "news");
        assert_eq!(messages[0].text, "echo");

        let outcome = session
            .execute(Command::Leave {
                channel: "news".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Left {
                channel: "news".to_string(),
                outcome: LeaveOutcome::Unsubscribed,
            }
        );
    }
}
