//! 多用户消息流测试
//!
//! 使用内存代理和内存存储模拟多个会话共享同一个代理和用户存储。

use std::sync::Arc;

use application::memory::{MemoryBroker, MemoryProfileStore, StaticFactSource, StaticLocationLookup};
use application::{
    Broker, BrokerEvent, ChatSession, CommandOutcome, IdentityRegistry,
    IdentityRegistryDependencies, JoinOutcome, RegisterUserRequest, SessionDependencies,
    WeatherReport,
};
use domain::{Age, Command, DisplayName, MessageOrigin, Username};

/// 测试辅助结构：共享的后端服务
struct TestServices {
    hub: MemoryBroker,
    store: Arc<MemoryProfileStore>,
    lookup: Arc<StaticLocationLookup>,
    registry: Arc<IdentityRegistry>,
}

impl TestServices {
    fn new() -> Self {
        let store = Arc::new(MemoryProfileStore::new());
        let lookup = Arc::new(StaticLocationLookup::new().with_location(
            "Berlin",
            WeatherReport {
                temperature: 12.0,
                humidity: 70.0,
            },
        ));
        let registry = Arc::new(IdentityRegistry::new(IdentityRegistryDependencies {
            profile_store: store.clone(),
            location_lookup: lookup.clone(),
        }));

        Self {
            hub: MemoryBroker::new(),
            store,
            lookup,
            registry,
        }
    }

    /// 注册用户并开始会话
    async fn session(&self, name: &str) -> ChatSession {
        let location = self.registry.verify_location("Berlin").await.unwrap();
        let profile = self
            .registry
            .register(RegisterUserRequest {
                name: DisplayName::parse(name).unwrap(),
                age: Age::new(25).unwrap(),
                gender: "unspecified".to_string(),
                location,
            })
            .await
            .unwrap();

        ChatSession::start(
            SessionDependencies {
                registry: self.registry.clone(),
                broker: Arc::new(self.hub.connect()),
                membership_store: self.store.clone(),
                location_lookup: self.lookup.clone(),
                fact_source: Arc::new(StaticFactSource::default()),
            },
            profile,
        )
        .await
        .unwrap()
    }
}

async fn fetch(session: &mut ChatSession) -> Vec<(MessageOrigin, String)> {
    match session.execute(Command::Fetch).await.unwrap() {
        CommandOutcome::Messages(messages) => {
            messages.into_iter().map(|m| (m.origin, m.text)).collect()
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

fn listen(channel: &str) -> Command {
    Command::Listen {
        channel: channel.to_string(),
    }
}

/// 测试广播：订阅之前发布的消息不会回放
#[tokio::test]
async fn test_broadcast_reaches_prior_subscribers_only() {
    let services = TestServices::new();
    let mut alice = services.session("alice").await;
    let mut bob = services.session("bob").await;
    let mut carol = services.session("carol").await;
    assert_eq!(alice.profile().username.as_str(), "alice1");
    assert_eq!(bob.profile().username.as_str(), "bob2");
    assert_eq!(carol.profile().username.as_str(), "carol3");

    alice.execute(listen("news")).await.unwrap();
    bob.execute(listen("news")).await.unwrap();

    alice
        .execute(Command::Publish {
            channel: "news".to_string(),
            text: "headline".to_string(),
        })
        .await
        .unwrap();

    carol.execute(listen("news")).await.unwrap();

    let news = domain::ChannelName::parse("news").unwrap();
    assert_eq!(
        fetch(&mut bob).await,
        vec![(
            MessageOrigin::Broadcast(news.clone()),
            "headline".to_string(),
        )]
    );
    assert!(fetch(&mut carol).await.is_empty());
    // 发布者自己也订阅了频道
    assert_eq!(
        fetch(&mut alice).await,
        vec![(MessageOrigin::Broadcast(news), "headline".to_string())]
    );
}

/// 测试私信往返
#[tokio::test]
async fn test_direct_message_round_trip() {
    let services = TestServices::new();
    let mut alice = services.session("alice").await;
    let mut bob = services.session("bob").await;

    let outcome = alice
        .execute(Command::DirectMessage {
            recipient: "bob2".to_string(),
            text: "hi".to_string(),
        })
        .await
        .unwrap();
    let CommandOutcome::DirectSent(ack) = outcome else {
        panic!("expected direct-sent outcome");
    };
    assert_eq!(ack.receivers, 1);

    assert_eq!(
        fetch(&mut bob).await,
        vec![(
            MessageOrigin::Direct(Username::parse("alice1").unwrap()),
            "hi".to_string(),
        )]
    );
    assert!(fetch(&mut bob).await.is_empty());
    assert!(fetch(&mut alice).await.is_empty());
}

/// 测试同一次读取中混入损坏信封
#[tokio::test]
async fn test_malformed_direct_payload_is_skipped() {
    let services = TestServices::new();
    let mut alice = services.session("alice").await;
    let mut bob = services.session("bob").await;

    let rogue = services.hub.connect();
    alice
        .execute(Command::DirectMessage {
            recipient: "bob2".to_string(),
            text: "before".to_string(),
        })
        .await
        .unwrap();
    let garbage = b"\xff\xfe garbage";
    rogue.publish("user_dm:bob2", garbage).await.unwrap();
    alice
        .execute(Command::DirectMessage {
            recipient: "bob2".to_string(),
            text: "after".to_string(),
        })
        .await
        .unwrap();

    let texts: Vec<String> = fetch(&mut bob).await.into_iter().map(|(_, t)| t).collect();
    assert_eq!(texts, vec!["before".to_string(), "after".to_string()]);
}

/// 测试离开频道后不再收到消息，收件箱保持订阅
#[tokio::test]
async fn test_leave_stops_delivery_but_inbox_stays() {
    let services = TestServices::new();
    let mut alice = services.session("alice").await;
    let mut bob = services.session("bob").await;

    assert!(matches!(
        bob.execute(listen("news")).await.unwrap(),
        CommandOutcome::Joined {
            outcome: JoinOutcome::Subscribed,
            ..
        }
    ));
    bob.execute(Command::Leave {
        channel: "news".to_string(),
    })
    .await
    .unwrap();

    alice
        .execute(Command::Publish {
            channel: "news".to_string(),
            text: "missed".to_string(),
        })
        .await
        .unwrap();
    alice
        .execute(Command::DirectMessage {
            recipient: "bob2".to_string(),
            text: "still here".to_string(),
        })
        .await
        .unwrap();

    let texts: Vec<String> = fetch(&mut bob).await.into_iter().map(|(_, t)| t).collect();
    assert_eq!(texts, vec!["still here".to_string()]);
}

/// 测试并发注册的ID唯一且递增
#[tokio::test]
async fn test_concurrent_registrations_get_unique_ids() {
    let services = Arc::new(TestServices::new());

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let services = services.clone();
            tokio::spawn(async move {
                let name = if i % 2 == 0 { "sam" } else { "kim" };
                services.session(name).await.profile().clone()
            })
        })
        .collect();

    let profiles: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let mut ids: Vec<u64> = profiles.iter().map(|p| p.id.value()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=20).collect::<Vec<_>>());

    let mut usernames: Vec<_> = profiles.iter().map(|p| p.username.clone()).collect();
    usernames.sort();
    usernames.dedup();
    assert_eq!(usernames.len(), 20);
}

/// 测试空代理上的读取立即返回
#[tokio::test]
async fn test_fetch_on_quiet_broker_is_empty() {
    let services = TestServices::new();
    let mut dave = services.session("dave").await;
    assert!(fetch(&mut dave).await.is_empty());

    // 代理层面也没有遗留的负载事件
    let listener = services.hub.connect();
    assert_eq!(listener.poll_next().await.unwrap(), None::<BrokerEvent>);
}

/// 测试会话结束后代理不再保留它的订阅
#[tokio::test]
async fn test_ended_session_releases_its_subscriptions() {
    let services = TestServices::new();
    let mut alice = services.session("alice").await;
    let mut bob = services.session("bob").await;
    bob.execute(listen("news")).await.unwrap();
    assert_eq!(services.hub.subscriber_count("user_dm:bob2"), 1);

    drop(bob);
    assert_eq!(services.hub.subscriber_count("user_dm:bob2"), 0);
    assert_eq!(services.hub.subscriber_count("channel:news"), 0);
    assert_eq!(services.hub.open_queues(), 1);

    let outcome = alice
        .execute(Command::DirectMessage {
            recipient: "bob2".to_string(),
            text: "anyone there?".to_string(),
        })
        .await
        .unwrap();
    let CommandOutcome::DirectSent(ack) = outcome else {
        panic!("expected direct-sent outcome");
    };
    assert_eq!(ack.receivers, 0);
}
