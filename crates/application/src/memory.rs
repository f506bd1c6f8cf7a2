//! 内存实现
//!
//! 供测试和离线运行使用的代理、存储和查询实现，语义与 Redis 版本一致：
//! 每条连接有独立的投递队列，订阅之后才能收到消息，计数器原子递增。

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use domain::ProfileFields;
use tokio::sync::RwLock;

use crate::broker::{Broker, BrokerError, BrokerEvent, BrokerEventKind};
use crate::lookup::{FactSource, LocationLookup, LookupError, WeatherReport, FALLBACK_FACT};
use crate::repository::{MembershipStore, ProfileStore, StoreError};

type ConnectionId = u64;

#[derive(Default)]
struct HubState {
    subscribers: HashMap<String, HashSet<ConnectionId>>,
    queues: HashMap<ConnectionId, VecDeque<BrokerEvent>>,
}

impl HubState {
    fn detach(&mut self, id: ConnectionId, topic: &str) {
        if let Some(ids) = self.subscribers.get_mut(topic) {
            ids.remove(&id);
            if ids.is_empty() {
                self.subscribers.remove(topic);
            }
        }
    }

    fn enqueue(&mut self, id: ConnectionId, event: BrokerEvent) {
        self.queues.entry(id).or_default().push_back(event);
    }
}

/// 锁内不跨越 await，中毒后继续使用内部状态
fn lock(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 内存消息代理，多条连接共享同一个主题表
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<HubState>>,
    next_connection: Arc<AtomicU64>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建立一条新连接（对应一个用户会话）
    pub fn connect(&self) -> MemoryBrokerConnection {
        MemoryBrokerConnection {
            id: self.next_connection.fetch_add(1, Ordering::SeqCst),
            state: Arc::clone(&self.state),
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        let state = lock(&self.state);
        state.subscribers.get(topic).map_or(0, HashSet::len)
    }

    /// 仍持有投递队列的连接数
    pub fn open_queues(&self) -> usize {
        lock(&self.state).queues.len()
    }
}

/// 内存代理上的单条连接
///
/// 连接释放时退出全部主题并丢弃未读事件。
pub struct MemoryBrokerConnection {
    id: ConnectionId,
    state: Arc<Mutex<HubState>>,
}

#[async_trait]
impl Broker for MemoryBrokerConnection {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<u32, BrokerError> {
        let mut state = lock(&self.state);
        let receivers: Vec<ConnectionId> = state
            .subscribers
            .get(topic)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        for id in &receivers {
            state.enqueue(*id, BrokerEvent::message(topic, payload));
        }

        Ok(receivers.len() as u32)
    }

    async fn subscribe(&self, topic: &str) -> Result<(), BrokerError> {
        let mut state = lock(&self.state);
        state
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .insert(self.id);
        let ack = BrokerEvent::control(topic, BrokerEventKind::Subscribe);
        state.enqueue(self.id, ack);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), BrokerError> {
        let mut state = lock(&self.state);
        state.detach(self.id, topic);
        let ack = BrokerEvent::control(topic, BrokerEventKind::Unsubscribe);
        state.enqueue(self.id, ack);
        Ok(())
    }

    async fn poll_next(&self) -> Result<Option<BrokerEvent>, BrokerError> {
        let mut state = lock(&self.state);
        Ok(state.queues.get_mut(&self.id).and_then(VecDeque::pop_front))
    }
}

impl Drop for MemoryBrokerConnection {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        let topics: Vec<String> = state
            .subscribers
            .iter()
            .filter(|(_, ids)| ids.contains(&self.id))
            .map(|(topic, _)| topic.clone())
            .collect();
        for topic in &topics {
            state.detach(self.id, topic);
        }
        state.queues.remove(&self.id);
        tracing::trace!(connection = self.id, topics = topics.len(), "内存连接释放");
    }
}

/// 内存用户存储，同时实现资料存储和订阅集合
#[derive(Default)]
pub struct MemoryProfileStore {
    counter: AtomicU64,
    profiles: RwLock<HashMap<String, ProfileFields>>,
    memberships: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn next_id(&self) -> Result<u64, StoreError> {
        Ok(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn put_profile(&self, username: &str, fields: &ProfileFields) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles
            .entry(username.to_string())
            .or_default()
            .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn get_profile(&self, username: &str) -> Result<Option<ProfileFields>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(username).cloned())
    }
}

#[async_trait]
impl MembershipStore for MemoryProfileStore {
    async fn add_membership(&self, username: &str, topic: &str) -> Result<bool, StoreError> {
        let mut memberships = self.memberships.write().await;
        Ok(memberships
            .entry(username.to_string())
            .or_default()
            .insert(topic.to_string()))
    }

    async fn remove_membership(&self, username: &str, topic: &str) -> Result<bool, StoreError> {
        let mut memberships = self.memberships.write().await;
        let Some(topics) = memberships.get_mut(username) else {
            return Ok(false);
        };
        let removed = topics.remove(topic);
        if topics.is_empty() {
            memberships.remove(username);
        }
        Ok(removed)
    }

    async fn is_member(&self, username: &str, topic: &str) -> Result<bool, StoreError> {
        let memberships = self.memberships.read().await;
        Ok(memberships
            .get(username)
            .is_some_and(|topics| topics.contains(topic)))
    }

    async fn memberships(&self, username: &str) -> Result<Vec<String>, StoreError> {
        let memberships = self.memberships.read().await;
        Ok(memberships
            .get(username)
            .map(|topics| topics.iter().cloned().collect())
            .unwrap_or_default())
    }
}

/// 固定地点表的天气查询，名称不区分大小写
#[derive(Debug, Default, Clone)]
pub struct StaticLocationLookup {
    locations: HashMap<String, WeatherReport>,
}

impl StaticLocationLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, name: &str, report: WeatherReport) -> Self {
        self.locations.insert(name.to_lowercase(), report);
        self
    }
}

#[async_trait]
impl LocationLookup for StaticLocationLookup {
    async fn lookup(&self, location: &str) -> Result<WeatherReport, LookupError> {
        self.locations
            .get(&location.trim().to_lowercase())
            .copied()
            .ok_or_else(|| LookupError::new("Invalid entry detected; please try again."))
    }
}

/// 轮流返回预置趣闻
#[derive(Debug, Default)]
pub struct StaticFactSource {
    facts: Vec<String>,
    cursor: AtomicUsize,
}

impl StaticFactSource {
    pub fn new(facts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            facts: facts.into_iter().map(Into::into).collect(),
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FactSource for StaticFactSource {
    async fn fetch(&self) -> String {
        if self.facts.is_empty() {
            return FALLBACK_FACT.to_string();
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.facts.len();
        self.facts[index].clone()
    }
}
