//! Redis 消息代理
//!
//! 发布走多路复用连接；订阅使用独立的 PubSub 连接，后台任务把收到的消息
//! 转发到本地通道，`poll_next` 只从通道中非阻塞地取出已缓冲的消息。

use application::{Broker, BrokerError, BrokerEvent};
use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::{MultiplexedConnection, PubSubSink};
use redis::{AsyncCommands, Client};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::redis::{RedisError, RedisResult};

/// Redis 发布/订阅代理，每个会话一个实例
pub struct RedisBroker {
    publisher: MultiplexedConnection,
    sink: Mutex<PubSubSink>,
    inbox: Mutex<mpsc::UnboundedReceiver<BrokerEvent>>,
    listener: JoinHandle<()>,
}

impl RedisBroker {
    /// 创建新的 Redis 代理连接
    ///
    /// # 参数
    /// - `url`: Redis 地址
    ///
    /// # 返回
    /// - `Ok(RedisBroker)`: 已连接的代理
    /// - `Err(RedisError)`: 连接失败
    pub async fn connect(url: &str) -> RedisResult<Self> {
        let client = Client::open(url).map_err(|e| RedisError::ConfigError {
            message: format!("创建 Redis 客户端失败: {}", e),
        })?;

        let publisher = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RedisError::ConnectionError {
                message: format!("连接 Redis 失败: {}", e),
            })?;

        let (sink, mut stream) = client
            .get_async_pubsub()
            .await
            .map_err(|e| RedisError::ConnectionError {
                message: format!("获取 PubSub 连接失败: {}", e),
            })?
            .split();

        let (sender, receiver) = mpsc::unbounded_channel();

        // 在后台任务中转发订阅消息
        let listener = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let event = BrokerEvent::message(msg.get_channel_name(), msg.get_payload_bytes());
                if sender.send(event).is_err() {
                    debug!("接收端已关闭，停止转发");
                    return;
                }
            }
            warn!("Redis 订阅流已结束");
        });

        info!("Redis 代理已连接");

        Ok(Self {
            publisher,
            sink: Mutex::new(sink),
            inbox: Mutex::new(receiver),
            listener,
        })
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<u32, BrokerError> {
        let mut conn = self.publisher.clone();
        let receivers: u32 = conn
            .publish(topic, payload)
            .await
            .map_err(|e| BrokerError::Publish {
                topic: topic.to_string(),
                message: e.to_string(),
            })?;

        debug!(topic, receivers, "发布消息成功");
        Ok(receivers)
    }

    async fn subscribe(&self, topic: &str) -> Result<(), BrokerError> {
        let mut sink = self.sink.lock().await;
        sink.subscribe(topic)
            .await
            .map_err(|e| RedisError::SubscribeError {
                message: format!("订阅频道 {} 失败: {}", topic, e),
            })?;
        debug!(topic, "已订阅频道");
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), BrokerError> {
        let mut sink = self.sink.lock().await;
        sink.unsubscribe(topic)
            .await
            .map_err(|e| RedisError::SubscribeError {
                message: format!("取消订阅频道 {} 失败: {}", topic, e),
            })?;
        debug!(topic, "已取消订阅频道");
        Ok(())
    }

    async fn poll_next(&self) -> Result<Option<BrokerEvent>, BrokerError> {
        let mut inbox = self.inbox.lock().await;
        match inbox.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(BrokerError::Disconnected),
        }
    }
}

impl Drop for RedisBroker {
    fn drop(&mut self) {
        self.listener.abort();
        info!("Redis 代理正在关闭");
    }
}
