//! Redis 模块
//!
//! 提供基于 Redis 的用户存储和发布订阅代理。

pub mod broker;
pub mod error;
pub mod store;

// 重新导出
pub use broker::RedisBroker;
pub use error::*;
pub use store::RedisUserStore;
