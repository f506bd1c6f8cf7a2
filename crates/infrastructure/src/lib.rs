//! 基础设施层实现。
//!
//! 提供 Redis 用户存储、Redis 发布订阅代理以及天气/趣闻 HTTP 查询等适配器，
//! 实现应用层定义的接口。

pub mod builder;
pub mod lookup;
pub mod redis;

pub use crate::builder::{Infrastructure, InfrastructureError};
pub use crate::lookup::{NumbersApiFactSource, OpenWeatherLookup};
pub use crate::redis::{RedisBroker, RedisError, RedisUserStore};
