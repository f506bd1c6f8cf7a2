//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：身份注册、订阅管理、消息路由和收件箱读取，
//! 以及对外部适配器（消息代理、用户存储、天气和趣闻查询）的抽象。

pub mod broker;
pub mod error;
pub mod lookup;
pub mod memory;
pub mod repository;
pub mod services;
pub mod session;

pub use broker::{Broker, BrokerError, BrokerEvent, BrokerEventKind};
pub use error::ApplicationError;
pub use lookup::{FactSource, LocationLookup, LookupError, WeatherReport, FALLBACK_FACT};
pub use repository::{MembershipStore, ProfileStore, StoreError};
pub use services::{
    Ack, IdentityRegistry, IdentityRegistryDependencies, InboxReader, InboxReaderDependencies,
    JoinOutcome, LeaveOutcome, MessageRouter, MessageRouterDependencies, RegisterUserRequest,
    SubscriptionManager, SubscriptionManagerDependencies, VerifiedLocation,
};
pub use session::{ChatSession, CommandOutcome, SessionDependencies};
