//! 消息代理主题
//!
//! 广播频道和私信收件箱使用不同的命名空间，
//! 名为 `alice1` 的频道不会与用户 `alice1` 的收件箱冲突。

use std::fmt;

use crate::errors::DomainResult;
use crate::value_objects::{ChannelName, Username};

/// 广播频道命名空间前缀
pub const CHANNEL_NAMESPACE: &str = "channel:";
/// 私信收件箱命名空间前缀
pub const DIRECT_NAMESPACE: &str = "user_dm:";

/// 可寻址的主题
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Topic {
    /// 广播频道，多对多
    Channel(ChannelName),
    /// 用户私信收件箱，只有所属用户订阅
    Direct(Username),
}

impl Topic {
    /// 根据逻辑目的地解析主题
    pub fn resolve(destination: &str, is_direct: bool) -> DomainResult<Self> {
        if is_direct {
            Ok(Self::Direct(Username::parse(destination)?))
        } else {
            Ok(Self::Channel(ChannelName::parse(destination)?))
        }
    }

    /// 代理上使用的规范主题键
    pub fn key(&self) -> String {
        match self {
            Self::Channel(name) => format!("{CHANNEL_NAMESPACE}{name}"),
            Self::Direct(username) => format!("{DIRECT_NAMESPACE}{username}"),
        }
    }

    /// 解析主题键，未知命名空间返回 `None`
    pub fn from_key(key: &str) -> Option<Self> {
        if let Some(name) = key.strip_prefix(DIRECT_NAMESPACE) {
            return Username::parse(name).ok().map(Self::Direct);
        }
        if let Some(name) = key.strip_prefix(CHANNEL_NAMESPACE) {
            return ChannelName::parse(name).ok().map(Self::Channel);
        }
        None
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
