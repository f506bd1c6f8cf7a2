//! 外部查询服务接口：地点天气和随机趣闻。

use async_trait::async_trait;
use thiserror::Error;

/// 趣闻查询彻底失败时展示的文本
pub const FALLBACK_FACT: &str = "Error fetching an interesting fact. Please try again later.";

/// 地点的天气概况
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReport {
    pub temperature: f64,
    pub humidity: f64,
}

/// 查询失败，`reason` 直接展示给用户
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct LookupError {
    pub reason: String,
}

impl LookupError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// 地点查询。任何错误都视为“请重新输入”，而不是致命错误。
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LocationLookup: Send + Sync {
    async fn lookup(&self, location: &str) -> Result<WeatherReport, LookupError>;
}

/// 随机趣闻来源，失败时返回固定的致歉文本
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FactSource: Send + Sync {
    async fn fetch(&self) -> String;
}
