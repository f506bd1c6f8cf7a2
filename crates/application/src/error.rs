use domain::DomainError;
use thiserror::Error;

use crate::broker::BrokerError;
use crate::repository::StoreError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),
}

impl ApplicationError {
    /// 存储或代理不可用时会话无法继续
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Broker(_))
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(err) => Some(err),
            _ => None,
        }
    }
}
