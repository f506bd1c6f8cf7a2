use std::sync::Arc;

use config::AppConfig;
use thiserror::Error;

use crate::{
    lookup::{NumbersApiFactSource, OpenWeatherLookup},
    redis::{RedisBroker, RedisError, RedisUserStore},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("redis error: {0}")]
    Redis(#[from] RedisError),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// 进程内共享的后端服务
#[derive(Clone)]
pub struct Infrastructure {
    pub user_store: Arc<RedisUserStore>,
    pub location_lookup: Arc<OpenWeatherLookup>,
    pub fact_source: Arc<NumbersApiFactSource>,
    redis_url: String,
}

impl Infrastructure {
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let user_store = RedisUserStore::connect(&config.redis.url, config.keys.clone()).await?;
        let user_store = Arc::new(user_store);
        let location_lookup = Arc::new(OpenWeatherLookup::new(config.weather.clone())?);
        let fact_source = Arc::new(NumbersApiFactSource::new(config.facts.clone())?);

        Ok(Self {
            user_store,
            location_lookup,
            fact_source,
            redis_url: config.redis.url.clone(),
        })
    }

    /// 为一个会话建立独立的代理连接
    pub async fn connect_broker(&self) -> Result<Arc<RedisBroker>, InfrastructureError> {
        Ok(Arc::new(RedisBroker::connect(&self.redis_url).await?))
    }
}
