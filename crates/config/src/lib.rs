//! 统一配置中心
//!
//! 提供聊天机器人的全局配置管理，包括：
//! - Redis 连接（存储和消息代理）
//! - 存储键布局
//! - 天气查询服务
//! - 趣闻查询服务
//!
//! 加载顺序：默认值 -> 可选配置文件（`CHATBOT_CONFIG_FILE`）-> 环境变量（`CHATBOT_*`，嵌套用 `__`）。

use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// 配置文件路径的环境变量名
pub const CONFIG_FILE_ENV: &str = "CHATBOT_CONFIG_FILE";
/// 环境变量前缀
pub const ENV_PREFIX: &str = "CHATBOT_";

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Redis配置
    #[serde(default)]
    pub redis: RedisConfig,
    /// 存储键配置
    #[serde(default)]
    pub keys: KeysConfig,
    /// 天气查询配置
    #[serde(default)]
    pub weather: WeatherConfig,
    /// 趣闻查询配置
    #[serde(default)]
    pub facts: FactsConfig,
}

/// Redis配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// 存储键布局
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// 全局用户ID计数器
    pub counter: String,
    /// 用户资料哈希前缀，后接用户名
    pub profile_prefix: String,
    /// 用户频道集合前缀，后接用户名
    pub membership_prefix: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            counter: "user_counter".to_string(),
            profile_prefix: "users:".to_string(),
            membership_prefix: "channels:".to_string(),
        }
    }
}

/// 天气查询配置（OpenWeatherMap）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub units: String,
    pub timeout_seconds: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://api.openweathermap.org".to_string(),
            api_key: String::new(),
            units: "metric".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// 趣闻查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactsConfig {
    pub url: String,
    pub max_attempts: u32,
    pub timeout_seconds: u64,
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            url: "http://numbersapi.com/random/trivia".to_string(),
            max_attempts: 10,
            timeout_seconds: 10,
        }
    }
}

impl AppConfig {
    /// 按默认值 -> 配置文件 -> 环境变量的优先级加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                figment = figment.merge(Yaml::file(path));
            } else {
                figment = figment.merge(Toml::file(path));
            }
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: AppConfig = figment
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.redis.url.starts_with("redis://") && !self.redis.url.starts_with("rediss://") {
            return Err(ConfigError::InvalidRedisUrl(self.redis.url.clone()));
        }

        for (name, key) in [
            ("counter", &self.keys.counter),
            ("profile_prefix", &self.keys.profile_prefix),
            ("membership_prefix", &self.keys.membership_prefix),
        ] {
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidKeys(format!("{name} cannot be empty")));
            }
        }

        if self.keys.profile_prefix == self.keys.membership_prefix {
            return Err(ConfigError::InvalidKeys(
                "profile and membership prefixes must differ".to_string(),
            ));
        }

        if self.facts.max_attempts == 0 {
            return Err(ConfigError::InvalidLookup(
                "facts.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.weather.api_key.is_empty() {
            eprintln!("⚠️ WARNING: weather.api_key is empty, location lookups will be rejected");
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),
    #[error("Invalid Redis URL: {0}")]
    InvalidRedisUrl(String),
    #[error("Invalid key layout: {0}")]
    InvalidKeys(String),
    #[error("Invalid lookup configuration: {0}")]
    InvalidLookup(String),
}
