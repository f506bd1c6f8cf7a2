//! 外部 HTTP 查询服务

pub mod facts;
pub mod weather;

pub use facts::NumbersApiFactSource;
pub use weather::OpenWeatherLookup;
