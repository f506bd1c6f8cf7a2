//! OpenWeatherMap 天气查询

use std::time::Duration;

use application::{LocationLookup, LookupError, WeatherReport};
use async_trait::async_trait;
use config::WeatherConfig;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

const WEATHER_PATH: &str = "/data/2.5/weather";
const NOT_FOUND_REASON: &str = "Invalid entry detected; please try again.";

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainSection,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: String,
}

pub struct OpenWeatherLookup {
    client: Client,
    config: WeatherConfig,
}

impl OpenWeatherLookup {
    pub fn new(config: WeatherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}{WEATHER_PATH}")
    }
}

#[async_trait]
impl LocationLookup for OpenWeatherLookup {
    async fn lookup(&self, location: &str) -> Result<WeatherReport, LookupError> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("q", location),
                ("appid", self.config.api_key.as_str()),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(location, error = %e, "天气查询请求失败");
                LookupError::new(format!("An Error occurred. Message: {e}"))
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(location, "地点不存在");
            return Err(LookupError::new(NOT_FOUND_REASON));
        }

        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.message)
                .unwrap_or_default();
            return Err(LookupError::new(format!(
                "An Error occurred. Status Code: {} | Message: {}",
                status.as_u16(),
                message
            )));
        }

        let body: WeatherResponse = response
            .json()
            .await
            .map_err(|e| LookupError::new(format!("An Error occurred. Message: {e}")))?;

        Ok(WeatherReport {
            temperature: body.main.temp,
            humidity: body.main.humidity,
        })
    }
}
