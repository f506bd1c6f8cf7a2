//! numbersapi 随机趣闻

use std::time::Duration;

use application::{FactSource, FALLBACK_FACT};
use async_trait::async_trait;
use config::FactsConfig;
use reqwest::Client;
use tracing::{debug, warn};

pub struct NumbersApiFactSource {
    client: Client,
    config: FactsConfig,
}

impl NumbersApiFactSource {
    pub fn new(config: FactsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    async fn try_fetch(&self) -> Result<Option<String>, reqwest::Error> {
        let response = self.client.get(&self.config.url).send().await?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "趣闻查询返回非成功状态");
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}

#[async_trait]
impl FactSource for NumbersApiFactSource {
    /// 最多尝试 `max_attempts` 次，全部失败时返回固定文本
    async fn fetch(&self) -> String {
        for attempt in 1..=self.config.max_attempts {
            match self.try_fetch().await {
                Ok(Some(fact)) => return fact,
                Ok(None) => {}
                Err(e) => warn!(attempt, error = %e, "趣闻查询失败"),
            }
        }
        FALLBACK_FACT.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer, max_attempts: u32) -> NumbersApiFactSource {
        NumbersApiFactSource::new(FactsConfig {
            url: format!("{}/random/trivia", server.uri()),
            max_attempts,
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_fact_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/random/trivia"))
            .respond_with(ResponseTemplate::new(200).set_body_string("42 is the answer."))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(source_for(&server, 10).fetch().await, "42 is the answer.");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        assert_eq!(source_for(&server, 3).fetch().await, FALLBACK_FACT);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("7 is prime."))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(source_for(&server, 10).fetch().await, "7 is prime.");
    }
}
