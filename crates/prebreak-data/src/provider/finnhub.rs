//! Finnhub REST API 클라이언트.
//!
//! ## 사용 엔드포인트
//!
//! | 용도 | 엔드포인트 | 타임아웃 |
//! |------|-----------|---------|
//! | 종목 유니버스 | `GET /stock/symbol?exchange=US` | 20초 |
//! | 뉴스 헤드라인 | `GET /company-news?symbol=&from=&to=` | 8초 |
//! | 뉴스 감성 | `GET /news-sentiment?symbol=` | 8초 |
//!
//! 뉴스 감성 엔드포인트는 무료 플랜에서 403을 반환할 수 있으며, 이 경우
//! 감성 점수 없음으로 처리합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Utc};
use prebreak_core::{Headline, NewsProvider, ProviderError, UniverseProvider};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{error_from_response, map_reqwest_error};

/// Finnhub API 기본 URL
pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub 클라이언트 설정.
#[derive(Clone)]
pub struct FinnhubConfig {
    /// API 토큰
    pub api_key: SecretString,
    /// API 기본 URL (테스트 시 mock 서버로 교체)
    pub base_url: String,
    /// 종목 목록을 조회할 거래소 코드
    pub exchange: String,
    /// 헤드라인 조회 기간 (일)
    pub news_window_days: u64,
    /// 최대 헤드라인 수
    pub max_headlines: usize,
    /// 종목 목록 조회 타임아웃
    pub symbol_timeout: Duration,
    /// 뉴스/감성 조회 타임아웃
    pub news_timeout: Duration,
}

impl std::fmt::Debug for FinnhubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinnhubConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("exchange", &self.exchange)
            .field("news_window_days", &self.news_window_days)
            .field("max_headlines", &self.max_headlines)
            .finish()
    }
}

impl FinnhubConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: FINNHUB_BASE_URL.to_string(),
            exchange: "US".to_string(),
            news_window_days: 2,
            max_headlines: 3,
            symbol_timeout: Duration::from_secs(20),
            news_timeout: Duration::from_secs(8),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_news_window_days(mut self, days: u64) -> Self {
        self.news_window_days = days;
        self
    }
}

/// `company-news` 응답 항목 (필요한 필드만).
#[derive(Debug, Deserialize)]
struct CompanyNews {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    source: String,
}

/// Finnhub REST API 클라이언트.
pub struct FinnhubClient {
    config: FinnhubConfig,
    client: reqwest::Client,
}

impl FinnhubClient {
    pub fn new(config: FinnhubConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 토큰을 포함한 GET 요청을 보내고 성공 응답만 반환합니다.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .query(&[("token", self.config.api_key.expose_secret())])
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

#[async_trait]
impl UniverseProvider for FinnhubClient {
    async fn fetch_universe(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .get(
                "stock/symbol",
                &[("exchange", self.config.exchange.as_str())],
                self.config.symbol_timeout,
            )
            .await?;

        let items: Vec<Value> = response.json().await.map_err(map_reqwest_error)?;

        // 문자열이 아닌 symbol 항목은 건너뜀
        let symbols: Vec<String> = items
            .iter()
            .filter_map(|item| item.get("symbol").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        debug!(
            exchange = %self.config.exchange,
            received = items.len(),
            symbols = symbols.len(),
            "Finnhub 종목 목록 수신"
        );
        Ok(symbols)
    }

    fn provider_name(&self) -> &str {
        "finnhub"
    }
}

#[async_trait]
impl NewsProvider for FinnhubClient {
    async fn fetch_headlines(&self, ticker: &str) -> Result<Vec<Headline>, ProviderError> {
        let to = Utc::now().date_naive();
        let from = to
            .checked_sub_days(Days::new(self.config.news_window_days))
            .unwrap_or(to);
        let from = from.to_string();
        let to = to.to_string();

        let response = self
            .get(
                "company-news",
                &[("symbol", ticker), ("from", from.as_str()), ("to", to.as_str())],
                self.config.news_timeout,
            )
            .await?;

        let news: Vec<CompanyNews> = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.without_url().to_string()))?;

        Ok(news
            .into_iter()
            .take(self.config.max_headlines)
            .map(|n| Headline::new(n.headline, n.source))
            .collect())
    }

    async fn fetch_sentiment(&self, ticker: &str) -> Result<Option<f64>, ProviderError> {
        let response = match self
            .get(
                "news-sentiment",
                &[("symbol", ticker)],
                self.config.news_timeout,
            )
            .await
        {
            Ok(response) => response,
            Err(ProviderError::Api { status: 401 | 403, .. }) => {
                debug!(ticker, "뉴스 감성 엔드포인트 접근 불가, 감성 점수 없음");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let data: Value = response.json().await.map_err(map_reqwest_error)?;
        Ok(parse_bullish_ratio(&data))
    }

    fn provider_name(&self) -> &str {
        "finnhub"
    }
}

/// `sentiment.bullishPercent`(0 ~ 100)를 0.0 ~ 1.0 비율로 변환합니다.
///
/// 숫자 또는 숫자 문자열을 허용하며, 없으면 `None`.
fn parse_bullish_ratio(data: &Value) -> Option<f64> {
    let bullish = data.get("sentiment")?.get("bullishPercent")?;
    let percent = match bullish {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    percent.is_finite().then_some(percent / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> FinnhubClient {
        let config = FinnhubConfig::new(SecretString::from("test-token".to_string()))
            .with_base_url(server.url());
        FinnhubClient::new(config)
    }

    #[test]
    fn test_parse_bullish_ratio() {
        assert_eq!(
            parse_bullish_ratio(&json!({ "sentiment": { "bullishPercent": 65 } })),
            Some(0.65)
        );
        assert_eq!(
            parse_bullish_ratio(&json!({ "sentiment": { "bullishPercent": "40" } })),
            Some(0.4)
        );
        assert_eq!(parse_bullish_ratio(&json!({ "sentiment": {} })), None);
        assert_eq!(parse_bullish_ratio(&json!([])), None);
    }

    #[test]
    fn test_config_debug_masks_token() {
        let config = FinnhubConfig::new(SecretString::from("super-secret".to_string()));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_fetch_universe_skips_non_string_symbols() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stock/symbol")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("exchange".into(), "US".into()),
                Matcher::UrlEncoded("token".into(), "test-token".into()),
            ]))
            .with_status(200)
            .with_body(
                json!([
                    { "symbol": "AAPL" },
                    { "symbol": 42 },
                    { "description": "no symbol" },
                    { "symbol": "brk.b" }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let symbols = client_for(&server).fetch_universe().await.unwrap();

        mock.assert_async().await;
        assert_eq!(symbols, vec!["AAPL", "brk.b"]);
    }

    #[tokio::test]
    async fn test_fetch_universe_maps_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stock/symbol")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = client_for(&server).fetch_universe().await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited));
    }

    #[tokio::test]
    async fn test_fetch_headlines_takes_first_three() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/company-news")
            .match_query(Matcher::UrlEncoded("symbol".into(), "TSLA".into()))
            .with_status(200)
            .with_body(
                json!([
                    { "headline": "one", "source": "A" },
                    { "headline": "two", "source": "B" },
                    { "headline": "three", "source": "C" },
                    { "headline": "four", "source": "D" }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let headlines = client_for(&server).fetch_headlines("TSLA").await.unwrap();

        assert_eq!(headlines.len(), 3);
        assert_eq!(headlines[0], Headline::new("one", "A"));
    }

    #[tokio::test]
    async fn test_fetch_sentiment_forbidden_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/news-sentiment")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":"You don't have access to this resource."}"#)
            .create_async()
            .await;

        let sentiment = client_for(&server).fetch_sentiment("TSLA").await.unwrap();
        assert_eq!(sentiment, None);
    }

    #[tokio::test]
    async fn test_fetch_sentiment_server_error_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/news-sentiment")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client_for(&server).fetch_sentiment("TSLA").await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 500, .. }));
    }
}
