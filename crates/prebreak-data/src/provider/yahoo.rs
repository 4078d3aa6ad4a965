//! Yahoo Finance 일봉 스냅샷 Provider.
//!
//! yahoo_finance_api crate로 최근 1개월 일봉을 조회합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use prebreak_core::{DailyBar, DailySnapshot, ProviderError, SnapshotProvider};
use rust_decimal::Decimal;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Yahoo Finance 기반 일봉 스냅샷 Provider.
pub struct YahooSnapshotProvider {
    connector: yahoo::YahooConnector,
    /// 조회 기간 (예: "1mo")
    range: String,
    /// 요청 타임아웃
    timeout: Duration,
}

impl YahooSnapshotProvider {
    /// 기본 설정 (1개월, 타임아웃 15초)으로 생성
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_options("1mo", Duration::from_secs(15))
    }

    pub fn with_options(range: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| ProviderError::Network(format!("Yahoo Finance 연결 실패: {}", e)))?;

        Ok(Self {
            connector,
            range: range.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl SnapshotProvider for YahooSnapshotProvider {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<Option<DailySnapshot>, ProviderError> {
        debug!(ticker, range = %self.range, "Yahoo Finance 일봉 조회");

        let response = tokio::time::timeout(
            self.timeout,
            self.connector.get_quote_range(ticker, "1d", &self.range),
        )
        .await
        .map_err(|_| ProviderError::Timeout(format!("Yahoo Finance 일봉 조회 ({})", ticker)))?
        .map_err(map_yahoo_error)?;

        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                debug!(ticker, error = %e, "Yahoo Finance 일봉 데이터 없음");
                return Ok(None);
            }
        };

        let bars = bars_from_quotes(&quotes);
        if bars.is_empty() {
            return Ok(None);
        }

        debug!(ticker, bars = bars.len(), "일봉 수신");
        Ok(Some(DailySnapshot::new(ticker, bars)))
    }

    fn provider_name(&self) -> &str {
        "yahoo"
    }
}

/// Quote 목록을 일봉으로 변환합니다.
///
/// 종가가 0이거나 비어 있는 행도 그대로 유지합니다. 행을 버리면 전일 종가가
/// 더 이전 일봉으로 밀려나므로, 평가 단계의 `prev_close > 0` 검사에 맡깁니다.
fn bars_from_quotes(quotes: &[yahoo::Quote]) -> Vec<DailyBar> {
    quotes.iter().filter_map(quote_to_bar).collect()
}

/// 타임스탬프가 유효하지 않은 행만 `None`. 비어 있는 가격은 0으로 채웁니다.
fn quote_to_bar(quote: &yahoo::Quote) -> Option<DailyBar> {
    let timestamp = i64::try_from(quote.timestamp).ok()?;
    let date = DateTime::from_timestamp(timestamp, 0)?.date_naive();

    Some(DailyBar::new(
        date,
        Decimal::from_f64_retain(quote.open).unwrap_or_default(),
        Decimal::from_f64_retain(quote.high).unwrap_or_default(),
        Decimal::from_f64_retain(quote.low).unwrap_or_default(),
        Decimal::from_f64_retain(quote.close).unwrap_or_default(),
        quote.volume,
    ))
}

fn map_yahoo_error(e: yahoo::YahooError) -> ProviderError {
    let msg = format!("{:?}", e);
    if msg.contains("429") || msg.contains("Too Many") {
        ProviderError::RateLimited
    } else {
        ProviderError::Network(msg)
    }
}
