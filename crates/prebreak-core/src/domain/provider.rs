//! 외부 데이터 Provider trait.
//!
//! 스캐너는 아래 trait에만 의존하며, 실제 구현(Finnhub, Yahoo Finance)은
//! `prebreak-data` 크레이트에 있습니다.

use async_trait::async_trait;

use super::{DailySnapshot, Headline, ProviderError};

/// 스캔 대상 종목 목록 제공자.
#[async_trait]
pub trait UniverseProvider: Send + Sync {
    /// 원본 심볼 목록 조회. 정규화는 호출자가 수행합니다.
    async fn fetch_universe(&self) -> Result<Vec<String>, ProviderError>;

    /// 로깅용 이름
    fn provider_name(&self) -> &str;
}

/// 일봉 스냅샷 제공자.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// 최근 약 1개월 일봉 조회.
    ///
    /// 데이터가 없으면 `Ok(None)`.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<Option<DailySnapshot>, ProviderError>;

    fn provider_name(&self) -> &str;
}

/// 뉴스 및 감성 점수 제공자.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// 최근 헤드라인 (최대 3개).
    async fn fetch_headlines(&self, ticker: &str) -> Result<Vec<Headline>, ProviderError>;

    /// 강세(bullish) 비율 0.0 ~ 1.0. 제공되지 않으면 `Ok(None)`.
    async fn fetch_sentiment(&self, ticker: &str) -> Result<Option<f64>, ProviderError>;

    fn provider_name(&self) -> &str;
}
