//! 외부 데이터 Provider 구현.
//!
//! - [`FinnhubClient`] - 종목 유니버스, 뉴스 헤드라인, 뉴스 감성 (Finnhub REST API)
//! - [`YahooSnapshotProvider`] - 일봉 스냅샷 (Yahoo Finance)

pub mod provider;

pub use provider::finnhub::{FinnhubClient, FinnhubConfig};
pub use provider::yahoo::YahooSnapshotProvider;
