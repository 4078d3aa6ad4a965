//! 실행 간 유지되는 영속 상태.
//!
//! ```json
//! {
//!   "tickers": ["AAPL", "MSFT"],
//!   "tickers_fetched_at": 1700000000,
//!   "alerts_sent": { "AAPL": { "thresholds": [5, 10], "prebreak": true } },
//!   "hot_list": ["AAPL"],
//!   "last_run": 1700000300
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AlertRecord, HotList, TickerUniverse};

/// 스캐너 영속 상태 문서.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(flatten)]
    pub universe: TickerUniverse,
    /// 종목별 알림 기록
    #[serde(default, alias = "alertsSent")]
    pub alerts_sent: BTreeMap<String, AlertRecord>,
    #[serde(default, alias = "hotList")]
    pub hot_list: HotList,
    /// 마지막 실행 완료 시각 (Unix 초)
    #[serde(default, alias = "lastRun", skip_serializing_if = "Option::is_none")]
    pub last_run: Option<i64>,
}

impl PersistedState {
    pub fn record(&self, ticker: &str) -> Option<&AlertRecord> {
        self.alerts_sent.get(ticker)
    }

    pub fn record_mut(&mut self, ticker: &str) -> &mut AlertRecord {
        self.alerts_sent.entry(ticker.to_string()).or_default()
    }
}
