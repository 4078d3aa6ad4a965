//! Pre-breakout 스캐너 핵심 타입 및 신호 평가기.
//!
//! - `domain` - 일봉 스냅샷, 알림 기록, Hot List, 영속 상태, 외부 Provider trait
//! - `signal` - 순수 함수 형태의 신호 평가기 (`SignalEvaluator`)

pub mod domain;
pub mod signal;

pub use domain::{
    sanitize_symbol, AlertRecord, DailyBar, DailySnapshot, Headline, HotList, NewsProvider,
    PersistedState, ProviderError, SnapshotProvider, TickerUniverse, UniverseProvider,
};
pub use signal::{round_dp, SignalConfig, SignalEvaluator, SignalResult, Trigger};
