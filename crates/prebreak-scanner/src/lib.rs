//! Pre-breakout 및 상승률 구간 알림 스캐너.
//!
//! 매 실행(예: 5분 주기)마다 시각 기반 배치 하나와 Hot List 종목을 스캔하고,
//! 새로 발생한 신호만 알림으로 전송한 뒤 상태를 저장합니다.

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::ScannerConfig;
pub use error::{Result, ScannerError};
pub use stats::ScanStats;
