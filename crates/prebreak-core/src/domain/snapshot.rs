//! 일봉 스냅샷.
//!
//! 한 종목의 약 1개월치 일봉(OHLCV)을 오래된 것부터 최신 순으로 보관합니다.
//! - `bars[0]` = 가장 오래된 일봉
//! - `bars.last()` = 오늘(가장 최신) 일봉

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 신호 계산에 필요한 최소 일봉 수
pub const MIN_USABLE_BARS: usize = 3;

/// 평균 거래량 계산 윈도우 (최근 N개)
const AVG_VOLUME_WINDOW: usize = 30;

/// 윈도우 평균을 적용하기 위한 최소 데이터 수
const AVG_VOLUME_MIN_POINTS: usize = 5;

/// 일봉 하나.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl DailyBar {
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// 한 종목의 일봉 이력.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySnapshot {
    pub ticker: String,
    pub bars: Vec<DailyBar>,
}

impl DailySnapshot {
    pub fn new(ticker: impl Into<String>, bars: Vec<DailyBar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 신호 계산 가능 여부 (일봉 3개 미만이면 폐기).
    pub fn is_usable(&self) -> bool {
        self.bars.len() >= MIN_USABLE_BARS
    }

    pub fn today(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    pub fn yesterday(&self) -> Option<&DailyBar> {
        self.bars
            .len()
            .checked_sub(2)
            .and_then(|idx| self.bars.get(idx))
    }

    /// 현재가 (오늘 종가)
    pub fn price(&self) -> Option<Decimal> {
        self.today().map(|bar| bar.close)
    }

    /// 전일 종가
    pub fn prev_close(&self) -> Option<Decimal> {
        self.yesterday().map(|bar| bar.close)
    }

    /// 오늘 시가. 시가가 비어 있으면(0) 현재가로 대체합니다.
    pub fn open_price(&self) -> Option<Decimal> {
        self.today().map(|bar| {
            if bar.open.is_zero() {
                bar.close
            } else {
                bar.open
            }
        })
    }

    pub fn volume_today(&self) -> u64 {
        self.today().map(|bar| bar.volume).unwrap_or(0)
    }

    /// 평균 거래량 (정수 절사).
    ///
    /// 일봉이 5개 이상이면 최근 30개의 평균, 5개 미만이면 있는 데이터 전체의 평균.
    /// 오늘 거래량도 평균에 포함됩니다.
    pub fn avg_volume(&self) -> u64 {
        let n = self.bars.len();
        if n == 0 {
            return 0;
        }

        let window = if n >= AVG_VOLUME_MIN_POINTS {
            &self.bars[n.saturating_sub(AVG_VOLUME_WINDOW)..]
        } else {
            &self.bars[..]
        };

        let sum: u128 = window.iter().map(|bar| u128::from(bar.volume)).sum();
        (sum / window.len() as u128) as u64
    }

    /// 오늘을 제외한 직전 `lookback`개 일봉의 최고가.
    ///
    /// 일봉이 `lookback + 1`개 미만이면 `None`.
    pub fn prior_high(&self, lookback: usize) -> Option<Decimal> {
        let n = self.bars.len();
        if lookback == 0 || n < lookback + 1 {
            return None;
        }

        self.bars[n - 1 - lookback..n - 1]
            .iter()
            .map(|bar| bar.high)
            .max()
    }
}
