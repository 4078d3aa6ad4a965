//! Pre-breakout 및 상승률 구간 신호 평가기.
//!
//! 종목 하나의 일봉 스냅샷, 감성 점수, 기존 알림 기록을 받아 새로 알릴 이벤트가
//! 있는지 판단합니다. 외부 호출이나 상태 변경이 없는 순수 함수입니다.
//!
//! ## 트리거
//!
//! | 트리거 | 조건 |
//! |--------|------|
//! | Gap | `(시가 - 전일종가) / 전일종가 * 100 >= gap_threshold_pct` |
//! | UnusualVol | `평균거래량 > 0` 이고 `오늘거래량 > volume_multiplier * 평균거래량` |
//! | Breakout | 오늘 제외 직전 `breakout_lookback`일 최고가 < 현재가 |
//! | PositiveSentiment | `감성점수 >= sentiment_positive` |
//!
//! 트리거가 `min_triggers`개 이상 동시에 충족되고 아직 Pre-breakout 알림을
//! 보낸 적이 없으면 Pre-breakout 신호가 발생합니다.

use std::fmt;

use num_format::{Locale, ToFormattedString};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::{AlertRecord, DailySnapshot};

/// 신호 평가 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// 갭 상승 기준 (%)
    pub gap_threshold_pct: Decimal,
    /// 이상 거래량 배수
    pub volume_multiplier: Decimal,
    /// 돌파 판정 기간 (일)
    pub breakout_lookback: usize,
    /// 긍정 감성 최소 비율 (0.0 ~ 1.0)
    pub sentiment_positive: f64,
    /// 상승률 알림 구간 (%)
    pub thresholds: Vec<u32>,
    /// Pre-breakout 판정에 필요한 최소 트리거 수
    pub min_triggers: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            gap_threshold_pct: Decimal::new(30, 1),
            volume_multiplier: Decimal::new(20, 1),
            breakout_lookback: 20,
            sentiment_positive: 0.2,
            thresholds: vec![5, 10, 20],
            min_triggers: 2,
        }
    }
}

/// 개별 트리거.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// 전일 종가 대비 갭 상승
    Gap { gap_pct: Decimal },
    /// 평균 대비 이상 거래량
    UnusualVolume { volume: u64, avg_volume: u64 },
    /// 최근 N일 고가 돌파
    Breakout { lookback: usize, prior_high: Decimal },
    /// 긍정적 뉴스 감성
    PositiveSentiment { score: f64 },
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gap { gap_pct } => write!(f, "Gap +{:.1}%", round_dp(*gap_pct, 1)),
            Self::UnusualVolume { volume, avg_volume } => write!(
                f,
                "UnusualVol {} (avg {})",
                volume.to_formatted_string(&Locale::en),
                avg_volume.to_formatted_string(&Locale::en)
            ),
            Self::Breakout {
                lookback,
                prior_high,
            } => write!(f, "Breakout {}d > {:.2}", lookback, round_dp(*prior_high, 2)),
            Self::PositiveSentiment { score } => write!(f, "PositiveSentiment {:.2}", score),
        }
    }
}

/// 신호 평가 결과.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalResult {
    pub ticker: String,
    /// 현재가
    pub price: Decimal,
    /// 전일 종가 대비 등락률 (%)
    pub change_pct: Decimal,
    pub volume: u64,
    pub avg_volume: u64,
    pub sentiment: Option<f64>,
    /// 충족된 트리거
    pub triggers: Vec<Trigger>,
    /// 이번에 새로 도달한 상승률 구간 (오름차순)
    pub new_thresholds: Vec<u32>,
    /// Pre-breakout 신호 신규 발생 여부
    pub prebreak_hit: bool,
}

impl SignalResult {
    /// 트리거 설명을 `, `로 연결한 문자열.
    pub fn trigger_summary(&self) -> String {
        self.triggers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// 신호 평가기.
#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    config: SignalConfig,
}

impl SignalEvaluator {
    /// 구간 목록은 오름차순 정렬 후 중복 제거됩니다.
    pub fn new(mut config: SignalConfig) -> Self {
        config.thresholds.sort_unstable();
        config.thresholds.dedup();
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// 종목 하나를 평가합니다.
    ///
    /// 새로 도달한 구간도 없고 Pre-breakout 신호도 없으면 `None`.
    /// 일봉 3개 미만이거나 전일 종가가 0 이하인 스냅샷도 `None`.
    pub fn evaluate(
        &self,
        snapshot: &DailySnapshot,
        sentiment: Option<f64>,
        record: Option<&AlertRecord>,
    ) -> Option<SignalResult> {
        if !snapshot.is_usable() {
            return None;
        }

        let price = snapshot.price()?;
        let prev_close = snapshot.prev_close()?;
        if prev_close <= Decimal::ZERO {
            return None;
        }

        let change_pct = percent_change(price, prev_close)?;
        let triggers = self.compute_triggers(snapshot, sentiment, prev_close);
        let new_thresholds = self.new_thresholds(change_pct, record);

        let prebreak_already = record.is_some_and(|r| r.prebreak);
        let prebreak_hit = triggers.len() >= self.config.min_triggers && !prebreak_already;

        if new_thresholds.is_empty() && !prebreak_hit {
            return None;
        }

        Some(SignalResult {
            ticker: snapshot.ticker.clone(),
            price,
            change_pct,
            volume: snapshot.volume_today(),
            avg_volume: snapshot.avg_volume(),
            sentiment,
            triggers,
            new_thresholds,
            prebreak_hit,
        })
    }

    /// 각 트리거를 독립적으로 계산합니다.
    pub fn compute_triggers(
        &self,
        snapshot: &DailySnapshot,
        sentiment: Option<f64>,
        prev_close: Decimal,
    ) -> Vec<Trigger> {
        let mut triggers = Vec::new();

        // 1. 갭 상승
        if let Some(gap_pct) = snapshot
            .open_price()
            .and_then(|open| percent_change(open, prev_close))
        {
            if gap_pct >= self.config.gap_threshold_pct {
                triggers.push(Trigger::Gap { gap_pct });
            }
        }

        // 2. 이상 거래량
        let volume = snapshot.volume_today();
        let avg_volume = snapshot.avg_volume();
        // 곱셈이 넘치면 기준을 넘을 수 없는 것으로 봄
        let exceeds = self
            .config
            .volume_multiplier
            .checked_mul(Decimal::from(avg_volume))
            .is_some_and(|limit| Decimal::from(volume) > limit);
        if avg_volume > 0 && exceeds {
            triggers.push(Trigger::UnusualVolume { volume, avg_volume });
        }

        // 3. N일 고가 돌파 (오늘 제외)
        let lookback = self.config.breakout_lookback;
        if let (Some(prior_high), Some(price)) = (snapshot.prior_high(lookback), snapshot.price()) {
            if price > prior_high {
                triggers.push(Trigger::Breakout {
                    lookback,
                    prior_high,
                });
            }
        }

        // 4. 뉴스 감성
        if let Some(score) = sentiment {
            if score >= self.config.sentiment_positive {
                triggers.push(Trigger::PositiveSentiment { score });
            }
        }

        triggers
    }

    /// 등락률 이하이면서 아직 기록되지 않은 구간.
    pub fn new_thresholds(&self, change_pct: Decimal, record: Option<&AlertRecord>) -> Vec<u32> {
        self.config
            .thresholds
            .iter()
            .copied()
            .filter(|level| change_pct >= Decimal::from(*level))
            .filter(|level| !record.is_some_and(|r| r.has_threshold(*level)))
            .collect()
    }
}

impl Default for SignalEvaluator {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}

/// 표시용 반올림 (소수점 `dp`자리, 중간값은 짝수 방향).
///
/// `{:.N}` 포맷은 `Decimal`을 자르기만 하므로 출력 전에 먼저 반올림합니다.
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}

/// `(value - base) / base * 100`
fn percent_change(value: Decimal, base: Decimal) -> Option<Decimal> {
    (value - base)
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
}
