//! 알림 타입 정의.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};
use prebreak_core::{round_dp, Headline};
use rust_decimal::Decimal;
use thiserror::Error;

/// 헤드라인이 없을 때 본문에 표시되는 문구
pub const NO_NEWS_PLACEHOLDER: &str = "No recent news.";

/// 알림 전송 에러.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// 네트워크 에러 (Webhook URL은 제거됨)
    #[error("네트워크 에러: {0}")]
    NetworkError(String),

    /// 요청 한도 초과 (재시도까지 대기 초)
    #[error("Rate limit 초과, {0}초 후 재시도")]
    RateLimited(u64),

    /// 전송 실패
    #[error("전송 실패: {0}")]
    SendFailed(String),
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkError(err.without_url().to_string())
    }
}

pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 이벤트.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    /// 상승률 구간 신규 도달
    ThresholdCrossed {
        ticker: String,
        level: u32,
        price: Decimal,
        change_pct: Decimal,
        volume: u64,
        avg_volume: u64,
        headlines: Vec<Headline>,
    },
    /// Pre-breakout 신호 (트리거 2개 이상 동시 충족)
    PreBreakout {
        ticker: String,
        triggers: Vec<String>,
        price: Decimal,
        change_pct: Decimal,
        volume: u64,
        avg_volume: u64,
        headlines: Vec<Headline>,
    },
    /// 자유 형식 메시지
    Custom { title: String, message: String },
}

/// 전송할 알림.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub event: NotificationEvent,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(event: NotificationEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 알림 대상 종목 (Custom은 `None`)
    pub fn ticker(&self) -> Option<&str> {
        match &self.event {
            NotificationEvent::ThresholdCrossed { ticker, .. }
            | NotificationEvent::PreBreakout { ticker, .. } => Some(ticker),
            NotificationEvent::Custom { .. } => None,
        }
    }

    /// 제목 한 줄.
    pub fn subject(&self) -> String {
        match &self.event {
            NotificationEvent::ThresholdCrossed {
                ticker,
                level,
                change_pct,
                ..
            } => format!(
                "🚀 {} +{:.1}% | Threshold +{}%",
                ticker,
                round_dp(*change_pct, 1),
                level
            ),
            NotificationEvent::PreBreakout {
                ticker,
                triggers,
                change_pct,
                ..
            } => format!(
                "⚡ PRE-BREAKOUT: {} — {} | {:.1}%",
                ticker,
                triggers.join(", "),
                round_dp(*change_pct, 1)
            ),
            NotificationEvent::Custom { title, .. } => title.clone(),
        }
    }

    /// 본문 (길이 제한 없음, 전송기가 잘라냄).
    pub fn body(&self) -> String {
        let time = self.timestamp.format("%Y-%m-%d %H:%M:%S");

        match &self.event {
            NotificationEvent::ThresholdCrossed {
                price,
                change_pct,
                volume,
                avg_volume,
                headlines,
                ..
            } => format!(
                "Price: {:.2} (Prev close → change {:.1}%)\n\
                 Volume: {}\n\n\
                 Recent News:\n{}\n\n\
                 Time (UTC): {}\n\
                 ⚠️ Not financial advice.",
                round_dp(*price, 2),
                round_dp(*change_pct, 1),
                volume_line(*volume, *avg_volume),
                render_headlines(headlines),
                time
            ),
            NotificationEvent::PreBreakout {
                triggers,
                price,
                change_pct,
                volume,
                avg_volume,
                headlines,
                ..
            } => format!(
                "Price: {:.2} (change {:.1}%)\n\
                 Triggers: {}\n\
                 Volume: {}\n\n\
                 Recent News:\n{}\n\n\
                 Time (UTC): {}\n\
                 ⚠️ Possible pre-breakout signal — verify before trading.",
                round_dp(*price, 2),
                round_dp(*change_pct, 1),
                triggers.join(", "),
                volume_line(*volume, *avg_volume),
                render_headlines(headlines),
                time
            ),
            NotificationEvent::Custom { message, .. } => message.clone(),
        }
    }
}

fn volume_line(volume: u64, avg_volume: u64) -> String {
    format!(
        "{} (avg {})",
        volume.to_formatted_string(&Locale::en),
        avg_volume.to_formatted_string(&Locale::en)
    )
}

fn render_headlines(headlines: &[Headline]) -> String {
    if headlines.is_empty() {
        return NO_NEWS_PLACEHOLDER.to_string();
    }
    headlines
        .iter()
        .map(Headline::render_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 5).unwrap()
    }

    #[test]
    fn test_threshold_subject_and_body() {
        let notification = Notification::new(NotificationEvent::ThresholdCrossed {
            ticker: "TSLA".to_string(),
            level: 5,
            price: dec!(106),
            change_pct: dec!(6.04),
            volume: 5_000_000,
            avg_volume: 1_000_000,
            headlines: vec![Headline::new("Tesla beats estimates", "Reuters")],
        })
        .with_timestamp(fixed_time());

        assert_eq!(notification.subject(), "🚀 TSLA +6.0% | Threshold +5%");
        let body = notification.body();
        assert!(body.starts_with("Price: 106.00 (Prev close → change 6.0%)\n"));
        assert!(body.contains("Volume: 5,000,000 (avg 1,000,000)"));
        assert!(body.contains("- Tesla beats estimates (Reuters)"));
        assert!(body.contains("Time (UTC): 2024-03-15 14:30:05"));
        assert!(body.ends_with("Not financial advice."));
    }

    #[test]
    fn test_prices_and_percentages_are_rounded() {
        let notification = Notification::new(NotificationEvent::ThresholdCrossed {
            ticker: "T".to_string(),
            level: 5,
            price: dec!(106.456),
            change_pct: dec!(6.06),
            volume: 1,
            avg_volume: 1,
            headlines: vec![],
        })
        .with_timestamp(fixed_time());

        assert_eq!(notification.subject(), "🚀 T +6.1% | Threshold +5%");
        assert!(notification
            .body()
            .starts_with("Price: 106.46 (Prev close → change 6.1%)\n"));

        let prebreak = Notification::new(NotificationEvent::PreBreakout {
            ticker: "T".to_string(),
            triggers: vec![],
            price: dec!(9.999),
            change_pct: dec!(-0.96),
            volume: 1,
            avg_volume: 1,
            headlines: vec![],
        })
        .with_timestamp(fixed_time());

        assert!(prebreak.subject().ends_with("| -1.0%"));
        assert!(prebreak.body().starts_with("Price: 10.00 (change -1.0%)"));
    }

    #[test]
    fn test_prebreak_subject_lists_triggers() {
        let notification = Notification::new(NotificationEvent::PreBreakout {
            ticker: "AMD".to_string(),
            triggers: vec!["Gap +4.0%".to_string(), "Breakout 20d > 105.00".to_string()],
            price: dec!(106),
            change_pct: dec!(6),
            volume: 10,
            avg_volume: 5,
            headlines: vec![],
        })
        .with_timestamp(fixed_time());

        assert_eq!(
            notification.subject(),
            "⚡ PRE-BREAKOUT: AMD — Gap +4.0%, Breakout 20d > 105.00 | 6.0%"
        );
        let body = notification.body();
        assert!(body.contains("Triggers: Gap +4.0%, Breakout 20d > 105.00"));
        assert!(body.contains(NO_NEWS_PLACEHOLDER));
        assert_eq!(notification.ticker(), Some("AMD"));
    }
}
