//! 스캐너 알림 전송.
//!
//! - [`types`] - 알림 이벤트, 제목/본문 렌더링, `NotificationSender` trait
//! - [`discord`] - Discord Webhook 전송기

pub mod discord;
pub mod types;

pub use discord::{DiscordConfig, DiscordSender, MAX_BODY_CHARS};
pub use types::{
    Notification, NotificationError, NotificationEvent, NotificationResult,
    NotificationSender,
};
