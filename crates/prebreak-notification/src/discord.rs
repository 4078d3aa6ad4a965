//! Discord 알림 서비스.
//!
//! Discord Webhook으로 스캐너 알림을 전송합니다.
//! 메시지는 `**{제목}**` 한 줄과 코드 블록으로 감싼 본문으로 구성됩니다.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::types::{Notification, NotificationError, NotificationResult, NotificationSender};

/// 본문 최대 길이 (문자 수). Discord 메시지 한도 2000자에서 제목 여유분을 뺀 값.
pub const MAX_BODY_CHARS: usize = 1900;

/// Rate limit 응답에 대기 시간이 없을 때 사용하는 기본값 (초)
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Discord 알림 전송 설정.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Discord Webhook URL (토큰 포함)
    pub webhook_url: SecretString,
    /// 표시 이름 (봇 이름으로 표시)
    pub display_name: Option<String>,
    /// 요청 타임아웃
    pub timeout: Duration,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("webhook_url", &"***")
            .field("display_name", &self.display_name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DiscordConfig {
    /// 새 Discord 설정을 생성합니다.
    pub fn new(webhook_url: SecretString) -> Self {
        Self {
            webhook_url,
            display_name: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// 표시 이름을 설정합니다. `None`이면 Webhook 기본 이름을 사용합니다.
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }
}

/// Discord 알림 전송기.
pub struct DiscordSender {
    config: DiscordConfig,
    client: reqwest::Client,
}

impl DiscordSender {
    /// 새 Discord 전송기를 생성합니다.
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 알림을 Discord 메시지 본문으로 포맷합니다. 본문은 1900자에서 잘립니다.
    fn format_content(&self, notification: &Notification) -> String {
        let body: String = notification.body().chars().take(MAX_BODY_CHARS).collect();
        format!("**{}**\n```{}```", notification.subject(), body)
    }

    /// Discord Webhook을 통해 메시지를 전송합니다.
    async fn send_webhook(&self, content: String) -> NotificationResult<()> {
        let mut payload = json!({ "content": content });

        // 봇 이름 설정
        if let Some(ref name) = self.config.display_name {
            payload["username"] = json!(name);
        }

        debug!("Sending Discord webhook message");

        let response = self
            .client
            .post(self.config.webhook_url.expose_secret())
            .json(&payload)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if matches!(status.as_u16(), 200 | 204) {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();

        // 요청 한도 제한 확인
        if status.as_u16() == 429 {
            let retry_after = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("retry_after").and_then(Value::as_f64))
                .map(|secs| secs.ceil() as u64)
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(retry_after, "Discord rate limited");
            return Err(NotificationError::RateLimited(retry_after));
        }

        let body: String = body.chars().take(300).collect();
        error!("Discord webhook 전송 실패: {} - {}", status, body);
        Err(NotificationError::SendFailed(format!(
            "HTTP {}: {}",
            status, body
        )))
    }

    /// 테스트 메시지를 전송합니다.
    pub async fn send_test(&self) -> NotificationResult<()> {
        self.send_webhook(
            "**✓ Discord 알림 설정 완료**\n```Pre-breakout 스캐너 알림이 이 채널로 전송됩니다.```"
                .to_string(),
        )
        .await
    }
}

#[async_trait]
impl NotificationSender for DiscordSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        let content = self.format_content(notification);
        self.send_webhook(content).await?;
        info!(subject = %notification.subject(), "Discord 알림 전송 완료");
        Ok(())
    }

    fn name(&self) -> &str {
        "discord"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationEvent;
    use mockito::Matcher;

    fn sender_for(url: String) -> DiscordSender {
        DiscordSender::new(DiscordConfig::new(SecretString::from(url)))
    }

    fn custom(title: &str, message: String) -> Notification {
        Notification::new(NotificationEvent::Custom {
            title: title.to_string(),
            message,
        })
    }

    #[test]
    fn test_discord_config_new() {
        let config = DiscordConfig::new(SecretString::from(
            "https://discord.com/api/webhooks/123/abc".to_string(),
        ));
        assert!(config.display_name.is_none());
        assert!(!format!("{:?}", config).contains("webhooks"));
    }

    #[test]
    fn test_format_content_wraps_body() {
        let sender = sender_for("https://example.com".to_string());
        let content = sender.format_content(&custom("제목", "본문".to_string()));

        assert_eq!(content, "**제목**\n```본문```");
    }

    #[test]
    fn test_format_content_truncates_body() {
        let sender = sender_for("https://example.com".to_string());
        let content = sender.format_content(&custom("T", "x".repeat(5_000)));

        assert_eq!(content.matches('x').count(), MAX_BODY_CHARS);
        assert!(content.ends_with("```"));
    }

    #[tokio::test]
    async fn test_send_accepts_no_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhook")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "content": "**hello**\n```world```" }),
            ))
            .with_status(204)
            .create_async()
            .await;

        let sender = sender_for(format!("{}/webhook", server.url()));
        sender
            .send(&custom("hello", "world".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/webhook")
            .with_status(429)
            .with_body(r#"{"message":"You are being rate limited.","retry_after":1.5}"#)
            .create_async()
            .await;

        let sender = sender_for(format!("{}/webhook", server.url()));
        let err = sender
            .send(&custom("hello", "world".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::RateLimited(2)));
    }

    #[tokio::test]
    async fn test_send_failure_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/webhook")
            .with_status(400)
            .with_body("bad request")
            .create_async()
            .await;

        let sender = sender_for(format!("{}/webhook", server.url()));
        let err = sender
            .send(&custom("hello", "world".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, NotificationError::SendFailed(msg) if msg.contains("400")));
    }

    #[tokio::test]
    async fn test_display_name_sent_as_username() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/webhook")
            .match_body(Matcher::PartialJson(
                serde_json::json!({ "username": "Prebreak Bot" }),
            ))
            .with_status(204)
            .create_async()
            .await;

        let config = DiscordConfig::new(SecretString::from(format!("{}/webhook", server.url())))
            .with_display_name(Some("Prebreak Bot".to_string()));
        DiscordSender::new(config)
            .send(&custom("t", "m".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
