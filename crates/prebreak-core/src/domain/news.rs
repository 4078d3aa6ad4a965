//! 뉴스 헤드라인.

use serde::{Deserialize, Serialize};

/// 알림 본문에 첨부되는 헤드라인 최대 길이 (문자 수)
pub const MAX_HEADLINE_CHARS: usize = 200;

/// 최근 뉴스 헤드라인.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    /// 헤드라인 본문
    #[serde(default)]
    pub headline: String,
    /// 출처 (예: Reuters)
    #[serde(default)]
    pub source: String,
}

impl Headline {
    pub fn new(headline: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            source: source.into(),
        }
    }

    /// 알림 본문용 한 줄 표현 (`- {headline} ({source})`).
    pub fn render_line(&self) -> String {
        let text: String = self.headline.chars().take(MAX_HEADLINE_CHARS).collect();
        format!("- {} ({})", text, self.source)
    }
}
