//! 스캔 대상 종목 유니버스.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// 심볼 정규화.
///
/// 앞뒤 공백 제거 후 대문자로 변환합니다. 공백, `/`, `.`이 포함된 심볼
/// (우선주, 워런트 등)이나 빈 문자열은 `None`.
pub fn sanitize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return None;
    }
    if symbol
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '.')
    {
        return None;
    }
    Some(symbol)
}

/// 순서가 유지되는 종목 목록과 조회 시각.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerUniverse {
    #[serde(default)]
    pub tickers: Vec<String>,
    /// 조회 시각 (Unix 초)
    #[serde(
        default,
        rename = "tickers_fetched_at",
        alias = "tickersFetchedAt"
    )]
    pub fetched_at: i64,
}

impl TickerUniverse {
    /// Provider 원본 심볼 목록에서 유니버스를 생성합니다.
    ///
    /// 정규화에 실패한 심볼은 버리고, 중복은 처음 등장한 위치만 남긴 뒤
    /// 최대 `max_tickers`개로 자릅니다.
    pub fn from_raw<I, S>(raw: I, max_tickers: usize, fetched_at: i64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let tickers = raw
            .into_iter()
            .filter_map(|s| sanitize_symbol(s.as_ref()))
            .filter(|s| seen.insert(s.clone()))
            .take(max_tickers)
            .collect();

        Self {
            tickers,
            fetched_at,
        }
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// 갱신이 필요한지 확인합니다. 비어 있으면 항상 갱신 대상입니다.
    pub fn is_stale(&self, now: i64, ttl_secs: i64) -> bool {
        self.tickers.is_empty() || now.saturating_sub(self.fetched_at) >= ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_symbol() {
        assert_eq!(sanitize_symbol(" aapl "), Some("AAPL".to_string()));
        assert_eq!(sanitize_symbol("BRK.B"), None);
        assert_eq!(sanitize_symbol("ABC/WS"), None);
        assert_eq!(sanitize_symbol("AB C"), None);
        assert_eq!(sanitize_symbol("   "), None);
    }

    #[test]
    fn test_from_raw_dedupes_and_caps() {
        let raw = ["msft", "AAPL", "MSFT", "BRK.B", "tsla", "NVDA"];
        let universe = TickerUniverse::from_raw(raw, 3, 100);

        assert_eq!(universe.tickers, vec!["MSFT", "AAPL", "TSLA"]);
        assert_eq!(universe.fetched_at, 100);
    }

    #[test]
    fn test_is_stale() {
        let universe = TickerUniverse::from_raw(["AAPL"], 10, 1_000);
        assert!(!universe.is_stale(1_000 + 3_599, 3_600));
        assert!(universe.is_stale(1_000 + 3_600, 3_600));
        assert!(TickerUniverse::default().is_stale(0, 3_600));
    }
}
