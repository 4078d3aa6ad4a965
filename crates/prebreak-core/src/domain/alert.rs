//! 종목별 알림 기록과 Hot List.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// 종목별 알림 전송 기록.
///
/// - `thresholds`: 이미 알림을 보낸 상승률 구간. 추가만 가능합니다.
/// - `prebreak`: Pre-breakout 알림 발송 여부. 한 번 설정되면 해제되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(default)]
    pub thresholds: BTreeSet<u32>,
    #[serde(default)]
    pub prebreak: bool,
}

impl AlertRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_threshold(&self, level: u32) -> bool {
        self.thresholds.contains(&level)
    }

    /// 상승률 구간을 기록합니다. 새로 추가된 구간 수를 반환합니다.
    pub fn record_thresholds(&mut self, levels: &[u32]) -> usize {
        levels
            .iter()
            .filter(|level| self.thresholds.insert(**level))
            .count()
    }

    /// Pre-breakout 래치를 설정합니다. 이번 호출로 새로 설정된 경우에만 `true`.
    pub fn latch_prebreak(&mut self) -> bool {
        !std::mem::replace(&mut self.prebreak, true)
    }
}

/// 한 번이라도 알림이 발생한 종목 집합.
///
/// 배치 순번과 무관하게 매 실행마다 스캔됩니다. 삭제 API는 제공하지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HotList(BTreeSet<String>);

impl HotList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 종목 추가. 새로 추가되었으면 `true`.
    pub fn insert(&mut self, ticker: impl Into<String>) -> bool {
        self.0.insert(ticker.into())
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains(ticker)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl FromIterator<String> for HotList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<String> for HotList {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a HotList {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_thresholds_only_counts_new_levels() {
        let mut record = AlertRecord::new();
        assert_eq!(record.record_thresholds(&[5, 10]), 2);
        assert_eq!(record.record_thresholds(&[5, 10, 20]), 1);
        assert_eq!(record.thresholds.iter().copied().collect::<Vec<_>>(), vec![5, 10, 20]);
    }

    #[test]
    fn test_prebreak_latch_is_one_shot() {
        let mut record = AlertRecord::new();
        assert!(record.latch_prebreak());
        assert!(!record.latch_prebreak());
        assert!(record.prebreak);
    }

    #[test]
    fn test_hot_list_deduplicates() {
        let mut hot = HotList::new();
        assert!(hot.insert("TSLA"));
        assert!(!hot.insert("TSLA"));
        hot.extend(vec!["AAPL".to_string(), "TSLA".to_string()]);

        assert_eq!(hot.len(), 2);
        assert!(hot.contains("AAPL"));
    }

    #[test]
    fn test_alert_record_accepts_partial_json() {
        let record: AlertRecord = serde_json::from_str(r#"{"thresholds":[10,5]}"#).unwrap();
        assert!(!record.prebreak);
        assert!(record.has_threshold(5));
        assert!(record.has_threshold(10));
    }
}
