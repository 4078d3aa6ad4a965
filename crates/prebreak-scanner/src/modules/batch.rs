//! 시각 기반 배치 스케줄러.
//!
//! 유니버스를 `batch_size`개씩 연속 구간으로 나누고, 현재 Unix 시각을
//! `window_secs`로 나눈 슬롯 번호로 이번 실행의 배치를 고릅니다.
//!
//! ```text
//! slot  = now / window_secs
//! index = slot % ceil(N / batch_size)
//! ```
//!
//! 다음 배치를 저장할 필요가 없으므로 실행이 누락되거나 겹쳐도 순환이 유지됩니다.

/// 이번 실행에 선택된 배치.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub tickers: Vec<String>,
    /// 배치 번호 (0부터 시작)
    pub index: usize,
    /// 전체 배치 수
    pub total: usize,
}

/// 배치 스케줄러
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
    window_secs: u64,
}

impl BatchScheduler {
    /// 0은 1로 보정됩니다.
    pub fn new(batch_size: usize, window_secs: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
            window_secs: window_secs.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 슬롯 번호 (음수 시각은 0으로 취급)
    pub fn slot(&self, now_unix: i64) -> u64 {
        u64::try_from(now_unix).unwrap_or(0) / self.window_secs
    }

    /// 전체 배치 수 (`ceil(N / batch_size)`)
    pub fn batch_count(&self, universe_len: usize) -> usize {
        universe_len.div_ceil(self.batch_size)
    }

    /// 현재 시각의 배치를 선택합니다. 유니버스가 비어 있으면 `None`.
    pub fn select(&self, universe: &[String], now_unix: i64) -> Option<Batch> {
        let total = self.batch_count(universe.len());
        if total == 0 {
            return None;
        }

        let index = (self.slot(now_unix) % total as u64) as usize;
        let tickers = universe.chunks(self.batch_size).nth(index)?.to_vec();

        Some(Batch {
            tickers,
            index,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn universe(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("T{:03}", i)).collect()
    }

    #[test]
    fn test_same_window_selects_same_batch() {
        let scheduler = BatchScheduler::new(50, 300);
        let tickers = universe(230);
        let base = 1_700_000_100 - (1_700_000_100 % 300);

        let first = scheduler.select(&tickers, base).unwrap();
        let second = scheduler.select(&tickers, base + 299).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_consecutive_windows_cover_universe_exactly_once() {
        let scheduler = BatchScheduler::new(50, 300);
        let tickers = universe(230);
        let total = scheduler.batch_count(tickers.len());
        assert_eq!(total, 5);

        let start = 1_700_000_000;
        let mut seen: HashMap<String, usize> = HashMap::new();
        for k in 0..total as i64 {
            let batch = scheduler.select(&tickers, start + k * 300).unwrap();
            for ticker in batch.tickers {
                *seen.entry(ticker).or_insert(0) += 1;
            }
        }

        assert_eq!(seen.len(), tickers.len());
        assert!(seen.values().all(|count| *count == 1));
    }

    #[test]
    fn test_wraps_around_and_last_batch_is_smaller() {
        let scheduler = BatchScheduler::new(50, 300);
        let tickers = universe(120);

        // slot 2 → 마지막 배치 (20개)
        let last = scheduler.select(&tickers, 2 * 300).unwrap();
        assert_eq!(last.index, 2);
        assert_eq!(last.tickers.len(), 20);
        assert_eq!(last.tickers[0], "T100");

        // slot 3 → 다시 첫 배치
        let wrapped = scheduler.select(&tickers, 3 * 300).unwrap();
        assert_eq!(wrapped.index, 0);
        assert_eq!(wrapped.tickers[0], "T000");
    }

    #[test]
    fn test_empty_universe_has_no_batch() {
        let scheduler = BatchScheduler::new(50, 300);
        assert!(scheduler.select(&[], 1_700_000_000).is_none());
    }

    #[test]
    fn test_zero_parameters_are_clamped() {
        let scheduler = BatchScheduler::new(0, 0);
        let batch = scheduler.select(&universe(3), 7).unwrap();
        assert_eq!(batch.total, 3);
        assert_eq!(batch.index, 1);
    }
}
