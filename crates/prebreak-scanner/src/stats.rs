//! 스캔 통계 구조체.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 한 번의 실행 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// 스캔 대상 종목 수
    pub total: usize,
    /// 평가 완료 (신호 유무와 무관)
    pub evaluated: usize,
    /// 신호 발생 종목 수
    pub signals: usize,
    /// 에러 횟수
    pub errors: usize,
    /// 데이터 없음/부족으로 건너뛴 횟수
    pub skipped: usize,
    /// 전송 성공 알림 수
    pub notifications_sent: usize,
    /// 전송 실패 알림 수 (상태에는 기록됨)
    pub notifications_failed: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ScanStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    ///
    /// skipped(데이터 부족 등 정상 건너뜀)는 분모에서 제외.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total.saturating_sub(self.skipped);
        if attempted == 0 {
            0.0
        } else {
            (self.evaluated as f64 / attempted as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            evaluated = self.evaluated,
            signals = self.signals,
            errors = self.errors,
            skipped = self.skipped,
            sent = self.notifications_sent,
            failed = self.notifications_failed,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "스캔 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_excludes_skipped() {
        let stats = ScanStats {
            total: 10,
            evaluated: 6,
            skipped: 2,
            errors: 2,
            ..Default::default()
        };
        assert!((stats.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_empty() {
        assert_eq!(ScanStats::new().success_rate(), 0.0);
    }
}
