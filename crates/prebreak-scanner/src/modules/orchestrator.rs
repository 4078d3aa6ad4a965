//! 실행 오케스트레이터.
//!
//! 한 번의 실행 흐름:
//! 1. 상태 로드
//! 2. 유니버스 확인 (필요 시 갱신)
//! 3. 시각 기반 배치 선택 + Hot List 합치기
//! 4. 종목별 스냅샷/감성 조회 후 신호 평가
//! 5. 새 신호는 상태에 먼저 기록한 뒤 알림 전송 (최대 1회 전송)
//! 6. 마지막 실행 시각 기록 후 상태 저장

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use prebreak_core::{
    Headline, HotList, NewsProvider, ProviderError, SignalConfig, SignalEvaluator, SignalResult,
    SnapshotProvider, UniverseProvider,
};
use prebreak_notification::{Notification, NotificationEvent, NotificationSender};
use tracing::{debug, error, info, warn};

use crate::config::{BatchConfig, ScannerConfig, UniverseConfig};
use crate::modules::batch::{Batch, BatchScheduler};
use crate::modules::state_store::AlertStateStore;
use crate::modules::universe::resolve_universe;
use crate::stats::ScanStats;
use crate::Result;

/// 실행에 필요한 설정 묶음.
#[derive(Debug, Clone, Default)]
pub struct ScanSettings {
    pub universe: UniverseConfig,
    pub batch: BatchConfig,
    pub signal: SignalConfig,
}

impl From<&ScannerConfig> for ScanSettings {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            universe: config.universe.clone(),
            batch: config.batch.clone(),
            signal: config.signal.clone(),
        }
    }
}

/// 외부 협력 객체.
#[derive(Clone)]
pub struct Collaborators {
    pub universe: Arc<dyn UniverseProvider>,
    pub snapshots: Arc<dyn SnapshotProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub notifier: Arc<dyn NotificationSender>,
}

/// 발생한 알림 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// 상승률 구간 (%)
    Threshold(u32),
    PreBreakout,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Threshold(level) => write!(f, "+{}%", level),
            Self::PreBreakout => write!(f, "pre-breakout"),
        }
    }
}

/// 이번 실행에서 발생한 알림 하나.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub ticker: String,
    pub kind: AlertKind,
    /// 전송 성공 여부 (실패해도 상태에는 기록됨)
    pub delivered: bool,
}

/// 실행 결과.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// 선택된 배치 번호 (유니버스가 비어 있으면 `None`)
    pub batch_index: Option<usize>,
    pub batch_total: usize,
    /// 스캔한 종목 (배치 순서 + Hot List 추가분)
    pub scanned: Vec<String>,
    pub alerts: Vec<AlertEvent>,
    pub stats: ScanStats,
    /// 상태 저장 성공 여부
    pub persisted: bool,
}

impl RunReport {
    fn for_batch(batch: &Batch, scanned: Vec<String>) -> Self {
        Self {
            batch_index: Some(batch.index),
            batch_total: batch.total,
            stats: ScanStats {
                total: scanned.len(),
                ..ScanStats::new()
            },
            scanned,
            ..Self::default()
        }
    }

    /// 특정 종목의 알림 목록
    pub fn alerts_for(&self, ticker: &str) -> Vec<AlertKind> {
        self.alerts
            .iter()
            .filter(|a| a.ticker == ticker)
            .map(|a| a.kind)
            .collect()
    }
}

/// 종목 하나의 스캔 결과.
enum TickerOutcome {
    Skipped,
    NoSignal,
    Signal(SignalResult),
}

/// 배치와 Hot List를 합쳐 스캔 목록을 만듭니다.
///
/// 배치 순서를 먼저 유지하고, 배치에 없는 Hot List 종목을 뒤에 붙입니다.
pub fn build_scan_set(batch: &[String], hot_list: &HotList) -> Vec<String> {
    let mut seen = HashSet::new();
    batch
        .iter()
        .chain(hot_list.iter())
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

/// 스캐너
pub struct Scanner {
    settings: ScanSettings,
    scheduler: BatchScheduler,
    evaluator: SignalEvaluator,
    store: AlertStateStore,
    collaborators: Collaborators,
}

impl Scanner {
    pub fn new(
        settings: ScanSettings,
        store: AlertStateStore,
        collaborators: Collaborators,
    ) -> Self {
        let scheduler = BatchScheduler::new(settings.batch.batch_size, settings.batch.window_secs);
        let evaluator = SignalEvaluator::new(settings.signal.clone());
        Self {
            settings,
            scheduler,
            evaluator,
            store,
            collaborators,
        }
    }

    pub fn store(&self) -> &AlertStateStore {
        &self.store
    }

    /// 한 번의 스캔을 실행합니다.
    ///
    /// 종목 단위 에러는 해당 종목만 건너뛰며, 유니버스를 전혀 얻지 못한
    /// 경우에만 에러를 반환합니다.
    pub async fn run_once(&mut self, now: DateTime<Utc>) -> Result<RunReport> {
        let start = Instant::now();
        let now_ts = now.timestamp();

        self.store.reload();

        let tickers = resolve_universe(
            &mut self.store,
            self.collaborators.universe.as_ref(),
            &self.settings.universe,
            now_ts,
        )
        .await?;

        let Some(batch) = self.scheduler.select(&tickers, now_ts) else {
            warn!("스캔할 배치 없음");
            self.store.mark_run(now_ts);
            let persisted = self.store.persist();
            return Ok(RunReport {
                persisted,
                ..RunReport::default()
            });
        };

        let scan_set = build_scan_set(&batch.tickers, self.store.hot_list());
        info!(
            batch = batch.index + 1,
            total = batch.total,
            batch_size = batch.tickers.len(),
            hot_list = self.store.hot_list().len(),
            scan = scan_set.len(),
            "스캔 시작"
        );

        let mut report = RunReport::for_batch(&batch, scan_set.clone());

        for ticker in &scan_set {
            match self.scan_ticker(ticker).await {
                Ok(TickerOutcome::Skipped) => report.stats.skipped += 1,
                Ok(TickerOutcome::NoSignal) => report.stats.evaluated += 1,
                Ok(TickerOutcome::Signal(result)) => {
                    report.stats.evaluated += 1;
                    report.stats.signals += 1;
                    self.dispatch(result, now, &mut report).await;
                }
                Err(e) => {
                    report.stats.errors += 1;
                    error!(ticker = %ticker, error = %e, "종목 스캔 실패");
                }
            }

            self.pace().await;
        }

        self.store.mark_run(now_ts);
        report.persisted = self.store.persist();
        report.stats.elapsed = start.elapsed();
        report.stats.log_summary("스캔");

        Ok(report)
    }

    async fn scan_ticker(&self, ticker: &str) -> std::result::Result<TickerOutcome, ProviderError> {
        let Some(snapshot) = self.collaborators.snapshots.fetch_snapshot(ticker).await? else {
            debug!(ticker, "스냅샷 없음");
            return Ok(TickerOutcome::Skipped);
        };

        if !snapshot.is_usable() {
            debug!(ticker, bars = snapshot.len(), "일봉 부족");
            return Ok(TickerOutcome::Skipped);
        }

        let sentiment = match self.collaborators.news.fetch_sentiment(ticker).await {
            Ok(score) => score,
            Err(e) => {
                warn!(ticker, error = %e, "감성 조회 실패");
                None
            }
        };

        let record = self.store.record(ticker);
        let outcome = match self.evaluator.evaluate(&snapshot, sentiment, record) {
            Some(result) => TickerOutcome::Signal(result),
            None => TickerOutcome::NoSignal,
        };
        Ok(outcome)
    }

    /// 신호를 기록하고 알림을 전송합니다.
    ///
    /// 기록이 전송보다 먼저이므로 전송에 실패해도 같은 신호는 다시 보내지 않습니다.
    async fn dispatch(&mut self, result: SignalResult, now: DateTime<Utc>, report: &mut RunReport) {
        let ticker = result.ticker.clone();
        let headlines = self.fetch_headlines(&ticker).await;

        if !result.new_thresholds.is_empty() {
            self.store.record_thresholds(&ticker, &result.new_thresholds);
            self.store.add_to_hot_list(&ticker);

            for &level in &result.new_thresholds {
                let notification = Notification::new(NotificationEvent::ThresholdCrossed {
                    ticker: ticker.clone(),
                    level,
                    price: result.price,
                    change_pct: result.change_pct,
                    volume: result.volume,
                    avg_volume: result.avg_volume,
                    headlines: headlines.clone(),
                })
                .with_timestamp(now);

                let delivered = self.deliver(&notification, &mut report.stats).await;
                report.alerts.push(AlertEvent {
                    ticker: ticker.clone(),
                    kind: AlertKind::Threshold(level),
                    delivered,
                });
            }
        }

        if result.prebreak_hit && self.store.record_prebreak(&ticker) {
            self.store.add_to_hot_list(&ticker);

            let notification = Notification::new(NotificationEvent::PreBreakout {
                ticker: ticker.clone(),
                triggers: result.triggers.iter().map(ToString::to_string).collect(),
                price: result.price,
                change_pct: result.change_pct,
                volume: result.volume,
                avg_volume: result.avg_volume,
                headlines,
            })
            .with_timestamp(now);

            let delivered = self.deliver(&notification, &mut report.stats).await;
            report.alerts.push(AlertEvent {
                ticker,
                kind: AlertKind::PreBreakout,
                delivered,
            });
        }
    }

    async fn fetch_headlines(&self, ticker: &str) -> Vec<Headline> {
        match self.collaborators.news.fetch_headlines(ticker).await {
            Ok(headlines) => headlines,
            Err(e) => {
                warn!(ticker, error = %e, "헤드라인 조회 실패");
                Vec::new()
            }
        }
    }

    async fn deliver(&self, notification: &Notification, stats: &mut ScanStats) -> bool {
        match self.collaborators.notifier.send(notification).await {
            Ok(()) => {
                stats.notifications_sent += 1;
                info!(
                    ticker = notification.ticker().unwrap_or_default(),
                    subject = %notification.subject(),
                    "알림 전송"
                );
                true
            }
            Err(e) => {
                stats.notifications_failed += 1;
                warn!(
                    notifier = self.collaborators.notifier.name(),
                    subject = %notification.subject(),
                    error = %e,
                    "알림 전송 실패 (상태는 기록됨)"
                );
                false
            }
        }
    }

    async fn pace(&self) {
        let delay: Duration = self.settings.batch.request_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_set_keeps_batch_order_then_hot_list() {
        let hot: HotList = ["ZZZ", "BBB", "AAA"].into_iter().map(String::from).collect();
        let scan = build_scan_set(&list(&["CCC", "BBB", "DDD"]), &hot);
        assert_eq!(scan, list(&["CCC", "BBB", "DDD", "AAA", "ZZZ"]));
    }

    #[test]
    fn test_scan_set_with_empty_hot_list() {
        let scan = build_scan_set(&list(&["A", "B"]), &HotList::new());
        assert_eq!(scan, list(&["A", "B"]));
    }

    #[test]
    fn test_alert_kind_display() {
        assert_eq!(AlertKind::Threshold(10).to_string(), "+10%");
        assert_eq!(AlertKind::PreBreakout.to_string(), "pre-breakout");
    }
}
