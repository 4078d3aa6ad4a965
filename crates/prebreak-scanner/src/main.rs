//! Pre-breakout scanner CLI.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use prebreak_data::{FinnhubClient, FinnhubConfig, YahooSnapshotProvider};
use prebreak_notification::{DiscordConfig, DiscordSender};
use prebreak_scanner::modules::{
    AlertStateStore, Collaborators, JsonFileBackend, RunReport, ScanSettings, Scanner,
};
use prebreak_scanner::{config, ScannerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "prebreak-scanner")]
#[command(about = "Pre-breakout & threshold alert scanner", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (RUST_LOG가 있으면 무시)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// JSON 형식 로그 출력
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 스캔 1회 실행
    Run,
    /// 주기적으로 스캔 실행 (Ctrl+C로 종료)
    Daemon {
        /// 실행 주기 (분), 생략 시 DAEMON_INTERVAL_MINUTES
        #[arg(long)]
        interval_minutes: Option<u64>,
    },
    /// 저장된 상태 요약 출력
    ShowState,
    /// Discord 테스트 메시지 전송
    TestNotify,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "prebreak_scanner={},prebreak_data={},prebreak_notification={}",
            log_level, log_level, log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn discord_config(config: &ScannerConfig) -> DiscordConfig {
    DiscordConfig::new(config.credentials.discord_webhook_url.clone())
        .with_display_name(config.discord_display_name.clone())
}

fn build_scanner(config: &ScannerConfig) -> anyhow::Result<Scanner> {
    let mut finnhub_config = FinnhubConfig::new(config.credentials.finnhub_api_key.clone())
        .with_news_window_days(config.news.window_days);
    finnhub_config.exchange = config.universe.exchange.clone();
    finnhub_config.max_headlines = config.news.max_headlines;
    let finnhub = Arc::new(FinnhubClient::new(finnhub_config));

    let yahoo = YahooSnapshotProvider::new().context("Yahoo Finance 커넥터 초기화 실패")?;
    let discord = DiscordSender::new(discord_config(config));

    let collaborators = Collaborators {
        universe: finnhub.clone(),
        snapshots: Arc::new(yahoo),
        news: finnhub,
        notifier: Arc::new(discord),
    };

    let store = AlertStateStore::new(JsonFileBackend::new(&config.state_file));
    Ok(Scanner::new(ScanSettings::from(config), store, collaborators))
}

fn print_report(report: &RunReport) {
    match report.batch_index {
        Some(index) => println!(
            "배치 {}/{} | 스캔 {}개 | 신호 {}개 | 에러 {}개",
            index + 1,
            report.batch_total,
            report.scanned.len(),
            report.stats.signals,
            report.stats.errors
        ),
        None => println!("스캔할 종목이 없습니다."),
    }

    for alert in &report.alerts {
        let status = if alert.delivered { "전송" } else { "전송 실패" };
        println!("  {} {} ({})", alert.ticker, alert.kind, status);
    }

    if !report.persisted {
        println!("⚠ 상태 저장 실패: 다음 실행은 마지막 저장본에서 시작합니다.");
    }
}

async fn run_daemon(mut scanner: Scanner, interval_minutes: u64) {
    let period = std::time::Duration::from_secs(interval_minutes.max(1).saturating_mul(60));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(interval_minutes, "데몬 모드 시작");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("종료 신호 수신");
                break;
            }
            _ = interval.tick() => {
                // 실행 중에는 종료 신호를 받지 않음 (기록/전송 도중 중단 방지)
                match scanner.run_once(Utc::now()).await {
                    Ok(report) => tracing::info!(
                        alerts = report.alerts.len(),
                        persisted = report.persisted,
                        "다음 실행: {}분 후",
                        interval_minutes
                    ),
                    Err(e) => tracing::error!(error = %e, "스캔 실패"),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Run => {
            let config = ScannerConfig::from_env()?;
            let mut scanner = build_scanner(&config)?;
            let report = scanner.run_once(Utc::now()).await?;
            print_report(&report);
        }
        Commands::Daemon { interval_minutes } => {
            let config = ScannerConfig::from_env()?;
            let scanner = build_scanner(&config)?;
            let minutes = interval_minutes.unwrap_or(config.daemon.interval_minutes);
            run_daemon(scanner, minutes).await;
        }
        Commands::ShowState => {
            let path = config::state_file_from_env();
            let store = AlertStateStore::open(JsonFileBackend::new(&path));
            let state = store.state();

            println!("상태 파일: {}", path.display());
            println!(
                "유니버스: {}개 (조회 시각 {})",
                state.universe.len(),
                state.universe.fetched_at
            );
            println!(
                "Hot List ({}개): {}",
                state.hot_list.len(),
                state.hot_list.iter().cloned().collect::<Vec<_>>().join(", ")
            );
            println!("알림 기록: {}개 종목", state.alerts_sent.len());
            for (ticker, record) in &state.alerts_sent {
                let levels: Vec<String> =
                    record.thresholds.iter().map(|l| format!("+{}%", l)).collect();
                println!(
                    "  {}: [{}]{}",
                    ticker,
                    levels.join(", "),
                    if record.prebreak { " pre-breakout" } else { "" }
                );
            }
            match state.last_run {
                Some(ts) => println!("마지막 실행: {}", ts),
                None => println!("마지막 실행: 없음"),
            }
        }
        Commands::TestNotify => {
            let config = ScannerConfig::from_env()?;
            let sender = DiscordSender::new(discord_config(&config));
            sender.send_test().await.context("Discord 테스트 메시지 전송 실패")?;
            println!("✓ Discord 테스트 메시지 전송 완료");
        }
    }

    Ok(())
}
