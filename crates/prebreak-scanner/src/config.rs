//! 환경변수 기반 설정 모듈.
//!
//! 자격증명(`FINNHUB_API_KEY`, `DISCORD_WEBHOOK_URL`)은 필수이며, 나머지 값은
//! 환경변수가 없으면 기본값을 사용합니다.

use std::path::PathBuf;
use std::time::Duration;

use prebreak_core::SignalConfig;
use secrecy::SecretString;

use crate::error::ScannerError;
use crate::Result;

/// 기본 상태 파일 경로
pub const DEFAULT_STATE_FILE: &str = "state.json";

/// Scanner 전체 설정
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// 외부 서비스 자격증명
    pub credentials: CredentialConfig,
    /// Discord 메시지 표시 이름 (`DISCORD_DISPLAY_NAME`)
    pub discord_display_name: Option<String>,
    /// 상태 파일 경로
    pub state_file: PathBuf,
    /// 종목 유니버스 설정
    pub universe: UniverseConfig,
    /// 배치 순환 설정
    pub batch: BatchConfig,
    /// 뉴스 조회 설정
    pub news: NewsConfig,
    /// 신호 평가 설정
    pub signal: SignalConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 외부 서비스 자격증명
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    pub finnhub_api_key: SecretString,
    pub discord_webhook_url: SecretString,
}

/// 종목 유니버스 설정
#[derive(Debug, Clone)]
pub struct UniverseConfig {
    /// 최대 종목 수
    pub max_tickers: usize,
    /// 갱신 주기 (시간)
    pub ttl_hours: u64,
    /// 거래소 코드
    pub exchange: String,
}

/// 배치 순환 설정
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// 배치당 종목 수
    pub batch_size: usize,
    /// 배치 슬롯 길이 (초)
    pub window_secs: u64,
    /// 종목 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

/// 뉴스 조회 설정
#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// 헤드라인 조회 기간 (일)
    pub window_days: u64,
    /// 최대 헤드라인 수
    pub max_headlines: usize,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            max_tickers: 1000,
            ttl_hours: 24,
            exchange: "US".to_string(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            window_secs: 300,
            request_delay_ms: 1000,
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            window_days: 2,
            max_headlines: 3,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
        }
    }
}

impl ScannerConfig {
    /// 자격증명만 지정하고 나머지는 기본값으로 생성
    pub fn new(credentials: CredentialConfig) -> Self {
        Self {
            credentials,
            discord_display_name: None,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            universe: UniverseConfig::default(),
            batch: BatchConfig::default(),
            news: NewsConfig::default(),
            signal: SignalConfig::default(),
            daemon: DaemonConfig::default(),
        }
    }

    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let finnhub_api_key = required_env("FINNHUB_API_KEY")?;
        let discord_webhook_url = required_env("DISCORD_WEBHOOK_URL")?;

        let defaults = SignalConfig::default();

        Ok(Self {
            credentials: CredentialConfig {
                finnhub_api_key,
                discord_webhook_url,
            },
            discord_display_name: std::env::var("DISCORD_DISPLAY_NAME")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            state_file: state_file_from_env(),
            universe: UniverseConfig {
                max_tickers: env_var_parse("SCANNER_MAX_TICKERS", 1000),
                ttl_hours: env_var_parse("SCANNER_UNIVERSE_TTL_HOURS", 24),
                exchange: std::env::var("SCANNER_EXCHANGE").unwrap_or_else(|_| "US".to_string()),
            },
            batch: BatchConfig {
                batch_size: env_var_parse("SCANNER_BATCH_SIZE", 50),
                window_secs: env_var_parse("SCANNER_WINDOW_SECS", 300),
                request_delay_ms: env_var_parse("SCANNER_REQUEST_DELAY_MS", 1000),
            },
            news: NewsConfig {
                window_days: env_var_parse("SCANNER_NEWS_WINDOW_DAYS", 2),
                max_headlines: env_var_parse("SCANNER_MAX_HEADLINES", 3),
            },
            signal: SignalConfig {
                gap_threshold_pct: env_var_parse(
                    "SIGNAL_GAP_THRESHOLD",
                    defaults.gap_threshold_pct,
                ),
                volume_multiplier: env_var_parse(
                    "SIGNAL_VOLUME_MULTIPLIER",
                    defaults.volume_multiplier,
                ),
                breakout_lookback: env_var_parse(
                    "SIGNAL_BREAKOUT_LOOKBACK",
                    defaults.breakout_lookback,
                ),
                sentiment_positive: env_var_parse(
                    "SIGNAL_SENTIMENT_POSITIVE",
                    defaults.sentiment_positive,
                ),
                thresholds: env_var_list_parse("SIGNAL_THRESHOLDS", defaults.thresholds),
                min_triggers: env_var_parse("SIGNAL_MIN_TRIGGERS", defaults.min_triggers),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 5),
            },
        })
    }
}

impl UniverseConfig {
    /// 갱신 주기를 초 단위로 반환
    pub fn ttl_secs(&self) -> i64 {
        i64::try_from(self.ttl_hours.saturating_mul(3600)).unwrap_or(i64::MAX)
    }
}

impl BatchConfig {
    /// 종목 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl DaemonConfig {
    /// 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

/// 상태 파일 경로 (`STATE_FILE`, 기본 `state.json`).
///
/// 자격증명 없이 상태만 조회하는 명령에서도 사용합니다.
pub fn state_file_from_env() -> PathBuf {
    std::env::var("STATE_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))
}

/// 필수 환경변수 (공백 제거 후 비어 있으면 에러)
fn required_env(key: &str) -> Result<SecretString> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ScannerError::Config(format!("{} 환경변수가 설정되지 않았습니다", key)))
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 쉼표로 구분된 리스트 파싱 (하나라도 실패하면 기본값)
fn env_var_list_parse<T: std::str::FromStr>(key: &str, default: Vec<T>) -> Vec<T> {
    std::env::var(key)
        .ok()
        .and_then(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse().ok())
                .collect::<Option<Vec<T>>>()
        })
        .filter(|list| !list.is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ScannerConfig::new(CredentialConfig {
            finnhub_api_key: SecretString::from("k".to_string()),
            discord_webhook_url: SecretString::from("u".to_string()),
        });

        assert_eq!(config.universe.max_tickers, 1000);
        assert_eq!(config.universe.ttl_secs(), 24 * 3600);
        assert_eq!(config.batch.batch_size, 50);
        assert_eq!(config.batch.window_secs, 300);
        assert_eq!(config.batch.request_delay(), Duration::from_secs(1));
        assert_eq!(config.daemon.interval(), Duration::from_secs(300));
        assert_eq!(config.signal.thresholds, vec![5, 10, 20]);
        assert_eq!(config.state_file, PathBuf::from("state.json"));
    }

    #[test]
    fn test_huge_durations_saturate() {
        let universe = UniverseConfig {
            ttl_hours: u64::MAX,
            ..UniverseConfig::default()
        };
        assert_eq!(universe.ttl_secs(), i64::MAX);

        let daemon = DaemonConfig {
            interval_minutes: u64::MAX,
        };
        assert_eq!(daemon.interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_env_var_list_parse() {
        std::env::set_var("PREBREAK_TEST_LIST_OK", " 3, 7 ,15");
        std::env::set_var("PREBREAK_TEST_LIST_BAD", "3,x");

        assert_eq!(
            env_var_list_parse::<u32>("PREBREAK_TEST_LIST_OK", vec![1]),
            vec![3, 7, 15]
        );
        assert_eq!(
            env_var_list_parse::<u32>("PREBREAK_TEST_LIST_BAD", vec![1]),
            vec![1]
        );
        assert_eq!(
            env_var_list_parse::<u32>("PREBREAK_TEST_LIST_MISSING", vec![1]),
            vec![1]
        );
    }

    #[test]
    fn test_required_env_rejects_blank() {
        std::env::set_var("PREBREAK_TEST_BLANK_KEY", "   ");
        let err = required_env("PREBREAK_TEST_BLANK_KEY").unwrap_err();
        assert!(err.is_fatal());
        assert!(required_env("PREBREAK_TEST_UNSET_KEY").is_err());
    }
}
