//! 알림 상태 저장소.
//!
//! 종목별 발송 기록, Hot List, 캐시된 유니버스, 마지막 실행 시각을 하나의 JSON
//! 문서로 보관합니다. 저장은 임시 파일에 쓴 뒤 rename 하므로 중간에 중단되어도
//! 이전 문서가 그대로 남습니다.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use prebreak_core::{AlertRecord, HotList, PersistedState, TickerUniverse};
use tracing::{debug, error, info, warn};

use crate::error::ScannerError;
use crate::Result;

/// 상태 문서 저장 백엔드.
pub trait StateBackend: Send + Sync {
    /// 저장된 문서를 읽습니다. 아직 저장된 적이 없으면 `None`.
    fn load(&self) -> Result<Option<String>>;

    /// 문서 전체를 교체합니다.
    fn save(&self, document: &str) -> Result<()>;

    /// 로그용 설명
    fn describe(&self) -> String;
}

/// JSON 파일 백엔드.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(document) => Ok(Some(document)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, document: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(document.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// 메모리 백엔드 (테스트용).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<Option<String>>,
    fail_saves: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// 마지막으로 저장된 문서
    pub fn document(&self) -> Option<String> {
        self.document.lock().ok().and_then(|d| d.clone())
    }

    /// 이후 저장을 실패시킵니다.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.document())
    }

    fn save(&self, document: &str) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ScannerError::Io(std::io::Error::other(
                "memory backend save disabled",
            )));
        }
        let mut slot = self
            .document
            .lock()
            .map_err(|_| ScannerError::Io(std::io::Error::other("memory backend poisoned")))?;
        *slot = Some(document.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl<B: StateBackend + ?Sized> StateBackend for std::sync::Arc<B> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, document: &str) -> Result<()> {
        (**self).save(document)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// 알림 상태 저장소.
pub struct AlertStateStore {
    backend: Box<dyn StateBackend>,
    state: PersistedState,
}

impl AlertStateStore {
    /// 빈 상태로 생성합니다. 저장된 문서는 [`reload`](Self::reload)로 읽습니다.
    pub fn new(backend: impl StateBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            state: PersistedState::default(),
        }
    }

    /// 생성 후 저장된 문서를 바로 읽습니다.
    pub fn open(backend: impl StateBackend + 'static) -> Self {
        let mut store = Self::new(backend);
        store.reload();
        store
    }

    /// 저장된 문서를 다시 읽습니다.
    ///
    /// 문서가 없거나 손상되었거나 읽을 수 없으면 빈 상태에서 시작합니다.
    pub fn reload(&mut self) {
        let source = self.backend.describe();
        self.state = match self.backend.load() {
            Ok(Some(document)) => match serde_json::from_str::<PersistedState>(&document) {
                Ok(state) => {
                    debug!(
                        source = %source,
                        records = state.alerts_sent.len(),
                        hot_list = state.hot_list.len(),
                        "상태 로드"
                    );
                    state
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "상태 파일 손상, 빈 상태로 시작");
                    PersistedState::default()
                }
            },
            Ok(None) => {
                info!(source = %source, "상태 파일 없음, 빈 상태로 시작");
                PersistedState::default()
            }
            Err(e) => {
                warn!(source = %source, error = %e, "상태 파일 읽기 실패, 빈 상태로 시작");
                PersistedState::default()
            }
        };
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn universe(&self) -> &TickerUniverse {
        &self.state.universe
    }

    pub fn record(&self, ticker: &str) -> Option<&AlertRecord> {
        self.state.record(ticker)
    }

    pub fn hot_list(&self) -> &HotList {
        &self.state.hot_list
    }

    /// 발송 구간을 기록하고 새로 추가된 개수를 반환합니다.
    pub fn record_thresholds(&mut self, ticker: &str, levels: &[u32]) -> usize {
        self.state.record_mut(ticker).record_thresholds(levels)
    }

    /// Pre-breakout 래치를 설정합니다. 이번 호출로 새로 설정되었으면 `true`.
    pub fn record_prebreak(&mut self, ticker: &str) -> bool {
        self.state.record_mut(ticker).latch_prebreak()
    }

    pub fn add_to_hot_list(&mut self, ticker: &str) -> bool {
        self.state.hot_list.insert(ticker)
    }

    pub fn set_universe(&mut self, universe: TickerUniverse) {
        self.state.universe = universe;
    }

    pub fn mark_run(&mut self, now: i64) {
        self.state.last_run = Some(now);
    }

    /// 현재 상태를 저장합니다.
    pub fn try_persist(&self) -> Result<()> {
        let document = serde_json::to_string_pretty(&self.state)?;
        self.backend.save(&document)
    }

    /// 현재 상태를 저장합니다. 실패는 로그만 남기고 `false`를 반환합니다.
    pub fn persist(&self) -> bool {
        match self.try_persist() {
            Ok(()) => true,
            Err(e) => {
                error!(target = %self.backend.describe(), error = %e, "상태 저장 실패");
                false
            }
        }
    }
}

impl std::fmt::Debug for AlertStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertStateStore")
            .field("backend", &self.backend.describe())
            .field("state", &self.state)
            .finish()
    }
}
