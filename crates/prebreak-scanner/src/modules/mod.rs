//! 스캐너 모듈.

pub mod batch;
pub mod orchestrator;
pub mod state_store;
pub mod universe;

pub use batch::{Batch, BatchScheduler};
pub use orchestrator::{
    build_scan_set, AlertEvent, AlertKind, Collaborators, RunReport, ScanSettings, Scanner,
};
pub use state_store::{AlertStateStore, JsonFileBackend, MemoryBackend, StateBackend};
pub use universe::resolve_universe;
