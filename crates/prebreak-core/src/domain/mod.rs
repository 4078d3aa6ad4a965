//! 도메인 타입 정의.

mod alert;
mod error;
mod news;
mod provider;
mod snapshot;
mod state;
mod universe;

pub use alert::{AlertRecord, HotList};
pub use error::ProviderError;
pub use news::Headline;
pub use provider::{NewsProvider, SnapshotProvider, UniverseProvider};
pub use snapshot::{DailyBar, DailySnapshot, MIN_USABLE_BARS};
pub use state::PersistedState;
pub use universe::{sanitize_symbol, TickerUniverse};
