//! 종목 유니버스 해석 및 갱신.

use prebreak_core::{TickerUniverse, UniverseProvider};
use tracing::{info, warn};

use crate::config::UniverseConfig;
use crate::error::ScannerError;
use crate::modules::state_store::AlertStateStore;
use crate::Result;

/// 이번 실행에서 사용할 유니버스를 반환합니다.
///
/// 캐시가 비어 있거나 갱신 주기가 지났으면 Provider에서 다시 조회하고 즉시
/// 저장합니다. 조회에 실패해도 캐시가 있으면 기존 캐시로 계속 진행하며,
/// 캐시 없이 유효한 종목을 하나도 얻지 못하면 [`ScannerError::EmptyUniverse`].
pub async fn resolve_universe(
    store: &mut AlertStateStore,
    provider: &dyn UniverseProvider,
    config: &UniverseConfig,
    now: i64,
) -> Result<Vec<String>> {
    if !store.universe().is_stale(now, config.ttl_secs()) {
        return Ok(store.universe().tickers.clone());
    }

    match provider.fetch_universe().await {
        Ok(raw) => {
            let raw_count = raw.len();
            let universe = TickerUniverse::from_raw(raw, config.max_tickers, now);

            if universe.is_empty() {
                if store.universe().is_empty() {
                    return Err(ScannerError::EmptyUniverse);
                }
                warn!(
                    provider = provider.provider_name(),
                    "유효한 종목 없음, 기존 유니버스 사용"
                );
                return Ok(store.universe().tickers.clone());
            }

            info!(
                provider = provider.provider_name(),
                raw = raw_count,
                tickers = universe.len(),
                "유니버스 갱신"
            );
            store.set_universe(universe);
            store.persist();
            Ok(store.universe().tickers.clone())
        }
        Err(e) => {
            if store.universe().is_empty() {
                warn!(
                    provider = provider.provider_name(),
                    error = %e,
                    "유니버스 조회 실패, 캐시 없음"
                );
                return Err(ScannerError::EmptyUniverse);
            }
            warn!(
                provider = provider.provider_name(),
                error = %e,
                cached = store.universe().len(),
                "유니버스 조회 실패, 기존 유니버스 사용"
            );
            Ok(store.universe().tickers.clone())
        }
    }
}
