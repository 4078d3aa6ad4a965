//! 외부 Provider 에러.

use thiserror::Error;

/// 데이터 Provider 호출 에러.
///
/// 종목 단위로 발생하며, 호출자는 해당 종목만 건너뛰고 계속 진행합니다.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// 네트워크 연결 실패
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 요청 시간 초과
    #[error("요청 시간 초과: {0}")]
    Timeout(String),

    /// API가 성공 이외의 상태 코드를 반환
    #[error("API 에러 (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit 초과
    #[error("Rate limit 초과")]
    RateLimited,

    /// 응답 파싱 실패
    #[error("응답 파싱 실패: {0}")]
    Parse(String),
}
