//! 데이터 Provider 모듈.

pub mod finnhub;
pub mod yahoo;

use prebreak_core::ProviderError;

/// 에러 메시지에 포함할 응답 본문 최대 길이
const MAX_ERROR_BODY_CHARS: usize = 300;

/// reqwest 에러를 ProviderError로 변환합니다.
///
/// 요청 URL에 API 토큰이 포함되므로 URL은 제거합니다.
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    if err.is_timeout() {
        ProviderError::Timeout(err.to_string())
    } else if err.is_decode() {
        ProviderError::Parse(err.to_string())
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// 성공 이외의 HTTP 응답을 ProviderError로 변환합니다.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    if status.as_u16() == 429 {
        return ProviderError::RateLimited;
    }

    let body = response.text().await.unwrap_or_default();
    ProviderError::Api {
        status: status.as_u16(),
        message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}
