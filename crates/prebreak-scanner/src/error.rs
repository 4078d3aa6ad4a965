//! 에러 타입 정의.

use std::fmt;

/// Scanner 에러 타입
#[derive(Debug)]
pub enum ScannerError {
    /// 설정 에러 (필수 자격증명 누락 등)
    Config(String),
    /// 콜드 스타트에서 유효한 종목을 하나도 얻지 못함
    EmptyUniverse,
    /// 상태 파일 입출력 에러
    Io(std::io::Error),
    /// 상태 직렬화 에러
    Serialization(serde_json::Error),
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::EmptyUniverse => write!(f, "No usable tickers returned from universe provider"),
            Self::Io(e) => write!(f, "State I/O error: {}", e),
            Self::Serialization(e) => write!(f, "State serialization error: {}", e),
        }
    }
}

impl std::error::Error for ScannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl ScannerError {
    /// 실행 전체를 중단해야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::EmptyUniverse)
    }
}

impl From<std::io::Error> for ScannerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, ScannerError>;
