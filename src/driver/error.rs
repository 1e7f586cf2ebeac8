//! Router Error Types
//!
//! 라우터 에러 정의

use std::io;
use thiserror::Error;

use super::endpoint::EndpointRole;

// ============================================================================
// RouterError - 라우터 에러
// ============================================================================

/// 라우터 에러
#[derive(Error, Debug)]
pub enum RouterError {
    /// 같은 이름의 엔드포인트가 이미 등록됨
    #[error("Duplicate endpoint: {0}")]
    DuplicateEndpoint(String),

    /// 해당 역할의 엔드포인트가 없거나 모두 도달 불가
    #[error("No {0} endpoint available")]
    NoEndpointAvailable(EndpointRole),

    /// 등록되지 않은 엔드포인트
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// 트랜잭션이 이미 활성 상태
    #[error("Transaction already active")]
    AlreadyActive,

    /// 활성 트랜잭션 없음
    #[error("No active transaction")]
    NoActiveTransaction,

    /// 엔드포인트 실행 실패
    #[error("Execution failed on endpoint '{endpoint}': {cause}")]
    ExecutionFailed {
        /// 실패한 엔드포인트 이름
        endpoint: String,
        /// 백엔드 에러
        #[source]
        cause: ConnectionError,
    },

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 세션 에러
    #[error("Session error: {0}")]
    Session(String),

    /// 타입 변환 에러
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// 예상과 다른 결과 형태
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),
}

impl RouterError {
    /// 중복 엔드포인트 에러 생성
    pub fn duplicate_endpoint(name: impl Into<String>) -> Self {
        Self::DuplicateEndpoint(name.into())
    }

    /// 미등록 엔드포인트 에러 생성
    pub fn unknown_endpoint(name: impl Into<String>) -> Self {
        Self::UnknownEndpoint(name.into())
    }

    /// 실행 실패 에러 생성
    pub fn execution_failed(endpoint: impl Into<String>, cause: ConnectionError) -> Self {
        Self::ExecutionFailed {
            endpoint: endpoint.into(),
            cause,
        }
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 세션 에러 생성
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// 타입 변환 에러 생성
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }

    /// 결과 형태 에러 생성
    pub fn unexpected_result(msg: impl Into<String>) -> Self {
        Self::UnexpectedResult(msg.into())
    }

    /// 시작 시점의 설정 문제 여부 (재시도 불가, 치명적)
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEndpoint(_)
                | Self::UnknownEndpoint(_)
                | Self::Configuration(_)
        )
    }

    /// 호출자의 API 오용 여부
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyActive
                | Self::NoActiveTransaction
                | Self::Session(_)
                | Self::TypeConversion(_)
        )
    }

    /// 실패한 엔드포인트 이름
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::ExecutionFailed { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }
}

// ============================================================================
// Result Type
// ============================================================================

/// 라우터 결과 타입
pub type RouterResult<T> = Result<T, RouterError>;

// ============================================================================
// ConnectionError - 백엔드 연결 에러
// ============================================================================

/// 백엔드 연결/실행 에러
///
/// [`Connection`](super::endpoint::Connection) 구현체가 반환하며,
/// 세션에서 [`RouterError::ExecutionFailed`]의 원인으로 감싸집니다.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 연결 거부
    #[error("Connection refused: {0}")]
    Refused(String),

    /// 연결 닫힘
    #[error("Connection closed")]
    Closed,

    /// 연결 획득 타임아웃
    #[error("Connection acquisition timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// 문장 실행 에러
    #[error("Statement error: {0}")]
    Statement(String),

    /// 백엔드 트랜잭션 에러
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl ConnectionError {
    /// 연결 거부 에러 생성
    pub fn refused(msg: impl Into<String>) -> Self {
        Self::Refused(msg.into())
    }

    /// 문장 실행 에러 생성
    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement(msg.into())
    }

    /// 백엔드 트랜잭션 에러 생성
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// 연결 자체의 문제 여부 (문장 문제와 구분)
    pub fn is_connectivity_error(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Refused(_) | Self::Closed | Self::Timeout(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::time::Duration;

    #[test]
    fn test_router_error_display() {
        let err = RouterError::duplicate_endpoint("primary");
        assert_eq!(err.to_string(), "Duplicate endpoint: primary");

        let err = RouterError::NoEndpointAvailable(EndpointRole::Slave);
        assert_eq!(err.to_string(), "No slave endpoint available");

        let err = RouterError::AlreadyActive;
        assert_eq!(err.to_string(), "Transaction already active");

        let err = RouterError::NoActiveTransaction;
        assert_eq!(err.to_string(), "No active transaction");
    }

    #[test]
    fn test_execution_failed_keeps_cause() {
        let err = RouterError::execution_failed(
            "replica-1",
            ConnectionError::statement("table not found: missing"),
        );

        assert_eq!(err.endpoint(), Some("replica-1"));
        assert_eq!(
            err.to_string(),
            "Execution failed on endpoint 'replica-1': Statement error: table not found: missing"
        );

        let source = err.source().expect("cause is exposed as source");
        assert_eq!(source.to_string(), "Statement error: table not found: missing");
    }

    #[test]
    fn test_router_error_classification() {
        assert!(RouterError::duplicate_endpoint("a").is_configuration_error());
        assert!(RouterError::configuration("no master").is_configuration_error());
        assert!(!RouterError::AlreadyActive.is_configuration_error());

        assert!(RouterError::AlreadyActive.is_client_error());
        assert!(RouterError::NoActiveTransaction.is_client_error());
        assert!(!RouterError::NoEndpointAvailable(EndpointRole::Master).is_client_error());

        let err = RouterError::execution_failed("primary", ConnectionError::Closed);
        assert!(!err.is_client_error());
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_connection_error_connectivity() {
        assert!(ConnectionError::refused("offline").is_connectivity_error());
        assert!(ConnectionError::Closed.is_connectivity_error());
        assert!(ConnectionError::Timeout(Duration::from_millis(10)).is_connectivity_error());
        assert!(!ConnectionError::statement("syntax").is_connectivity_error());

        let io = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let err: ConnectionError = io.into();
        assert!(matches!(err, ConnectionError::Io(_)));
    }
}
