//! Endpoint
//!
//! 논리 엔드포인트와 백엔드 연결 추상화

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::classifier::QueryDescriptor;
use super::error::{ConnectionError, RouterError};
use super::types::Value;

// ============================================================================
// EndpointRole - 엔드포인트 역할
// ============================================================================

/// 엔드포인트 역할
///
/// 설정 파일에서도 [`EndpointRole::parse`]와 같은 이름을 받습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum EndpointRole {
    /// 쓰기 가능한 원본
    Master,
    /// 읽기 전용 복제본
    Slave,
}

impl EndpointRole {
    /// 문자열에서 역할 파싱
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "master" | "primary" => Some(Self::Master),
            "slave" | "replica" => Some(Self::Slave),
            _ => None,
        }
    }

    /// 역할을 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Slave => "slave",
        }
    }
}

impl TryFrom<String> for EndpointRole {
    type Error = RouterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
            .ok_or_else(|| RouterError::configuration(format!("Unknown endpoint role: {}", s)))
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Connection - 백엔드 연결
// ============================================================================

/// 문장 실행 결과
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOutcome {
    /// 컬럼 이름
    pub keys: Vec<String>,
    /// 행
    pub rows: Vec<Vec<Value>>,
    /// 변경된 행 수
    pub rows_affected: u64,
}

impl StatementOutcome {
    /// 조회 결과 생성
    pub fn rows(keys: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            keys,
            rows,
            rows_affected: 0,
        }
    }

    /// 변경 결과 생성
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Default::default()
        }
    }
}

/// 단일 물리 연결
///
/// 라우터는 어떤 엔드포인트로 보낼지만 결정하고,
/// 문장 실행과 취소/타임아웃은 이 구현체가 담당합니다.
pub trait Connection: Send {
    /// 트랜잭션 시작
    fn begin(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>>;

    /// 문장 실행
    fn execute<'a>(
        &'a mut self,
        query: &'a QueryDescriptor,
    ) -> BoxFuture<'a, Result<StatementOutcome, ConnectionError>>;

    /// 커밋
    fn commit(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>>;

    /// 롤백
    fn rollback(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>>;
}

/// 연결 획득 수단 (외부 풀 또는 드라이버)
///
/// 동시 호출에 안전해야 합니다. 풀링과 그 잠금은 구현체의 책임입니다.
pub trait ConnectionSource: Send + Sync {
    /// 연결 획득
    fn acquire(&self) -> BoxFuture<'_, Result<Box<dyn Connection>, ConnectionError>>;
}

// ============================================================================
// Endpoint - 논리 엔드포인트
// ============================================================================

/// 논리 엔드포인트
///
/// 등록 후에는 변경되지 않습니다.
#[derive(Clone)]
pub struct Endpoint {
    name: String,
    role: EndpointRole,
    source: Arc<dyn ConnectionSource>,
}

impl Endpoint {
    /// 새 엔드포인트 생성
    pub fn new(
        name: impl Into<String>,
        role: EndpointRole,
        source: Arc<dyn ConnectionSource>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            source,
        }
    }

    /// 마스터 엔드포인트 생성
    pub fn master(name: impl Into<String>, source: Arc<dyn ConnectionSource>) -> Self {
        Self::new(name, EndpointRole::Master, source)
    }

    /// 슬레이브 엔드포인트 생성
    pub fn slave(name: impl Into<String>, source: Arc<dyn ConnectionSource>) -> Self {
        Self::new(name, EndpointRole::Slave, source)
    }

    /// 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 역할
    pub fn role(&self) -> EndpointRole {
        self.role
    }

    /// 연결 획득
    pub async fn acquire(&self) -> Result<Box<dyn Connection>, ConnectionError> {
        self.source.acquire().await
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}
