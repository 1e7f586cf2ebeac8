//! Session - 실행 파사드
//!
//! 호출자가 쿼리를 실행하는 단일 진입점입니다.
//! 라우터에 대상을 묻고, 레지스트리에서 연결을 얻어 실행한 뒤 결과를 돌려줍니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::classifier::{Classification, QueryDescriptor};
use super::endpoint::{Connection, Endpoint, EndpointRole};
use super::error::{ConnectionError, RouterError, RouterResult};
use super::record::{Record, RecordStream};
use super::routing::{EndpointRegistry, Router};
use super::transaction::{TransactionContext, TransactionPhase};

// ============================================================================
// SessionConfig - 세션 설정
// ============================================================================

/// 세션 설정
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 연결 획득 타임아웃
    pub acquisition_timeout: Duration,
}

impl SessionConfig {
    /// 새 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 연결 획득 타임아웃 설정
    pub fn with_acquisition_timeout(mut self, timeout: Duration) -> Self {
        self.acquisition_timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            acquisition_timeout: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// ResultSummary / QueryResult - 결과
// ============================================================================

/// 결과 요약
#[derive(Debug, Clone)]
pub struct ResultSummary {
    /// 실행한 쿼리
    pub query: QueryDescriptor,
    /// 실행한 엔드포인트 이름
    pub endpoint: String,
    /// 실행한 엔드포인트 역할
    pub role: EndpointRole,
    /// 라우팅 분류
    pub classification: Classification,
    /// 실행 후 트랜잭션 단계
    pub phase: TransactionPhase,
    /// 변경된 행 수
    pub rows_affected: u64,
    /// 결과 대기 시간
    pub result_available_after: Duration,
}

/// 쿼리 결과
#[derive(Debug)]
pub struct QueryResult {
    /// 행 스트림
    pub records: RecordStream,
    /// 컬럼 키
    pub keys: Vec<String>,
    /// 결과 요약
    pub summary: ResultSummary,
}

impl QueryResult {
    /// 새 결과 생성
    pub fn new(records: Vec<Record>, keys: Vec<String>, summary: ResultSummary) -> Self {
        Self {
            records: RecordStream::new(records),
            keys,
            summary,
        }
    }

    /// 단일 행 가져오기
    pub fn single(self) -> RouterResult<Record> {
        self.records.single()
    }

    /// 모든 행 가져오기
    pub fn collect(self) -> Vec<Record> {
        self.records.collect_all()
    }

    /// 변경된 행 수
    pub fn rows_affected(&self) -> u64 {
        self.summary.rows_affected
    }

    /// 실행한 엔드포인트 역할
    pub fn role(&self) -> EndpointRole {
        self.summary.role
    }

    /// 실행한 엔드포인트 이름
    pub fn endpoint(&self) -> &str {
        &self.summary.endpoint
    }
}

impl Iterator for QueryResult {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}

// ============================================================================
// Session - 세션
// ============================================================================

/// 트랜잭션 동안 붙잡고 있는 마스터 연결
struct MasterLease {
    endpoint: Arc<Endpoint>,
    connection: Box<dyn Connection>,
}

/// 라우팅 세션
///
/// 하나의 작업 단위가 소유하며 동시에 여러 호출자가 공유하지 않습니다.
/// 트랜잭션 안에서 마스터로 가는 첫 문장에서 마스터 연결을 열고 `begin`을 보낸 뒤
/// 커밋/롤백까지 그 연결을 유지합니다. 슬레이브 읽기와 트랜잭션 밖의 문장은
/// 문장마다 연결을 얻습니다.
///
/// 커밋/롤백 없이 버려진 세션의 마스터 연결은 그대로 닫히며,
/// 미완료 트랜잭션의 처리는 백엔드에 맡깁니다.
pub struct Session {
    registry: Arc<EndpointRegistry>,
    router: Router,
    config: SessionConfig,
    context: TransactionContext,
    lease: Option<MasterLease>,
    last_target: Option<EndpointRole>,
    open: bool,
}

impl Session {
    /// 새 세션 생성
    pub fn new(registry: Arc<EndpointRegistry>, router: Router, config: SessionConfig) -> Self {
        Self {
            registry,
            router,
            config,
            context: TransactionContext::new(),
            lease: None,
            last_target: None,
            open: true,
        }
    }

    /// 트랜잭션 시작
    pub async fn begin_transaction(&mut self) -> RouterResult<()> {
        self.ensure_open()?;
        self.context.begin()?;
        tracing::info!("Transaction started");
        Ok(())
    }

    /// 쿼리 실행
    ///
    /// 실패 시 다른 엔드포인트로 재시도하지 않습니다.
    pub async fn execute(&mut self, query: impl Into<QueryDescriptor>) -> RouterResult<QueryResult> {
        self.ensure_open()?;
        let query = query.into();

        let decision = self.router.route(&query, &self.context);
        let hold = decision.context.is_active() && decision.target == EndpointRole::Master;

        let endpoint = match (&self.lease, hold) {
            (Some(lease), true) => Arc::clone(&lease.endpoint),
            _ => self.registry.connection_for(decision.target)?,
        };

        self.context = decision.context;
        self.last_target = Some(decision.target);
        tracing::debug!(
            endpoint = endpoint.name(),
            target = %decision.target,
            classification = %decision.classification,
            phase = ?self.context.phase(),
            native = query.is_native(),
            "Routed query"
        );

        let start = Instant::now();
        let outcome = if hold {
            let mut lease = match self.lease.take() {
                Some(lease) => lease,
                None => self.open_lease(endpoint.clone()).await?,
            };
            let result = lease.connection.execute(&query).await;
            self.lease = Some(lease);
            result
        } else {
            let mut connection = acquire(&endpoint, self.config.acquisition_timeout).await?;
            connection.execute(&query).await
        };
        let outcome = outcome.map_err(|e| execution_failed(&endpoint, e))?;

        let keys: Arc<[String]> = Arc::from(outcome.keys.clone());
        let records = outcome
            .rows
            .into_iter()
            .map(|values| Record::new(Arc::clone(&keys), values))
            .collect();

        let summary = ResultSummary {
            query,
            endpoint: endpoint.name().to_string(),
            role: endpoint.role(),
            classification: decision.classification,
            phase: self.context.phase(),
            rows_affected: outcome.rows_affected,
            result_available_after: start.elapsed(),
        };

        Ok(QueryResult::new(records, outcome.keys, summary))
    }

    /// 커밋
    ///
    /// 커밋이 실패해도 트랜잭션 컨텍스트는 종료됩니다.
    pub async fn commit(&mut self) -> RouterResult<()> {
        self.ensure_open()?;
        if !self.context.is_active() {
            return Err(RouterError::NoActiveTransaction);
        }

        let lease = self.lease.take();
        self.context.end();

        if let Some(mut lease) = lease {
            lease
                .connection
                .commit()
                .await
                .map_err(|e| execution_failed(&lease.endpoint, e))?;
        }
        tracing::info!("Transaction committed");
        Ok(())
    }

    /// 롤백 (활성 트랜잭션이 없으면 아무것도 하지 않음)
    pub async fn rollback(&mut self) -> RouterResult<()> {
        self.ensure_open()?;
        if !self.context.is_active() {
            return Ok(());
        }

        let lease = self.lease.take();
        self.context.end();

        if let Some(mut lease) = lease {
            lease
                .connection
                .rollback()
                .await
                .map_err(|e| execution_failed(&lease.endpoint, e))?;
        }
        tracing::info!("Transaction rolled back");
        Ok(())
    }

    /// 세션 닫기 (열린 트랜잭션은 롤백)
    pub async fn close(&mut self) -> RouterResult<()> {
        if !self.open {
            return Ok(());
        }
        let result = self.rollback().await;
        self.open = false;
        result
    }

    /// 현재 트랜잭션 컨텍스트
    pub fn context(&self) -> TransactionContext {
        self.context
    }

    /// 트랜잭션 활성 여부
    pub fn in_transaction(&self) -> bool {
        self.context.is_active()
    }

    /// 마지막 쿼리의 대상 역할
    pub fn last_target(&self) -> Option<EndpointRole> {
        self.last_target
    }

    /// 열린 상태 여부
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// 세션 설정
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn open_lease(&self, endpoint: Arc<Endpoint>) -> RouterResult<MasterLease> {
        let mut connection = acquire(&endpoint, self.config.acquisition_timeout).await?;
        connection
            .begin()
            .await
            .map_err(|e| execution_failed(&endpoint, e))?;
        Ok(MasterLease {
            endpoint,
            connection,
        })
    }

    fn ensure_open(&self) -> RouterResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(RouterError::session("Session is closed"))
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.context.phase())
            .field("holds_master", &self.lease.is_some())
            .field("last_target", &self.last_target)
            .field("open", &self.open)
            .finish()
    }
}

/// 타임아웃을 걸고 연결 획득
async fn acquire(endpoint: &Endpoint, timeout: Duration) -> RouterResult<Box<dyn Connection>> {
    match tokio::time::timeout(timeout, endpoint.acquire()).await {
        Ok(Ok(connection)) => Ok(connection),
        Ok(Err(e)) => Err(execution_failed(endpoint, e)),
        Err(_) => Err(execution_failed(endpoint, ConnectionError::Timeout(timeout))),
    }
}

fn execution_failed(endpoint: &Endpoint, cause: ConnectionError) -> RouterError {
    tracing::warn!(endpoint = endpoint.name(), role = %endpoint.role(), error = %cause, "Execution failed");
    RouterError::execution_failed(endpoint.name(), cause)
}

// ============================================================================
// Tests
// ============================================================================
