//! In-memory 백엔드
//!
//! 프로세스 내에서 동작하는 관계형 엔드포인트 대체물입니다.
//! 마스터와 슬레이브를 서로 다른 센티널 값으로 채워 두면
//! 어떤 엔드포인트가 쿼리를 처리했는지 결과 값만으로 확인할 수 있습니다.
//!
//! # 지원 문장
//!
//! 각 테이블은 정수 키 `id`와 값 컬럼 하나로 구성됩니다.
//!
//! | 문장 | 파라미터 |
//! |------|----------|
//! | `SELECT ... FROM <table> [WHERE ...]` | `id` (선택) |
//! | `INSERT INTO <table> ...` | `id`, `value` |
//! | `UPDATE <table> ... [WHERE ...]` | `id` (선택), `value` |
//! | `DELETE FROM <table> [WHERE ...]` | `id` (선택) |
//!
//! `WHERE`가 있으면 `id` 파라미터와 일치하는 행만 대상이 되고,
//! `id` 파라미터가 없으면 아무 행도 일치하지 않습니다.
//! 잠금 모드는 무시하며 트랜잭션 간 격리는 제공하지 않습니다.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::RwLock;

use super::classifier::QueryDescriptor;
use super::config::{Connector, EndpointConfig};
use super::endpoint::{Connection, ConnectionSource, StatementOutcome};
use super::error::{ConnectionError, RouterError, RouterResult};
use super::types::Value;

/// URL 스킴
pub const MEMORY_SCHEME: &str = "memory:";

/// 센티널 테이블 이름
pub const SENTINEL_TABLE: &str = "mytable";

/// 센티널 값 컬럼 이름
pub const SENTINEL_COLUMN: &str = "mycol";

#[derive(Debug, Clone)]
struct MemoryTable {
    value_column: String,
    rows: BTreeMap<i64, Value>,
}

type Tables = HashMap<String, MemoryTable>;

#[derive(Debug)]
struct Shared {
    tables: RwLock<Tables>,
    online: AtomicBool,
    statements: AtomicU64,
}

// ============================================================================
// MemoryDatabase
// ============================================================================

/// In-memory 데이터베이스
///
/// 복제본은 공유 상태를 가리키므로 `clone()`은 같은 데이터베이스를 뜻합니다.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    name: String,
    shared: Arc<Shared>,
}

impl MemoryDatabase {
    /// 빈 데이터베이스 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                tables: RwLock::new(HashMap::new()),
                online: AtomicBool::new(true),
                statements: AtomicU64::new(0),
            }),
        }
    }

    /// 센티널 행 `(1, sentinel)`이 있는 `mytable`을 가진 데이터베이스 생성
    pub fn seeded(name: impl Into<String>, sentinel: impl Into<Value>) -> Self {
        let db = Self::new(name);
        db.create_table(SENTINEL_TABLE, SENTINEL_COLUMN);
        db.put(SENTINEL_TABLE, 1, sentinel);
        db
    }

    /// 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 테이블 생성 (이미 있으면 유지)
    pub fn create_table(&self, table: &str, value_column: &str) {
        self.shared
            .tables
            .write()
            .entry(table.to_ascii_lowercase())
            .or_insert_with(|| MemoryTable {
                value_column: value_column.to_string(),
                rows: BTreeMap::new(),
            });
    }

    /// 행 쓰기 (있으면 덮어씀). 테이블이 없으면 무시
    pub fn put(&self, table: &str, id: i64, value: impl Into<Value>) {
        if let Some(t) = self.shared.tables.write().get_mut(&table.to_ascii_lowercase()) {
            t.rows.insert(id, value.into());
        }
    }

    /// 행 값 조회
    pub fn value(&self, table: &str, id: i64) -> Option<Value> {
        self.shared
            .tables
            .read()
            .get(&table.to_ascii_lowercase())
            .and_then(|t| t.rows.get(&id).cloned())
    }

    /// 다른 데이터베이스의 내용을 그대로 복사 (복제 따라잡기)
    pub fn replicate_from(&self, source: &MemoryDatabase) {
        let snapshot = source.shared.tables.read().clone();
        *self.shared.tables.write() = snapshot;
    }

    /// 온라인/오프라인 전환
    pub fn set_online(&self, online: bool) {
        self.shared.online.store(online, Ordering::SeqCst);
    }

    /// 온라인 여부
    pub fn is_online(&self) -> bool {
        self.shared.online.load(Ordering::SeqCst)
    }

    /// 지금까지 처리한 문장 수
    pub fn statement_count(&self) -> u64 {
        self.shared.statements.load(Ordering::Relaxed)
    }
}

impl ConnectionSource for MemoryDatabase {
    fn acquire(&self) -> BoxFuture<'_, Result<Box<dyn Connection>, ConnectionError>> {
        let result: Result<Box<dyn Connection>, ConnectionError> = if self.is_online() {
            Ok(Box::new(MemoryConnection {
                shared: Arc::clone(&self.shared),
                snapshot: None,
            }))
        } else {
            Err(ConnectionError::refused(format!("{} is offline", self.name)))
        };
        future::ready(result).boxed()
    }
}

// ============================================================================
// MemoryConnection
// ============================================================================

/// In-memory 연결
///
/// 쓰기는 즉시 반영되며, 롤백은 `begin` 시점의 스냅샷으로 되돌립니다.
pub struct MemoryConnection {
    shared: Arc<Shared>,
    snapshot: Option<Tables>,
}

impl MemoryConnection {
    fn run(&mut self, query: &QueryDescriptor) -> Result<StatementOutcome, ConnectionError> {
        self.shared.statements.fetch_add(1, Ordering::Relaxed);
        if !self.shared.online.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }

        let tokens: Vec<&str> = query.text.split_whitespace().collect();
        let verb = tokens.first().map(|t| t.to_ascii_uppercase()).unwrap_or_default();
        let filter = RowFilter::from_query(&tokens, query)?;

        match verb.as_str() {
            "SELECT" => {
                let table = table_after(&tokens, "FROM")?;
                let tables = self.shared.tables.read();
                let t = lookup(&tables, &table)?;
                let rows = t
                    .rows
                    .iter()
                    .filter(|(id, _)| filter.matches(**id))
                    .map(|(id, v)| vec![Value::Integer(*id), v.clone()])
                    .collect();
                Ok(StatementOutcome::rows(
                    vec!["id".to_string(), t.value_column.clone()],
                    rows,
                ))
            }
            "INSERT" => {
                let table = table_after(&tokens, "INTO")?;
                let id = required_id(query)?;
                let value = required_value(query)?;
                let mut tables = self.shared.tables.write();
                let t = lookup_mut(&mut tables, &table)?;
                if t.rows.contains_key(&id) {
                    return Err(ConnectionError::statement(format!(
                        "duplicate key {} in {}",
                        id, table
                    )));
                }
                t.rows.insert(id, value);
                Ok(StatementOutcome::affected(1))
            }
            "UPDATE" => {
                let table = table_after(&tokens, "UPDATE")?;
                let value = required_value(query)?;
                let mut tables = self.shared.tables.write();
                let t = lookup_mut(&mut tables, &table)?;
                let mut affected = 0;
                for (id, v) in t.rows.iter_mut() {
                    if filter.matches(*id) {
                        *v = value.clone();
                        affected += 1;
                    }
                }
                Ok(StatementOutcome::affected(affected))
            }
            "DELETE" => {
                let table = table_after(&tokens, "FROM")?;
                let mut tables = self.shared.tables.write();
                let t = lookup_mut(&mut tables, &table)?;
                let before = t.rows.len();
                t.rows.retain(|id, _| !filter.matches(*id));
                Ok(StatementOutcome::affected((before - t.rows.len()) as u64))
            }
            _ => Err(ConnectionError::statement(format!(
                "unsupported statement: {}",
                query.text
            ))),
        }
    }
}

impl Connection for MemoryConnection {
    fn begin(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>> {
        let result = if self.snapshot.is_some() {
            Err(ConnectionError::transaction("transaction already started"))
        } else {
            self.snapshot = Some(self.shared.tables.read().clone());
            Ok(())
        };
        future::ready(result).boxed()
    }

    fn execute<'a>(
        &'a mut self,
        query: &'a QueryDescriptor,
    ) -> BoxFuture<'a, Result<StatementOutcome, ConnectionError>> {
        let result = self.run(query);
        future::ready(result).boxed()
    }

    fn commit(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>> {
        let result = match self.snapshot.take() {
            Some(_) => Ok(()),
            None => Err(ConnectionError::transaction("no transaction to commit")),
        };
        future::ready(result).boxed()
    }

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), ConnectionError>> {
        let result = match self.snapshot.take() {
            Some(snapshot) => {
                *self.shared.tables.write() = snapshot;
                Ok(())
            }
            None => Err(ConnectionError::transaction("no transaction to roll back")),
        };
        future::ready(result).boxed()
    }
}

// ============================================================================
// 문장 해석 헬퍼
// ============================================================================

enum RowFilter {
    All,
    Only(i64),
    Nothing,
}

impl RowFilter {
    fn from_query(tokens: &[&str], query: &QueryDescriptor) -> Result<Self, ConnectionError> {
        let has_where = tokens.iter().any(|t| t.eq_ignore_ascii_case("WHERE"));
        if !has_where {
            return Ok(Self::All);
        }
        match query.param("id") {
            Some(Value::Integer(id)) => Ok(Self::Only(*id)),
            Some(other) => Err(ConnectionError::statement(format!(
                "parameter 'id' must be an Integer, got {}",
                other.type_name()
            ))),
            None => Ok(Self::Nothing),
        }
    }

    fn matches(&self, id: i64) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == id,
            Self::Nothing => false,
        }
    }
}

fn table_after(tokens: &[&str], keyword: &str) -> Result<String, ConnectionError> {
    tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case(keyword))
        .and_then(|i| tokens.get(i + 1))
        .map(|t| {
            t.trim_end_matches(';')
                .split('(')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase()
        })
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ConnectionError::statement(format!("missing table after {}", keyword)))
}

fn lookup<'a>(tables: &'a Tables, table: &str) -> Result<&'a MemoryTable, ConnectionError> {
    tables
        .get(table)
        .ok_or_else(|| ConnectionError::statement(format!("table not found: {}", table)))
}

fn lookup_mut<'a>(tables: &'a mut Tables, table: &str) -> Result<&'a mut MemoryTable, ConnectionError> {
    tables
        .get_mut(table)
        .ok_or_else(|| ConnectionError::statement(format!("table not found: {}", table)))
}

fn required_id(query: &QueryDescriptor) -> Result<i64, ConnectionError> {
    query
        .param("id")
        .and_then(Value::as_int)
        .ok_or_else(|| ConnectionError::statement("missing Integer parameter 'id'"))
}

fn required_value(query: &QueryDescriptor) -> Result<Value, ConnectionError> {
    query
        .param("value")
        .cloned()
        .ok_or_else(|| ConnectionError::statement("missing parameter 'value'"))
}

// ============================================================================
// MemoryConnector
// ============================================================================

/// `memory:<database>` URL을 등록된 [`MemoryDatabase`]에 연결하는 커넥터
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    databases: HashMap<String, MemoryDatabase>,
}

impl MemoryConnector {
    /// 빈 커넥터 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 데이터베이스 추가 (이름이 URL 경로가 됨)
    pub fn with_database(mut self, database: MemoryDatabase) -> Self {
        self.databases.insert(database.name().to_string(), database);
        self
    }

    /// 등록된 데이터베이스 조회
    pub fn database(&self, name: &str) -> Option<&MemoryDatabase> {
        self.databases.get(name)
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, endpoint: &EndpointConfig) -> RouterResult<Arc<dyn ConnectionSource>> {
        let name = endpoint.url.strip_prefix(MEMORY_SCHEME).ok_or_else(|| {
            RouterError::configuration(format!(
                "Endpoint '{}' uses unsupported URL: {}",
                endpoint.name, endpoint.url
            ))
        })?;

        let db = self.databases.get(name).ok_or_else(|| {
            RouterError::configuration(format!(
                "Endpoint '{}' refers to unknown memory database: {}",
                endpoint.name, name
            ))
        })?;

        Ok(Arc::new(db.clone()))
    }
}
