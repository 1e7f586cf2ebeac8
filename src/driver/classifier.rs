//! Query Classifier
//!
//! 쿼리 기술자와 라우팅 분류

use std::collections::HashMap;
use std::fmt;

use super::types::Value;

// ============================================================================
// QueryKind / LockMode / StatementKind
// ============================================================================

/// 쿼리 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// 읽기
    Read,
    /// 쓰기 (update 계열 진입점 포함)
    Write,
}

impl QueryKind {
    /// 문장 텍스트에서 종류 추론
    ///
    /// 순수 읽기로 확인되는 문장만 `Read`이고 나머지는 모두 `Write`입니다.
    pub fn infer(text: &str) -> Self {
        if StatementCategory::detect(text).is_read_only() {
            Self::Read
        } else {
            Self::Write
        }
    }
}

/// 잠금 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LockMode {
    /// 잠금 없음
    #[default]
    None,
    /// 비관적 공유 잠금
    PessimisticRead,
    /// 비관적 배타 잠금
    PessimisticWrite,
}

impl LockMode {
    /// 잠금을 획득하는지 여부
    pub fn is_locking(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// 문장 실행 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatementKind {
    /// 구조화된 쿼리 경로
    #[default]
    Structured,
    /// 네이티브 패스스루 문장
    Native,
}

// ============================================================================
// StatementCategory - 문장 분류
// ============================================================================

/// 문장 첫 키워드로 판별한 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementCategory {
    /// SELECT, WITH, VALUES, SHOW, EXPLAIN, DESCRIBE
    Select,
    /// INSERT, UPDATE, DELETE, MERGE, UPSERT, REPLACE, CALL
    Modify,
    /// CREATE, ALTER, DROP, TRUNCATE, GRANT, REVOKE
    Schema,
    /// 첫 키워드로 판별할 수 없는 문장
    Other,
}

impl StatementCategory {
    /// 문장 텍스트에서 분류 판별
    pub fn detect(text: &str) -> Self {
        let keyword = leading_keyword(text).to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" | "WITH" | "VALUES" | "SHOW" | "EXPLAIN" | "DESCRIBE" => Self::Select,
            "INSERT" | "UPDATE" | "DELETE" | "MERGE" | "UPSERT" | "REPLACE" | "CALL" => {
                Self::Modify
            }
            "CREATE" | "ALTER" | "DROP" | "TRUNCATE" | "GRANT" | "REVOKE" => Self::Schema,
            _ => Self::Other,
        }
    }

    /// 순수 읽기 여부
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Select)
    }
}

/// 주석과 괄호를 건너뛴 첫 키워드
fn leading_keyword(text: &str) -> &str {
    let mut rest = text.trim_start();
    loop {
        if let Some(stripped) = rest.strip_prefix("--") {
            rest = stripped.split_once('\n').map(|(_, tail)| tail).unwrap_or("").trim_start();
        } else if let Some(stripped) = rest.strip_prefix("/*") {
            rest = stripped.split_once("*/").map(|(_, tail)| tail).unwrap_or("").trim_start();
        } else if let Some(stripped) = rest.strip_prefix('(') {
            rest = stripped.trim_start();
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

// ============================================================================
// QueryDescriptor - 쿼리 기술자
// ============================================================================

/// 쿼리 기술자
///
/// 호출마다 만들어지며 생성 후 변경되지 않는 값입니다.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    /// 문장 텍스트
    pub text: String,
    /// 파라미터
    pub parameters: HashMap<String, Value>,
    /// 종류
    pub kind: QueryKind,
    /// 잠금 모드
    pub lock_mode: LockMode,
    /// 실행 경로
    pub statement: StatementKind,
    /// 마스터 강제 힌트
    pub force_master: bool,
}

impl QueryDescriptor {
    /// 텍스트에서 종류를 추론해 생성
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = QueryKind::infer(&text);
        Self::with_kind(text, kind)
    }

    /// 읽기 쿼리 생성
    pub fn read(text: impl Into<String>) -> Self {
        Self::with_kind(text, QueryKind::Read)
    }

    /// 쓰기 쿼리 생성 (update 계열 진입점)
    pub fn write(text: impl Into<String>) -> Self {
        Self::with_kind(text, QueryKind::Write)
    }

    /// 네이티브 패스스루 문장 생성
    pub fn native(text: impl Into<String>) -> Self {
        Self::new(text).as_native()
    }

    fn with_kind(text: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            text: text.into(),
            parameters: HashMap::new(),
            kind,
            lock_mode: LockMode::None,
            statement: StatementKind::Structured,
            force_master: false,
        }
    }

    /// 파라미터 추가
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// 파라미터들 추가
    pub fn with_params(mut self, params: HashMap<String, Value>) -> Self {
        self.parameters.extend(params);
        self
    }

    /// 잠금 모드 설정
    pub fn with_lock_mode(mut self, lock_mode: LockMode) -> Self {
        self.lock_mode = lock_mode;
        self
    }

    /// 마스터 강제
    pub fn with_force_master(mut self) -> Self {
        self.force_master = true;
        self
    }

    /// 네이티브 경로로 표시
    pub fn as_native(mut self) -> Self {
        self.statement = StatementKind::Native;
        self
    }

    /// 네이티브 문장 여부
    pub fn is_native(&self) -> bool {
        self.statement == StatementKind::Native
    }

    /// 파라미터 조회
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }
}

impl From<&str> for QueryDescriptor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for QueryDescriptor {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// Classification - 라우팅 분류
// ============================================================================

/// 라우팅 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// 쓰기: 항상 마스터
    Write,
    /// 잠금 읽기: 항상 마스터
    ReadWithLock,
    /// 힌트로 마스터 강제된 읽기
    ForcedMaster,
    /// 일반 읽기: 슬레이브 후보
    PlainRead,
}

impl Classification {
    /// 트랜잭션 상태와 무관하게 마스터로 가는지 여부
    pub fn requires_master(&self) -> bool {
        !matches!(self, Self::PlainRead)
    }

    /// 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::ReadWithLock => "read_with_lock",
            Self::ForcedMaster => "forced_master",
            Self::PlainRead => "plain_read",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 쿼리 분류기
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryClassifier;

impl QueryClassifier {
    /// 새 분류기 생성
    pub fn new() -> Self {
        Self
    }

    /// 쿼리 분류
    ///
    /// 네이티브 여부는 분류에 영향을 주지 않습니다.
    pub fn classify(&self, query: &QueryDescriptor) -> Classification {
        let category = StatementCategory::detect(&query.text);
        if query.kind == QueryKind::Write
            || matches!(category, StatementCategory::Modify | StatementCategory::Schema)
        {
            Classification::Write
        } else if query.lock_mode.is_locking() {
            Classification::ReadWithLock
        } else if query.force_master {
            Classification::ForcedMaster
        } else {
            Classification::PlainRead
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_category_detect() {
        assert_eq!(StatementCategory::detect("select m from MyTable m"), StatementCategory::Select);
        assert_eq!(StatementCategory::detect("  WITH x AS (SELECT 1) SELECT * FROM x"), StatementCategory::Select);
        assert_eq!(StatementCategory::detect("(SELECT 1)"), StatementCategory::Select);
        assert_eq!(StatementCategory::detect("-- note\nSELECT 1"), StatementCategory::Select);
        assert_eq!(StatementCategory::detect("/* hint */ delete from MyTable m where 1 = 2"), StatementCategory::Modify);
        assert_eq!(StatementCategory::detect("insert into mytable (mycol) values (?)"), StatementCategory::Modify);
        assert_eq!(StatementCategory::detect("create table mytable (mycol varchar(255))"), StatementCategory::Schema);
        assert_eq!(StatementCategory::detect("CALL refresh()"), StatementCategory::Modify);
        assert_eq!(StatementCategory::detect("from MyTable m"), StatementCategory::Other);
        assert_eq!(StatementCategory::detect(""), StatementCategory::Other);
    }

    #[test]
    fn test_query_kind_infer() {
        assert_eq!(QueryKind::infer("SELECT mycol FROM mytable"), QueryKind::Read);
        assert_eq!(QueryKind::infer("UPDATE mytable SET mycol = ?"), QueryKind::Write);
        assert_eq!(QueryKind::infer("CALL something()"), QueryKind::Write);
        // 판별 불가 문장은 쓰기로 취급
        assert_eq!(QueryKind::infer("from MyTable m"), QueryKind::Write);
    }

    #[test]
    fn test_descriptor_builders() {
        let q = QueryDescriptor::native("select mycol from mytable")
            .with_param("id", 1i64)
            .with_lock_mode(LockMode::PessimisticRead);

        assert!(q.is_native());
        assert_eq!(q.kind, QueryKind::Read);
        assert_eq!(q.lock_mode, LockMode::PessimisticRead);
        assert_eq!(q.param("id"), Some(&Value::Integer(1)));
        assert!(!q.force_master);

        let q: QueryDescriptor = "delete from mytable".into();
        assert_eq!(q.kind, QueryKind::Write);
        assert_eq!(q.statement, StatementKind::Structured);
    }

    #[test]
    fn test_classify_write() {
        let classifier = QueryClassifier::new();

        assert_eq!(classifier.classify(&QueryDescriptor::write("select 1")), Classification::Write);
        assert_eq!(
            classifier.classify(&QueryDescriptor::read("delete from MyTable m where 1 = 2")),
            Classification::Write
        );
        // 읽기로 선언해도 프로시저 호출은 쓰기
        assert_eq!(
            classifier.classify(&QueryDescriptor::read("CALL refresh_all()")),
            Classification::Write
        );
        assert_eq!(
            classifier.classify(&QueryDescriptor::native("call refresh_all()")),
            Classification::Write
        );
        // 쓰기는 잠금보다 우선
        assert_eq!(
            classifier.classify(
                &QueryDescriptor::write("update mytable set mycol = ?")
                    .with_lock_mode(LockMode::PessimisticWrite)
            ),
            Classification::Write
        );
    }

    #[test]
    fn test_classify_locking_reads() {
        let classifier = QueryClassifier::new();

        for mode in [LockMode::PessimisticRead, LockMode::PessimisticWrite] {
            let q = QueryDescriptor::read("select m from MyTable m").with_lock_mode(mode);
            assert_eq!(classifier.classify(&q), Classification::ReadWithLock);
        }
    }

    #[test]
    fn test_classify_plain_and_forced_reads() {
        let classifier = QueryClassifier::new();

        let q = QueryDescriptor::read("select m from MyTable m");
        assert_eq!(classifier.classify(&q), Classification::PlainRead);
        assert!(!classifier.classify(&q).requires_master());

        let q = QueryDescriptor::native("select mycol from mytable");
        assert_eq!(classifier.classify(&q), Classification::PlainRead);

        let q = QueryDescriptor::read("select m from MyTable m").with_force_master();
        assert_eq!(classifier.classify(&q), Classification::ForcedMaster);
        assert!(classifier.classify(&q).requires_master());
    }
}
