//! Record - 결과 행
//!
//! 엔드포인트에서 돌려받은 단일 행과 행 목록

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::{RouterError, RouterResult};
use super::types::Value;

// ============================================================================
// Record - 단일 행
// ============================================================================

/// 결과 행
///
/// 같은 결과의 행들은 컬럼 이름 목록을 공유합니다.
#[derive(Debug, Clone)]
pub struct Record {
    keys: Arc<[String]>,
    values: Vec<Value>,
}

impl Record {
    /// 새 행 생성
    pub fn new(keys: impl Into<Arc<[String]>>, values: Vec<Value>) -> Self {
        Self {
            keys: keys.into(),
            values,
        }
    }

    /// 컬럼 이름 목록
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// 값 목록
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// 컬럼 수
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 빈 행 여부
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 컬럼 이름으로 값 조회 (대소문자 무시)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keys
            .iter()
            .position(|k| k.eq_ignore_ascii_case(key))
            .and_then(|i| self.values.get(i))
    }

    /// 인덱스로 값 조회
    pub fn get_by_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// 타입 변환된 값 조회
    pub fn get_as<T>(&self, key: &str) -> RouterResult<T>
    where
        T: TryFrom<Value, Error = RouterError>,
    {
        self.get(key)
            .cloned()
            .ok_or_else(|| RouterError::type_conversion(format!("Column '{}' not found", key)))
            .and_then(T::try_from)
    }

    /// String 값 조회
    pub fn get_string(&self, key: &str) -> RouterResult<String> {
        self.get_as::<String>(key)
    }

    /// Integer 값 조회
    pub fn get_int(&self, key: &str) -> RouterResult<i64> {
        self.get_as::<i64>(key)
    }

    /// Map으로 변환
    pub fn to_map(&self) -> HashMap<String, Value> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .keys
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

// ============================================================================
// RecordStream - 행 목록
// ============================================================================

/// 결과 행 반복자
#[derive(Debug, Default)]
pub struct RecordStream {
    records: std::vec::IntoIter<Record>,
}

impl RecordStream {
    /// 새 스트림 생성
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }

    /// 빈 스트림 생성
    pub fn empty() -> Self {
        Self::default()
    }

    /// 남은 행 수
    pub fn remaining(&self) -> usize {
        self.records.len()
    }

    /// 정확히 한 행을 기대
    pub fn single(mut self) -> RouterResult<Record> {
        match (self.records.next(), self.records.len()) {
            (Some(record), 0) => Ok(record),
            (None, _) => Err(RouterError::unexpected_result("Expected single record, got none")),
            (Some(_), rest) => Err(RouterError::unexpected_result(format!(
                "Expected single record, got {}",
                rest + 1
            ))),
        }
    }

    /// 남은 행 모두 수집
    pub fn collect_all(self) -> Vec<Record> {
        self.records.collect()
    }
}

impl Iterator for RecordStream {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}
