//! Transaction Context
//!
//! 작업 단위별 트랜잭션 라우팅 상태

use super::error::{RouterError, RouterResult};

// ============================================================================
// TransactionPhase - 트랜잭션 단계
// ============================================================================

/// 트랜잭션 단계
///
/// `Idle → Clean → Dirty → Idle` 순서로만 전이합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    /// 트랜잭션 없음
    Idle,
    /// 활성, 쓰기/잠금 없음
    Clean,
    /// 활성, 쓰기 또는 잠금 발생 (마스터 고정)
    Dirty,
}

// ============================================================================
// TransactionContext - 트랜잭션 컨텍스트
// ============================================================================

/// 트랜잭션 컨텍스트
///
/// 하나의 작업 단위가 단독으로 소유하며 공유하지 않습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionContext {
    active: bool,
    wrote_since_begin: bool,
    force_master_until_commit: bool,
}

impl TransactionContext {
    /// 새 (Idle) 컨텍스트
    pub fn new() -> Self {
        Self::default()
    }

    /// 트랜잭션 시작
    pub fn begin(&mut self) -> RouterResult<()> {
        if self.active {
            return Err(RouterError::AlreadyActive);
        }
        *self = Self {
            active: true,
            wrote_since_begin: false,
            force_master_until_commit: false,
        };
        Ok(())
    }

    /// 쓰기 발생 기록
    pub fn record_write(&mut self) -> RouterResult<()> {
        self.ensure_active()?;
        self.wrote_since_begin = true;
        Ok(())
    }

    /// 커밋 전까지 마스터 고정
    pub fn force_master(&mut self) -> RouterResult<()> {
        self.ensure_active()?;
        self.force_master_until_commit = true;
        Ok(())
    }

    /// 활성 트랜잭션이면 쓰기 기록 (Idle이면 무시)
    pub(crate) fn mark_write(&mut self) {
        if self.active {
            self.wrote_since_begin = true;
        }
    }

    /// 활성 트랜잭션이면 마스터 고정 (Idle이면 무시)
    pub(crate) fn pin_master(&mut self) {
        if self.active {
            self.force_master_until_commit = true;
        }
    }

    /// 트랜잭션 종료 (커밋/롤백 공통, 여러 번 호출해도 안전)
    pub fn end(&mut self) {
        *self = Self::default();
    }

    /// 활성 여부
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 시작 이후 쓰기 발생 여부
    pub fn wrote_since_begin(&self) -> bool {
        self.wrote_since_begin
    }

    /// 마스터 고정 요청 여부
    pub fn force_master_until_commit(&self) -> bool {
        self.force_master_until_commit
    }

    /// 이후 일반 읽기가 마스터로 가야 하는지 여부
    pub fn pins_master(&self) -> bool {
        self.active && (self.wrote_since_begin || self.force_master_until_commit)
    }

    /// 현재 단계
    pub fn phase(&self) -> TransactionPhase {
        match (self.active, self.pins_master()) {
            (false, _) => TransactionPhase::Idle,
            (true, false) => TransactionPhase::Clean,
            (true, true) => TransactionPhase::Dirty,
        }
    }

    fn ensure_active(&self) -> RouterResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(RouterError::NoActiveTransaction)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_idle() {
        let ctx = TransactionContext::new();
        assert!(!ctx.is_active());
        assert!(!ctx.pins_master());
        assert_eq!(ctx.phase(), TransactionPhase::Idle);
    }

    #[test]
    fn test_begin_twice_fails() {
        let mut ctx = TransactionContext::new();
        ctx.begin().unwrap();
        assert_eq!(ctx.phase(), TransactionPhase::Clean);

        assert!(matches!(ctx.begin(), Err(RouterError::AlreadyActive)));
        // 실패한 begin은 상태를 바꾸지 않음
        assert!(ctx.is_active());
    }

    #[test]
    fn test_record_write_requires_active() {
        let mut ctx = TransactionContext::new();
        assert!(matches!(ctx.record_write(), Err(RouterError::NoActiveTransaction)));
        assert!(matches!(ctx.force_master(), Err(RouterError::NoActiveTransaction)));
        assert_eq!(ctx, TransactionContext::new());
    }

    #[test]
    fn test_mark_helpers_ignore_idle_context() {
        let mut ctx = TransactionContext::new();
        ctx.mark_write();
        ctx.pin_master();
        assert_eq!(ctx, TransactionContext::new());

        ctx.begin().unwrap();
        ctx.pin_master();
        assert!(ctx.force_master_until_commit());
        ctx.mark_write();
        assert!(ctx.wrote_since_begin());
        assert_eq!(ctx.phase(), TransactionPhase::Dirty);
    }

    #[test]
    fn test_write_makes_context_dirty() {
        let mut ctx = TransactionContext::new();
        ctx.begin().unwrap();
        ctx.record_write().unwrap();

        assert!(ctx.wrote_since_begin());
        assert!(!ctx.force_master_until_commit());
        assert_eq!(ctx.phase(), TransactionPhase::Dirty);
    }

    #[test]
    fn test_force_master_makes_context_dirty() {
        let mut ctx = TransactionContext::new();
        ctx.begin().unwrap();
        ctx.force_master().unwrap();

        assert!(ctx.force_master_until_commit());
        assert!(ctx.pins_master());
    }

    #[test]
    fn test_end_resets_and_is_idempotent() {
        let mut ctx = TransactionContext::new();
        ctx.begin().unwrap();
        ctx.record_write().unwrap();
        ctx.force_master().unwrap();

        ctx.end();
        assert_eq!(ctx, TransactionContext::new());
        ctx.end();
        assert_eq!(ctx.phase(), TransactionPhase::Idle);

        // 다음 트랜잭션은 깨끗하게 시작
        ctx.begin().unwrap();
        assert_eq!(ctx.phase(), TransactionPhase::Clean);
        assert!(!ctx.wrote_since_begin());
    }
}
