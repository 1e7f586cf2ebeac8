//! 라우터
//!
//! 분류 결과와 트랜잭션 컨텍스트로 대상 엔드포인트 역할을 결정합니다.
//! 트랜잭션 안에서 쓰기나 잠금이 한 번 일어나면 종료 시까지 마스터에 고정됩니다.

use serde::{Deserialize, Serialize};

use super::super::classifier::{Classification, QueryClassifier, QueryDescriptor};
use super::super::endpoint::EndpointRole;
use super::super::transaction::TransactionContext;

/// 트랜잭션 안의 네이티브 읽기 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeReadPolicy {
    /// 구조화된 읽기와 동일하게 처리 (기본값)
    #[default]
    Replica,
    /// 활성 트랜잭션 안의 네이티브 읽기는 마스터로 보내고 커밋까지 고정
    PinMasterInTransaction,
}

/// 라우팅 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    /// 대상 역할
    pub target: EndpointRole,
    /// 쿼리 분류
    pub classification: Classification,
    /// 결정 반영 후의 컨텍스트
    pub context: TransactionContext,
}

/// 쿼리 라우터
///
/// 부수효과나 숨은 상태가 없습니다. 같은 입력에는 항상 같은 결정을 돌려줍니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct Router {
    classifier: QueryClassifier,
    native_reads: NativeReadPolicy,
}

impl Router {
    /// 기본 정책 라우터
    pub fn new() -> Self {
        Self::default()
    }

    /// 네이티브 읽기 정책 지정
    pub fn with_native_read_policy(mut self, policy: NativeReadPolicy) -> Self {
        self.native_reads = policy;
        self
    }

    /// 네이티브 읽기 정책
    pub fn native_read_policy(&self) -> NativeReadPolicy {
        self.native_reads
    }

    /// 라우팅 결정
    pub fn route(&self, query: &QueryDescriptor, context: &TransactionContext) -> RoutingDecision {
        let classification = self.classifier.classify(query);
        let mut context = *context;

        let target = match classification {
            Classification::Write => {
                context.mark_write();
                EndpointRole::Master
            }
            Classification::ReadWithLock | Classification::ForcedMaster => {
                context.pin_master();
                EndpointRole::Master
            }
            Classification::PlainRead => {
                if context.pins_master() {
                    EndpointRole::Master
                } else if context.is_active()
                    && query.is_native()
                    && self.native_reads == NativeReadPolicy::PinMasterInTransaction
                {
                    context.pin_master();
                    EndpointRole::Master
                } else {
                    EndpointRole::Slave
                }
            }
        };

        RoutingDecision {
            target,
            classification,
            context,
        }
    }
}
