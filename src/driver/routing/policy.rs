//! 선택 정책
//!
//! 같은 역할의 엔드포인트가 여럿일 때의 선택 전략입니다.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// 엔드포인트 선택 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// 라운드 로빈 (기본값)
    #[default]
    RoundRobin,
    /// 랜덤
    Random,
}

/// 엔드포인트 선택기
#[derive(Debug)]
pub struct EndpointSelector {
    policy: SelectionPolicy,
    round_robin_index: AtomicUsize,
}

impl EndpointSelector {
    /// 새 선택기 생성
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            round_robin_index: AtomicUsize::new(0),
        }
    }

    /// 라운드 로빈 선택기
    pub fn round_robin() -> Self {
        Self::new(SelectionPolicy::RoundRobin)
    }

    /// 랜덤 선택기
    pub fn random() -> Self {
        Self::new(SelectionPolicy::Random)
    }

    /// 후보 중 하나 선택
    pub fn select<'a, T>(&self, candidates: &'a [T]) -> Option<&'a T> {
        if candidates.is_empty() {
            return None;
        }

        let index = match self.policy {
            SelectionPolicy::RoundRobin => {
                self.round_robin_index.fetch_add(1, Ordering::Relaxed) % candidates.len()
            }
            SelectionPolicy::Random => {
                use rand::Rng;
                rand::thread_rng().gen_range(0..candidates.len())
            }
        };
        candidates.get(index)
    }

    /// 인덱스 리셋
    pub fn reset(&self) {
        self.round_robin_index.store(0, Ordering::Relaxed);
    }

    /// 현재 정책
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }
}

impl Default for EndpointSelector {
    fn default() -> Self {
        Self::round_robin()
    }
}
