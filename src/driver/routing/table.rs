//! 엔드포인트 레지스트리
//!
//! 역할별 엔드포인트 목록과 도달 가능 여부를 관리합니다.
//! 시작 시 한 번 구성되고 이후에는 주로 읽기만 하는 프로세스 공용 상태입니다.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use super::policy::{EndpointSelector, SelectionPolicy};
use super::super::endpoint::{Endpoint, EndpointRole};
use super::super::error::{RouterError, RouterResult};

#[derive(Debug, Default)]
struct RegistryState {
    master: Option<Arc<Endpoint>>,
    slaves: Vec<Arc<Endpoint>>,
    by_name: HashMap<String, Arc<Endpoint>>,
    unavailable: HashSet<String>,
}

impl RegistryState {
    fn is_available(&self, endpoint: &Endpoint) -> bool {
        !self.unavailable.contains(endpoint.name())
    }
}

/// 엔드포인트 레지스트리
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    state: RwLock<RegistryState>,
    selector: EndpointSelector,
}

impl EndpointRegistry {
    /// 새 레지스트리 생성 (라운드 로빈)
    pub fn new() -> Self {
        Self::default()
    }

    /// 선택 정책을 지정해 생성
    pub fn with_policy(policy: SelectionPolicy) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            selector: EndpointSelector::new(policy),
        }
    }

    /// 엔드포인트 등록
    ///
    /// 이름은 한 번만 쓸 수 있고 마스터는 하나만 허용합니다.
    pub fn register(&self, endpoint: Endpoint) -> RouterResult<()> {
        let mut state = self.state.write();

        if state.by_name.contains_key(endpoint.name()) {
            return Err(RouterError::duplicate_endpoint(endpoint.name()));
        }

        let endpoint = Arc::new(endpoint);
        match endpoint.role() {
            EndpointRole::Master => {
                if let Some(existing) = &state.master {
                    return Err(RouterError::configuration(format!(
                        "Master endpoint already registered: {}",
                        existing.name()
                    )));
                }
                state.master = Some(endpoint.clone());
            }
            EndpointRole::Slave => state.slaves.push(endpoint.clone()),
        }
        state.by_name.insert(endpoint.name().to_string(), endpoint.clone());

        tracing::info!(endpoint = endpoint.name(), role = %endpoint.role(), "Registered endpoint");
        Ok(())
    }

    /// 역할에 맞는 엔드포인트 선택
    pub fn connection_for(&self, role: EndpointRole) -> RouterResult<Arc<Endpoint>> {
        let state = self.state.read();

        match role {
            EndpointRole::Master => state
                .master
                .as_ref()
                .filter(|m| state.is_available(m))
                .cloned()
                .ok_or(RouterError::NoEndpointAvailable(EndpointRole::Master)),
            EndpointRole::Slave => {
                let candidates: Vec<&Arc<Endpoint>> = state
                    .slaves
                    .iter()
                    .filter(|s| state.is_available(s))
                    .collect();

                self.selector
                    .select(&candidates)
                    .map(|s| Arc::clone(s))
                    .ok_or(RouterError::NoEndpointAvailable(EndpointRole::Slave))
            }
        }
    }

    /// 이름으로 엔드포인트 조회
    pub fn endpoint(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.state.read().by_name.get(name).cloned()
    }

    /// 역할별 엔드포인트 목록 (등록 순서)
    pub fn endpoints(&self, role: EndpointRole) -> Vec<Arc<Endpoint>> {
        let state = self.state.read();
        match role {
            EndpointRole::Master => state.master.iter().cloned().collect(),
            EndpointRole::Slave => state.slaves.clone(),
        }
    }

    /// 도달 불가로 표시
    pub fn mark_unavailable(&self, name: &str) -> RouterResult<()> {
        let mut state = self.state.write();
        if !state.by_name.contains_key(name) {
            return Err(RouterError::unknown_endpoint(name));
        }
        if state.unavailable.insert(name.to_string()) {
            tracing::warn!(endpoint = name, "Endpoint marked unavailable");
        }
        Ok(())
    }

    /// 다시 사용 가능으로 표시
    pub fn mark_available(&self, name: &str) -> RouterResult<()> {
        let mut state = self.state.write();
        if !state.by_name.contains_key(name) {
            return Err(RouterError::unknown_endpoint(name));
        }
        if state.unavailable.remove(name) {
            tracing::info!(endpoint = name, "Endpoint marked available");
        }
        Ok(())
    }

    /// 사용 가능 여부
    pub fn is_available(&self, name: &str) -> bool {
        let state = self.state.read();
        state.by_name.contains_key(name) && !state.unavailable.contains(name)
    }

    /// 등록된 엔드포인트 수
    pub fn len(&self) -> usize {
        self.state.read().by_name.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 선택 정책
    pub fn policy(&self) -> SelectionPolicy {
        self.selector.policy()
    }
}
