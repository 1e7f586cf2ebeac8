//! Router Configuration
//!
//! 엔드포인트 목록과 라우팅 정책 설정

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::endpoint::{ConnectionSource, Endpoint, EndpointRole};
use super::error::{RouterError, RouterResult};
use super::routing::{EndpointRegistry, NativeReadPolicy, Router, SelectionPolicy};

fn default_acquisition_timeout_ms() -> u64 {
    30_000
}

// ============================================================================
// EndpointConfig - 엔드포인트 설정
// ============================================================================

/// 엔드포인트 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// 엔드포인트 이름 (고유)
    pub name: String,
    /// 역할
    pub role: EndpointRole,
    /// 연결 문자열
    pub url: String,
}

impl EndpointConfig {
    /// 새 엔드포인트 설정
    pub fn new(name: impl Into<String>, role: EndpointRole, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            url: url.into(),
        }
    }
}

/// 엔드포인트 설정을 연결 획득 수단으로 바꾸는 외부 협력자
pub trait Connector {
    /// 설정에 해당하는 연결 수단 생성
    fn connect(&self, endpoint: &EndpointConfig) -> RouterResult<Arc<dyn ConnectionSource>>;
}

// ============================================================================
// RouterConfig - 라우터 설정
// ============================================================================

/// 라우터 설정
///
/// # TOML 예시
///
/// ```toml
/// selection_policy = "round_robin"
/// native_reads = "replica"
/// acquisition_timeout_ms = 30000
///
/// [[endpoints]]
/// name = "primary"
/// role = "master"
/// url = "memory:masterDB"
///
/// [[endpoints]]
/// name = "replica-1"
/// role = "slave"
/// url = "memory:slaveDB"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// 슬레이브 선택 정책
    #[serde(default)]
    pub selection_policy: SelectionPolicy,
    /// 트랜잭션 안의 네이티브 읽기 정책
    #[serde(default)]
    pub native_reads: NativeReadPolicy,
    /// 연결 획득 타임아웃 (밀리초)
    #[serde(default = "default_acquisition_timeout_ms")]
    pub acquisition_timeout_ms: u64,
    /// 엔드포인트 목록
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            selection_policy: SelectionPolicy::default(),
            native_reads: NativeReadPolicy::default(),
            acquisition_timeout_ms: default_acquisition_timeout_ms(),
            endpoints: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// 빌더 시작
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }

    /// TOML 문자열에서 파싱
    pub fn from_toml_str(contents: &str) -> RouterResult<Self> {
        toml::from_str(contents)
            .map_err(|e| RouterError::configuration(format!("Invalid router config: {}", e)))
    }

    /// TOML 파일에서 로드
    pub fn from_file(path: impl AsRef<Path>) -> RouterResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RouterError::configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// TOML 문자열로 직렬화
    pub fn to_toml_string(&self) -> RouterResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RouterError::configuration(format!("Cannot serialize router config: {}", e)))
    }

    /// 연결 획득 타임아웃
    pub fn acquisition_timeout(&self) -> Duration {
        Duration::from_millis(self.acquisition_timeout_ms)
    }

    /// 설정 검증
    ///
    /// 이름은 비어 있지 않고 고유해야 하며, 마스터는 정확히 하나,
    /// 슬레이브는 하나 이상이어야 합니다.
    pub fn validate(&self) -> RouterResult<()> {
        let mut names = HashSet::new();
        for endpoint in &self.endpoints {
            if endpoint.name.trim().is_empty() {
                return Err(RouterError::configuration("Endpoint name must not be empty"));
            }
            if !names.insert(endpoint.name.as_str()) {
                return Err(RouterError::duplicate_endpoint(&endpoint.name));
            }
        }

        let masters = self.count(EndpointRole::Master);
        if masters != 1 {
            return Err(RouterError::configuration(format!(
                "Exactly one master endpoint is required, found {}",
                masters
            )));
        }
        if self.count(EndpointRole::Slave) == 0 {
            return Err(RouterError::configuration(
                "At least one slave endpoint is required",
            ));
        }
        if self.acquisition_timeout_ms == 0 {
            return Err(RouterError::configuration(
                "acquisition_timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    fn count(&self, role: EndpointRole) -> usize {
        self.endpoints.iter().filter(|e| e.role == role).count()
    }

    /// 라우터 생성
    pub fn router(&self) -> Router {
        Router::new().with_native_read_policy(self.native_reads)
    }

    /// 검증 후 레지스트리 구성
    pub fn build_registry(&self, connector: &dyn Connector) -> RouterResult<EndpointRegistry> {
        self.validate()?;

        let registry = EndpointRegistry::with_policy(self.selection_policy);
        for endpoint in &self.endpoints {
            let source = connector.connect(endpoint)?;
            registry.register(Endpoint::new(endpoint.name.clone(), endpoint.role, source))?;
        }
        Ok(registry)
    }
}

// ============================================================================
// RouterConfigBuilder - 라우터 설정 빌더
// ============================================================================

/// 라우터 설정 빌더
#[derive(Debug, Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    /// 마스터 추가
    pub fn with_master(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.config
            .endpoints
            .push(EndpointConfig::new(name, EndpointRole::Master, url));
        self
    }

    /// 슬레이브 추가
    pub fn with_slave(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.config
            .endpoints
            .push(EndpointConfig::new(name, EndpointRole::Slave, url));
        self
    }

    /// 선택 정책 설정
    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.config.selection_policy = policy;
        self
    }

    /// 네이티브 읽기 정책 설정
    pub fn with_native_read_policy(mut self, policy: NativeReadPolicy) -> Self {
        self.config.native_reads = policy;
        self
    }

    /// 연결 획득 타임아웃 설정
    pub fn with_acquisition_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquisition_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// 빌드
    pub fn build(self) -> RouterConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::{MemoryConnector, MemoryDatabase};

    const SAMPLE: &str = r#"
selection_policy = "random"
native_reads = "pin_master_in_transaction"
acquisition_timeout_ms = 500

[[endpoints]]
name = "primary"
role = "master"
url = "memory:masterDB"

[[endpoints]]
name = "replica-1"
role = "slave"
url = "memory:slaveDB"
"#;

    fn connector() -> MemoryConnector {
        MemoryConnector::new()
            .with_database(MemoryDatabase::seeded("masterDB", "master"))
            .with_database(MemoryDatabase::seeded("slaveDB", "slave"))
    }

    #[test]
    fn test_parse_toml() {
        let config = RouterConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.selection_policy, SelectionPolicy::Random);
        assert_eq!(config.native_reads, NativeReadPolicy::PinMasterInTransaction);
        assert_eq!(config.acquisition_timeout(), Duration::from_millis(500));
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].role, EndpointRole::Master);
        assert_eq!(config.endpoints[1].url, "memory:slaveDB");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_omitted() {
        let config = RouterConfig::from_toml_str(
            r#"
[[endpoints]]
name = "primary"
role = "master"
url = "memory:masterDB"
"#,
        )
        .unwrap();

        assert_eq!(config.selection_policy, SelectionPolicy::RoundRobin);
        assert_eq!(config.native_reads, NativeReadPolicy::Replica);
        assert_eq!(config.acquisition_timeout_ms, 30_000);
    }

    #[test]
    fn test_role_aliases() {
        let config = RouterConfig::from_toml_str(
            r#"
[[endpoints]]
name = "primary"
role = "Primary"
url = "memory:masterDB"

[[endpoints]]
name = "replica-1"
role = "replica"
url = "memory:slaveDB"
"#,
        )
        .unwrap();

        assert_eq!(config.endpoints[0].role, EndpointRole::Master);
        assert_eq!(config.endpoints[1].role, EndpointRole::Slave);
        assert!(config.validate().is_ok());

        // 직렬화는 기본 이름으로
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("role = \"master\""));
        assert!(text.contains("role = \"slave\""));
    }

    #[test]
    fn test_acquisition_timeout_saturates() {
        let config = RouterConfig::builder()
            .with_acquisition_timeout(Duration::MAX)
            .build();
        assert_eq!(config.acquisition_timeout_ms, u64::MAX);

        let config = RouterConfig::builder()
            .with_acquisition_timeout(Duration::from_millis(1500))
            .build();
        assert_eq!(config.acquisition_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_toml() {
        let err = RouterConfig::from_toml_str("[[endpoints]]\nname = \"x\"\nrole = \"witness\"\nurl = \"\"")
            .unwrap_err();
        assert!(matches!(err, RouterError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_bad_topologies() {
        let no_master = RouterConfig::builder().with_slave("replica-1", "memory:slaveDB").build();
        assert!(matches!(no_master.validate(), Err(RouterError::Configuration(_))));

        let two_masters = RouterConfig::builder()
            .with_master("a", "memory:masterDB")
            .with_master("b", "memory:masterDB")
            .with_slave("replica-1", "memory:slaveDB")
            .build();
        assert!(matches!(two_masters.validate(), Err(RouterError::Configuration(_))));

        let no_slave = RouterConfig::builder().with_master("primary", "memory:masterDB").build();
        assert!(matches!(no_slave.validate(), Err(RouterError::Configuration(_))));

        let duplicate = RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .with_slave("primary", "memory:slaveDB")
            .build();
        assert!(matches!(duplicate.validate(), Err(RouterError::DuplicateEndpoint(_))));

        let unnamed = RouterConfig::builder()
            .with_master(" ", "memory:masterDB")
            .with_slave("replica-1", "memory:slaveDB")
            .build();
        assert!(unnamed.validate().is_err());

        let zero_timeout = RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .with_slave("replica-1", "memory:slaveDB")
            .with_acquisition_timeout(Duration::ZERO)
            .build();
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_build_registry() {
        let config = RouterConfig::from_toml_str(SAMPLE).unwrap();
        let registry = config.build_registry(&connector()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.policy(), SelectionPolicy::Random);
        assert_eq!(registry.connection_for(EndpointRole::Master).unwrap().name(), "primary");
        assert_eq!(registry.connection_for(EndpointRole::Slave).unwrap().name(), "replica-1");
        assert_eq!(
            config.router().native_read_policy(),
            NativeReadPolicy::PinMasterInTransaction
        );
    }

    #[test]
    fn test_build_registry_unknown_database() {
        let config = RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .with_slave("replica-1", "memory:elsewhere")
            .build();

        assert!(matches!(
            config.build_registry(&connector()),
            Err(RouterError::Configuration(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let config = RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .with_slave("replica-1", "memory:slaveDB")
            .with_selection_policy(SelectionPolicy::Random)
            .build();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(RouterConfig::from_file(&path).unwrap(), config);
        assert!(RouterConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
