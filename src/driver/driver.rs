//! Routing Client
//!
//! 프로세스 전역 레지스트리를 소유하고 세션을 만들어 주는 진입점

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::config::{Connector, RouterConfig};
use super::endpoint::EndpointRole;
use super::error::{RouterError, RouterResult};
use super::routing::{EndpointRegistry, Router};
use super::session::{Session, SessionConfig};

// ============================================================================
// RoutingClient - 라우팅 클라이언트
// ============================================================================

/// 읽기/쓰기 분리 클라이언트
///
/// 레지스트리는 [`Arc`]로 공유되므로 여러 세션이 동시에 조회할 수 있습니다.
pub struct RoutingClient {
    /// 설정
    config: RouterConfig,
    /// 엔드포인트 레지스트리
    registry: Arc<EndpointRegistry>,
    /// 라우터
    router: Router,
    /// 열린 상태
    open: Arc<RwLock<bool>>,
}

impl RoutingClient {
    /// 이미 구성된 레지스트리로 클라이언트 생성
    pub fn new(registry: Arc<EndpointRegistry>, config: RouterConfig) -> Self {
        let router = config.router();
        Self {
            config,
            registry,
            router,
            open: Arc::new(RwLock::new(true)),
        }
    }

    /// 설정을 검증하고 커넥터로 엔드포인트를 연결해 클라이언트 생성
    pub fn from_config(config: RouterConfig, connector: &dyn Connector) -> RouterResult<Self> {
        let registry = config.build_registry(connector)?;
        tracing::info!(
            endpoints = registry.len(),
            policy = ?config.selection_policy,
            native_reads = ?config.native_reads,
            "Routing client ready"
        );
        Ok(Self::new(Arc::new(registry), config))
    }

    /// 기본 설정으로 세션 생성
    pub fn session(&self) -> RouterResult<Session> {
        let config = SessionConfig::new().with_acquisition_timeout(self.config.acquisition_timeout());
        self.session_with(config)
    }

    /// 세션 설정을 지정해 세션 생성
    pub fn session_with(&self, config: SessionConfig) -> RouterResult<Session> {
        self.ensure_open()?;
        Ok(Session::new(Arc::clone(&self.registry), self.router, config))
    }

    /// 엔드포인트 레지스트리
    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// 라우터
    pub fn router(&self) -> Router {
        self.router
    }

    /// 클라이언트 설정
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// 엔드포인트 현황
    pub fn endpoint_status(&self) -> Vec<EndpointStatus> {
        [EndpointRole::Master, EndpointRole::Slave]
            .into_iter()
            .flat_map(|role| self.registry.endpoints(role))
            .map(|endpoint| EndpointStatus {
                available: self.registry.is_available(endpoint.name()),
                name: endpoint.name().to_string(),
                role: endpoint.role(),
            })
            .collect()
    }

    /// 클라이언트 종료 (이미 만들어진 세션은 계속 동작)
    pub fn close(&self) {
        let mut open = self.open.write();
        if *open {
            *open = false;
            tracing::info!("Routing client closed");
        }
    }

    /// 열린 상태 여부
    pub fn is_open(&self) -> bool {
        *self.open.read()
    }

    fn ensure_open(&self) -> RouterResult<()> {
        if *self.open.read() {
            Ok(())
        } else {
            Err(RouterError::session("Routing client is closed"))
        }
    }
}

impl fmt::Debug for RoutingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingClient")
            .field("endpoints", &self.registry.len())
            .field("router", &self.router)
            .field("open", &*self.open.read())
            .finish()
    }
}

// ============================================================================
// EndpointStatus - 엔드포인트 현황
// ============================================================================

/// 엔드포인트 현황
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStatus {
    /// 이름
    pub name: String,
    /// 역할
    pub role: EndpointRole,
    /// 도달 가능 여부
    pub available: bool,
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.available { "up" } else { "down" };
        write!(f, "{} ({}, {})", self.name, self.role, state)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::classifier::QueryDescriptor;
    use crate::driver::memory::{MemoryConnector, MemoryDatabase};
    use crate::driver::routing::NativeReadPolicy;
    use std::time::Duration;

    fn connector() -> MemoryConnector {
        MemoryConnector::new()
            .with_database(MemoryDatabase::seeded("masterDB", "master"))
            .with_database(MemoryDatabase::seeded("slaveDB", "slave"))
    }

    fn config() -> RouterConfig {
        RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .with_slave("replica-1", "memory:slaveDB")
            .build()
    }

    #[test]
    fn test_from_config() {
        let client = RoutingClient::from_config(config(), &connector()).unwrap();

        assert!(client.is_open());
        assert_eq!(client.registry().len(), 2);
        assert_eq!(client.router().native_read_policy(), NativeReadPolicy::Replica);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let missing_slave = RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .build();
        let err = RoutingClient::from_config(missing_slave, &connector()).unwrap_err();
        assert!(err.is_configuration_error());

        let unknown_db = RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .with_slave("replica-1", "memory:nowhere")
            .build();
        assert!(RoutingClient::from_config(unknown_db, &connector()).is_err());
    }

    #[test]
    fn test_endpoint_status() {
        let client = RoutingClient::from_config(config(), &connector()).unwrap();
        client.registry().mark_unavailable("replica-1").unwrap();

        let status = client.endpoint_status();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].to_string(), "primary (master, up)");
        assert_eq!(status[1].to_string(), "replica-1 (slave, down)");
    }

    #[test]
    fn test_session_inherits_timeout() {
        let config = RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .with_slave("replica-1", "memory:slaveDB")
            .with_acquisition_timeout(Duration::from_millis(250))
            .build();
        let client = RoutingClient::from_config(config, &connector()).unwrap();

        let session = client.session().unwrap();
        assert_eq!(session.config().acquisition_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_closed_client_rejects_sessions() {
        let client = RoutingClient::from_config(config(), &connector()).unwrap();
        client.close();
        client.close();

        assert!(!client.is_open());
        assert!(matches!(client.session(), Err(RouterError::Session(_))));
    }

    #[tokio::test]
    async fn test_sessions_share_registry() {
        let connector = connector();
        let client = RoutingClient::from_config(config(), &connector).unwrap();

        let mut writer = client.session().unwrap();
        let mut reader = client.session().unwrap();

        writer.begin_transaction().await.unwrap();
        writer
            .execute(
                QueryDescriptor::write("update mytable set mycol = ? where id = ?")
                    .with_param("id", 1i64)
                    .with_param("value", "fresh"),
            )
            .await
            .unwrap();

        // 다른 세션의 컨텍스트는 영향을 받지 않음
        let read = reader
            .execute(QueryDescriptor::read("select m from MyTable m"))
            .await
            .unwrap();
        assert_eq!(read.role(), EndpointRole::Slave);
        assert!(!reader.in_transaction());

        writer.commit().await.unwrap();
        let master = connector.database("masterDB").unwrap();
        assert_eq!(master.value("mytable", 1), Some("fresh".into()));
    }

    #[tokio::test]
    async fn test_pin_policy_from_config() {
        let config = RouterConfig::builder()
            .with_master("primary", "memory:masterDB")
            .with_slave("replica-1", "memory:slaveDB")
            .with_native_read_policy(NativeReadPolicy::PinMasterInTransaction)
            .build();
        let client = RoutingClient::from_config(config, &connector()).unwrap();
        let mut session = client.session().unwrap();

        session.begin_transaction().await.unwrap();
        let result = session
            .execute(QueryDescriptor::native("select mycol from mytable"))
            .await
            .unwrap();
        assert_eq!(result.role(), EndpointRole::Master);
        session.rollback().await.unwrap();
    }
}
