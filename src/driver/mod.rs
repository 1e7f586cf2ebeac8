//! Driver Module
//!
//! 읽기/쓰기 분리 클라이언트 계층
//!
//! # 구성
//!
//! - 엔드포인트 레지스트리 (EndpointRegistry, SelectionPolicy)
//! - 트랜잭션 컨텍스트 (TransactionContext, TransactionPhase)
//! - 쿼리 분류 (QueryDescriptor, QueryClassifier, Classification)
//! - 라우터 (Router, RoutingDecision, NativeReadPolicy)
//! - 실행 세션 (Session, QueryResult)
//! - 설정 (RouterConfig, Connector)
//! - In-memory 백엔드 (MemoryDatabase, MemoryConnector)
//!
//! # Example
//!
//! ```
//! use rwsplit_driver::driver::memory::{MemoryConnector, MemoryDatabase};
//! use rwsplit_driver::driver::{EndpointRole, QueryDescriptor, RouterConfig, RoutingClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = MemoryConnector::new()
//!     .with_database(MemoryDatabase::seeded("masterDB", "master"))
//!     .with_database(MemoryDatabase::seeded("slaveDB", "slave"));
//!
//! let config = RouterConfig::builder()
//!     .with_master("primary", "memory:masterDB")
//!     .with_slave("replica-1", "memory:slaveDB")
//!     .build();
//! let client = RoutingClient::from_config(config, &connector)?;
//!
//! let mut session = client.session()?;
//! session.begin_transaction().await?;
//!
//! session
//!     .execute(
//!         QueryDescriptor::write("update mytable set mycol = ? where id = ?")
//!             .with_param("id", 1i64)
//!             .with_param("value", "written"),
//!     )
//!     .await?;
//!
//! // 쓰기 이후의 읽기는 커밋 전까지 마스터
//! let result = session.execute("select m from MyTable m").await?;
//! assert_eq!(result.role(), EndpointRole::Master);
//!
//! session.commit().await?;
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod routing;
mod classifier;
mod config;
mod driver;
mod endpoint;
mod error;
mod record;
mod session;
mod transaction;
mod types;

// Re-exports
pub use classifier::{
    Classification, LockMode, QueryClassifier, QueryDescriptor, QueryKind, StatementCategory,
    StatementKind,
};
pub use config::{Connector, EndpointConfig, RouterConfig, RouterConfigBuilder};
pub use driver::{EndpointStatus, RoutingClient};
pub use endpoint::{Connection, ConnectionSource, Endpoint, EndpointRole, StatementOutcome};
pub use error::{ConnectionError, RouterError, RouterResult};
pub use record::{Record, RecordStream};
pub use routing::{
    EndpointRegistry, EndpointSelector, NativeReadPolicy, Router, RoutingDecision, SelectionPolicy,
};
pub use session::{QueryResult, ResultSummary, Session, SessionConfig};
pub use transaction::{TransactionContext, TransactionPhase};
pub use types::Value;

/// 파라미터 맵 생성 매크로
#[macro_export]
macro_rules! params {
    () => {
        std::collections::HashMap::<String, $crate::driver::Value>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::<String, $crate::driver::Value>::new();
        $(
            map.insert($key.into(), $crate::driver::Value::from($value));
        )+
        map
    }};
}
