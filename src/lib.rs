//! # rwsplit-driver
//!
//! A read/write splitting client layer for a master/replica database
//! deployment with sticky-master transaction routing.
//!
//! ## Features
//!
//! - **Read/Write Splitting** - Writes and locking reads go to the master, plain reads to a replica
//! - **Read-Your-Writes** - Once a transaction writes or locks, its later reads stay on the master
//! - **Pure Routing** - The [`Router`] is a side-effect-free function of query and context
//! - **Async/Await** - Execution runs on Tokio behind a small backend trait seam
//! - **TOML Configuration** - Endpoints and policies load from a config file
//!
//! ## Basic Usage
//!
//! ```rust
//! use rwsplit_driver::driver::memory::{MemoryConnector, MemoryDatabase};
//! use rwsplit_driver::{EndpointRole, QueryDescriptor, RouterConfig, RoutingClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connector = MemoryConnector::new()
//!         .with_database(MemoryDatabase::seeded("masterDB", "master"))
//!         .with_database(MemoryDatabase::seeded("slaveDB", "slave"));
//!
//!     let config = RouterConfig::from_toml_str(r#"
//!         [[endpoints]]
//!         name = "primary"
//!         role = "master"
//!         url = "memory:masterDB"
//!
//!         [[endpoints]]
//!         name = "replica-1"
//!         role = "slave"
//!         url = "memory:slaveDB"
//!     "#)?;
//!     let client = RoutingClient::from_config(config, &connector)?;
//!     let mut session = client.session()?;
//!
//!     // Outside a transaction a plain read goes to the replica
//!     let result = session.execute("select m from MyTable m").await?;
//!     assert_eq!(result.role(), EndpointRole::Slave);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Transactions
//!
//! ```rust
//! # use rwsplit_driver::driver::memory::{MemoryConnector, MemoryDatabase};
//! # use rwsplit_driver::{EndpointRole, LockMode, QueryDescriptor, RouterConfig, RoutingClient};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let connector = MemoryConnector::new()
//! #     .with_database(MemoryDatabase::seeded("masterDB", "master"))
//! #     .with_database(MemoryDatabase::seeded("slaveDB", "slave"));
//! # let config = RouterConfig::builder()
//! #     .with_master("primary", "memory:masterDB")
//! #     .with_slave("replica-1", "memory:slaveDB")
//! #     .build();
//! # let client = RoutingClient::from_config(config, &connector)?;
//! let mut session = client.session()?;
//! session.begin_transaction().await?;
//!
//! // A clean transaction still reads from the replica
//! let read = session.execute(QueryDescriptor::read("select m from MyTable m")).await?;
//! assert_eq!(read.role(), EndpointRole::Slave);
//!
//! // A locking read is pinned to the master until commit
//! let locked = QueryDescriptor::read("select m from MyTable m")
//!     .with_lock_mode(LockMode::PessimisticWrite);
//! session.execute(locked).await?;
//! let read = session.execute(QueryDescriptor::read("select m from MyTable m")).await?;
//! assert_eq!(read.role(), EndpointRole::Master);
//!
//! session.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Routing Without Execution
//!
//! ```rust
//! use rwsplit_driver::{EndpointRole, QueryDescriptor, Router, TransactionContext};
//!
//! let router = Router::new();
//! let decision = router.route(
//!     &QueryDescriptor::write("delete from mytable"),
//!     &TransactionContext::new(),
//! );
//! assert_eq!(decision.target, EndpointRole::Master);
//! ```
//!
//! ## Modules
//!
//! - [`driver`] - Registry, classifier, router, session, and configuration types
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod driver;

// Re-exports for convenience
pub use driver::{
    RoutingClient, RouterConfig, RouterConfigBuilder, EndpointConfig, Connector,
    Session, SessionConfig, QueryResult, ResultSummary,
    Router, RoutingDecision, NativeReadPolicy, SelectionPolicy, EndpointRegistry,
    QueryDescriptor, Classification, LockMode, TransactionContext, TransactionPhase,
    Endpoint, EndpointRole, Connection, ConnectionSource, StatementOutcome,
    Record, Value,
    RouterError, RouterResult, ConnectionError,
};

/// Config alias for convenience
pub type Config = RouterConfig;
