//! 라우팅 모듈
//!
//! 읽기/쓰기 분리를 위한 엔드포인트 관리와 라우팅 결정을 담당합니다.
//!
//! # 개요
//!
//! 쓰기와 잠금 읽기는 항상 마스터로, 일반 읽기는 슬레이브로 보냅니다.
//! 트랜잭션 안에서 쓰기나 잠금이 발생하면 해당 트랜잭션이 끝날 때까지
//! 모든 읽기를 마스터에 고정합니다 (read-your-writes).
//!
//! # 예시
//!
//! ```
//! use rwsplit_driver::driver::routing::Router;
//! use rwsplit_driver::driver::{EndpointRole, QueryDescriptor, TransactionContext};
//!
//! let router = Router::new();
//! let mut ctx = TransactionContext::new();
//! ctx.begin().unwrap();
//!
//! let read = QueryDescriptor::read("select mycol from mytable");
//! assert_eq!(router.route(&read, &ctx).target, EndpointRole::Slave);
//!
//! let write = QueryDescriptor::write("update mytable set mycol = ?");
//! let ctx = router.route(&write, &ctx).context;
//! assert_eq!(router.route(&read, &ctx).target, EndpointRole::Master);
//! ```

mod policy;
mod router;
mod table;

pub use policy::{EndpointSelector, SelectionPolicy};
pub use router::{NativeReadPolicy, Router, RoutingDecision};
pub use table::EndpointRegistry;
