//! # FleetDB Repository
//!
//! PostgreSQL data access for the inventory entities.
//!
//! ```text
//! caller
//!   ↓  Arc<dyn SshKeyDao>             (DAO interface)
//! PgSshKeyDaoImpl                     (DAO impl, sqlx + sea-query)
//!   ↓  SshKeyFilter: QueryFilter      (filtered, unordered query)
//! paginate()                          (validate → count → ordered page)
//!   ↓
//! PostgreSQL
//! ```
//!
//! ## Structure
//!
//! ```text
//! src/
//!   pool.rs          ← DatabasePool, DbConn
//!   filter.rs        ← EntityTable, QueryFilter
//!   search.rs        ← SearchNormalizer
//!   paginator.rs     ← Paginator, paginate
//!   di.rs            ← RepositoryModule
//!   dao/
//!     tenant_dao.rs, ssh_key_dao.rs, subnet_dao.rs
//!     impl/postgres/ ← Pg*DaoImpl
//! ```

pub mod dao;
pub mod di;
pub mod filter;
pub mod paginator;
pub mod pool;
pub mod search;

pub use dao::*;
pub use di::*;
pub use filter::{EntityTable, QueryFilter};
pub use paginator::*;
pub use pool::*;
pub use search::*;
