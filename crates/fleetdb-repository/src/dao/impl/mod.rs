//! DAO implementations.
//!
//! Trait definitions live in the parent `dao/` module (e.g. `ssh_key_dao.rs`).
//! Implementations are grouped by backend.

pub mod postgres;

pub use postgres::{PgSshKeyDaoImpl, PgSubnetDaoImpl, PgTenantDaoImpl};
